//! Input screening for messages sent to the chat assistant.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Longest message accepted by the assistant, in characters.
pub const MAX_INPUT_CHARS: usize = 1000;

/// Messages longer than this are checked for mixed Polish/English text.
const MIXED_LANGUAGE_MIN_CHARS: usize = 50;

const SUSPICIOUS_CHARS: &[char] = &['<', '>', '{', '}', '[', ']', '\\', '|', '`', '~'];

const INJECTION_PHRASES: &[&str] = &[
    r"ignore\s+previous\s+instructions",
    r"forget\s+everything",
    r"you\s+are\s+now",
    r"pretend\s+to\s+be",
    r"act\s+as\s+if",
    r"system\s+prompt",
    r"jailbreak",
    r"roleplay",
    r"new\s+instructions",
    r"override",
    r"bypass",
];

/// Reason a message was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Threat {
    /// Phrase commonly used to hijack the system prompt.
    PromptInjection,
    /// Message exceeds [`MAX_INPUT_CHARS`].
    ExcessiveLength,
    /// Markup or escape characters.
    SuspiciousCharacters,
    /// Long message mixing Polish diacritics with Latin text.
    MixedLanguages,
}

/// Result of [`validate_input`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityCheck {
    /// `true` when no threat was found.
    pub is_valid: bool,
    /// One entry per finding; prompt injection repeats once per matched phrase.
    pub threats: Vec<Threat>,
}

fn injection_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        INJECTION_PHRASES
            .iter()
            .filter_map(|phrase| Regex::new(&format!("(?i){phrase}")).ok())
            .collect()
    })
}

fn has_polish_letters(input: &str) -> bool {
    input
        .chars()
        .flat_map(char::to_lowercase)
        .any(|c| matches!(c, 'ą' | 'ć' | 'ę' | 'ł' | 'ń' | 'ó' | 'ś' | 'ź' | 'ż'))
}

/// Screen a chat message for known abuse patterns.
pub fn validate_input(input: &str) -> SecurityCheck {
    let mut threats = Vec::new();

    for pattern in injection_patterns() {
        if pattern.is_match(input) {
            threats.push(Threat::PromptInjection);
        }
    }

    let char_count = input.chars().count();
    if char_count > MAX_INPUT_CHARS {
        threats.push(Threat::ExcessiveLength);
    }

    if input.contains(SUSPICIOUS_CHARS) {
        threats.push(Threat::SuspiciousCharacters);
    }

    let has_latin = input.chars().any(|c| c.is_ascii_alphabetic());
    if has_polish_letters(input) && has_latin && char_count > MIXED_LANGUAGE_MIN_CHARS {
        threats.push(Threat::MixedLanguages);
    }

    SecurityCheck {
        is_valid: threats.is_empty(),
        threats,
    }
}

/// Trim, strip suspicious characters and cap the message length.
pub fn sanitize_input(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !SUSPICIOUS_CHARS.contains(c))
        .take(MAX_INPUT_CHARS)
        .collect()
}
