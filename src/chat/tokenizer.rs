//! Flat tokenizer for assistant chat responses.
//!
//! Splits a response into typed [`Segment`]s so the widget can render links,
//! mail addresses, emphasis and navigation buttons without ever feeding the
//! raw text back in as markup.
//!
//! Matching is driven by an ordered table of matchers. At every position the
//! first matcher (in priority order) that matches *at* that position wins.
//! Otherwise the nearest later position where any matcher can start ends a
//! plain text run. Nothing is scanned recursively: the inside of a bold span
//! is never searched for links, mail addresses or buttons.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder the assistant emits for the "go to contact" button.
pub const CONTACT_PLACEHOLDER: &str = "{contactSection}";

/// Placeholder the assistant emits for the "back to top" button.
pub const HERO_PLACEHOLDER: &str = "{heroSection}";

const BOLD_DELIMITER: &str = "**";

/// Classification of a [`Segment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Plain text.
    Text,
    /// `http://` or `https://` URL.
    Link,
    /// Email address.
    Email,
    /// `**bold**` span.
    Bold,
    /// In-app navigation button placeholder.
    Button,
}

/// Navigation behaviour attached to a button segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ButtonAction {
    /// Scroll to (or navigate to) the contact section.
    ContactSection,
    /// Scroll to (or navigate to) the hero section.
    HeroSection,
}

impl ButtonAction {
    /// Resolve a literal placeholder such as `{contactSection}`.
    pub fn from_placeholder(placeholder: &str) -> Option<Self> {
        match placeholder {
            CONTACT_PLACEHOLDER => Some(Self::ContactSection),
            HERO_PLACEHOLDER => Some(Self::HeroSection),
            _ => None,
        }
    }

    /// The literal placeholder text, braces included.
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::ContactSection => CONTACT_PLACEHOLDER,
            Self::HeroSection => HERO_PLACEHOLDER,
        }
    }

    /// Element id of the page section this action targets.
    pub fn target_id(self) -> &'static str {
        match self {
            Self::ContactSection => "contact",
            Self::HeroSection => "hero",
        }
    }
}

/// One classified chunk of a tokenized response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// What kind of chunk this is.
    pub kind: SegmentKind,
    /// Matched text. Bold segments hold the inner text only; button segments
    /// hold the placeholder including braces.
    pub content: String,
    /// Link target, present for links (the URL) and emails (`mailto:` URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Navigation action, present for buttons only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ButtonAction>,
}

impl Segment {
    /// Plain text segment.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Text,
            content: content.into(),
            href: None,
            action: None,
        }
    }

    /// Hyperlink segment; `href` is the URL itself.
    pub fn link(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            kind: SegmentKind::Link,
            href: Some(url.clone()),
            content: url,
            action: None,
        }
    }

    /// Email segment; `href` is the `mailto:` URL.
    pub fn email(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            kind: SegmentKind::Email,
            href: Some(format!("mailto:{address}")),
            content: address,
            action: None,
        }
    }

    /// Bold segment holding the text between the delimiters.
    pub fn bold(inner: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Bold,
            content: inner.into(),
            href: None,
            action: None,
        }
    }

    /// Button segment for the given action.
    pub fn button(action: ButtonAction) -> Self {
        Self {
            kind: SegmentKind::Button,
            content: action.placeholder().to_owned(),
            href: None,
            action: Some(action),
        }
    }

    /// The exact input span this segment was produced from.
    pub fn source_span(&self) -> String {
        match self.kind {
            SegmentKind::Bold => format!("{BOLD_DELIMITER}{}{BOLD_DELIMITER}", self.content),
            _ => self.content.clone(),
        }
    }
}

/// Concatenate the source spans of `segments`, rebuilding the tokenized input.
pub fn reconstruct(segments: &[Segment]) -> String {
    segments.iter().map(Segment::source_span).collect()
}

// ---------------------------------------------------------------------------
// Matcher table
// ---------------------------------------------------------------------------

struct Matcher {
    kind: SegmentKind,
    pattern: Regex,
    build: fn(&str) -> Segment,
}

fn build_link(span: &str) -> Segment {
    Segment::link(span)
}

fn build_email(span: &str) -> Segment {
    Segment::email(span)
}

fn build_button(span: &str) -> Segment {
    match ButtonAction::from_placeholder(span) {
        Some(action) => Segment::button(action),
        None => Segment::text(span),
    }
}

fn build_bold(span: &str) -> Segment {
    let inner = span
        .strip_prefix(BOLD_DELIMITER)
        .and_then(|rest| rest.strip_suffix(BOLD_DELIMITER))
        .unwrap_or(span);
    Segment::bold(inner)
}

/// Matchers in priority order: link, email, button, bold.
fn matchers() -> &'static [Matcher] {
    static MATCHERS: OnceLock<Vec<Matcher>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        let table: [(SegmentKind, &str, fn(&str) -> Segment); 4] = [
            (SegmentKind::Link, r"https?://[^\s]+", build_link),
            (
                SegmentKind::Email,
                r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}",
                build_email,
            ),
            (
                SegmentKind::Button,
                r"\{contactSection\}|\{heroSection\}",
                build_button,
            ),
            (SegmentKind::Bold, r"\*\*[^*]+\*\*", build_bold),
        ];

        table
            .into_iter()
            .filter_map(|(kind, pattern, build)| {
                Regex::new(pattern).ok().map(|pattern| Matcher {
                    kind,
                    pattern,
                    build,
                })
            })
            .collect()
    })
}

/// What the scanner found at the head of the remaining input.
enum Step {
    /// A matcher matched at offset 0 and consumed `len` bytes.
    Token { segment: Segment, len: usize },
    /// Plain text runs for `len` bytes before the next candidate.
    Text { len: usize },
}

fn next_step(rest: &str) -> Step {
    let mut nearest = rest.len();

    for matcher in matchers() {
        let Some(found) = matcher.pattern.find(rest) else {
            continue;
        };
        // Leftmost-first search: a hit at offset 0 is exactly the anchored match.
        if found.start() == 0 {
            return Step::Token {
                segment: (matcher.build)(found.as_str()),
                len: found.end(),
            };
        }
        nearest = nearest.min(found.start());
    }

    Step::Text { len: nearest }
}

/// Tokenize an assistant response into an ordered list of segments.
///
/// Never fails. Unterminated or malformed markers are kept as plain text, and
/// an empty input yields an empty list.
pub fn tokenize(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        match next_step(rest) {
            Step::Token { segment, len } => {
                segments.push(segment);
                rest = rest.get(len..).unwrap_or_default();
            }
            Step::Text { len } => {
                let (text, tail) = rest.split_at(len);
                segments.push(Segment::text(text));
                rest = tail;
            }
        }
    }

    segments
}

/// Kinds of matcher in the order they are tried. Exposed for diagnostics.
pub fn matcher_priority() -> Vec<SegmentKind> {
    matchers().iter().map(|m| m.kind).collect()
}
