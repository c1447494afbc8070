//! Persona catalog and cache keys for blog post rewrites.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Longest custom instruction a reader may supply, in characters.
pub const MAX_PROMPT_CHARS: usize = 800;

/// Rewriting style applied to a blog post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Persona {
    /// HR specialist: little technical jargon.
    #[serde(rename = "HR")]
    Hr,
    /// Reader from outside IT.
    #[serde(rename = "NonIT")]
    NonIt,
    /// Ten-year-old reader.
    Child10,
    /// Metaphorical tone with a short poem.
    Poet,
    /// Developer: architecture decisions and trade-offs.
    Developer,
    /// Reader-supplied instruction.
    Custom,
}

impl Persona {
    /// Every persona, in menu order.
    pub const ALL: [Persona; 6] = [
        Self::Hr,
        Self::NonIt,
        Self::Child10,
        Self::Poet,
        Self::Developer,
        Self::Custom,
    ];

    /// Identifier used in cache keys and requests.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hr => "HR",
            Self::NonIt => "NonIT",
            Self::Child10 => "Child10",
            Self::Poet => "Poet",
            Self::Developer => "Developer",
            Self::Custom => "Custom",
        }
    }

    /// Default rewrite instruction sent to the model.
    pub fn default_prompt(self) -> &'static str {
        match self {
            Self::Hr => "Przetłumacz wpis dla specjalisty HR, ogranicz żargon techniczny, zachowaj strukturę sekcji i elementy Markdown.",
            Self::NonIt => "Uprość język i wyjaśnij pojęcia w nawiasach jak dla osoby nietechnicznej z IT, nie zmieniaj struktury i formatowania Markdown.",
            Self::Child10 => "Wyjaśnij prostymi słowami i krótkimi zdaniami jakbym miał 10 lat, zachowując nagłówki i listy Markdown.",
            Self::Poet => "Nadaj metaforyczny ton bez dodawania faktów, w jednym miejscu treść zamień w krótki wiersz jeśli jest to możliwe, zachowaj strukturę akapitów i Markdown.",
            Self::Developer => "Przetłumacz dla developera, skup się na technicznych aspektach, decyzjach architektonicznych, konsekwencjach i trade-offach, zachowaj precyzyjne terminy, przykłady i strukturę Markdown.",
            Self::Custom => "Użyj treści z pola jako persony i tonu dla której przygotujesz treść, tłumacz w Markdown, zachowując fakty i układ.",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|persona| persona.as_str() == s)
            .ok_or_else(|| format!("unknown persona: {s:?}"))
    }
}

/// A persona choice together with the reader's own instruction, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaRequest {
    /// Selected persona.
    pub persona: Persona,
    /// Reader-supplied instruction; only consulted for [`Persona::Custom`].
    pub custom_prompt: Option<String>,
}

impl PersonaRequest {
    /// Request a built-in persona.
    pub fn new(persona: Persona) -> Self {
        Self {
            persona,
            custom_prompt: None,
        }
    }

    /// Request the custom persona with the reader's instruction.
    pub fn custom(prompt: impl Into<String>) -> Self {
        Self {
            persona: Persona::Custom,
            custom_prompt: Some(prompt.into()),
        }
    }

    /// Instruction to send to the model.
    ///
    /// A blank custom instruction falls back to the persona default.
    pub fn effective_prompt(&self) -> &str {
        match (self.persona, self.custom_prompt.as_deref()) {
            (Persona::Custom, Some(prompt)) if !prompt.trim().is_empty() => prompt,
            (persona, _) => persona.default_prompt(),
        }
    }
}

/// Composite cache key: one entry per (content, persona) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Blog post (or other content) identifier.
    pub content_id: String,
    /// Persona the content was rewritten for.
    pub persona: Persona,
}

impl CacheKey {
    /// Key for `content_id` rewritten as `persona`.
    pub fn new(content_id: impl Into<String>, persona: Persona) -> Self {
        Self {
            content_id: content_id.into(),
            persona,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.content_id, self.persona)
    }
}
