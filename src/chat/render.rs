//! HTML rendering of tokenized chat responses.
//!
//! Every piece of assistant text is escaped before it reaches the output;
//! only the element wrappers chosen per [`SegmentKind`] are emitted as markup.

use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::tokenizer::{tokenize, ButtonAction, Segment, SegmentKind};

/// Site language used for button labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Polish (site default).
    #[default]
    Pl,
    /// English.
    En,
}

impl Locale {
    /// Two-letter code used in URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pl => "pl",
            Self::En => "en",
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pl" => Ok(Self::Pl),
            "en" => Ok(Self::En),
            other => Err(format!("unsupported locale: {other:?}, expected 'pl' or 'en'")),
        }
    }
}

/// Visible label for a navigation button.
pub fn button_label(action: ButtonAction, locale: Locale) -> &'static str {
    match (action, locale) {
        (ButtonAction::ContactSection, Locale::Pl) => "Kontakt",
        (ButtonAction::ContactSection, Locale::En) => "Contact",
        (ButtonAction::HeroSection, Locale::Pl) => "Strona główna",
        (ButtonAction::HeroSection, Locale::En) => "Home",
    }
}

/// Escape special HTML characters, including quotes for attribute values.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn render_segment(out: &mut String, segment: &Segment, locale: Locale) {
    let content = escape_html(&segment.content);
    let href = segment.href.as_deref().map(escape_html).unwrap_or_default();

    // Writing into a String cannot fail.
    let _ = match segment.kind {
        SegmentKind::Text => write!(out, "<span>{content}</span>"),
        SegmentKind::Link => write!(
            out,
            "<a href=\"{href}\" target=\"_blank\" rel=\"noopener noreferrer\">{content}</a>"
        ),
        SegmentKind::Email => write!(out, "<a href=\"{href}\">{content}</a>"),
        SegmentKind::Bold => write!(out, "<strong>{content}</strong>"),
        SegmentKind::Button => match segment.action {
            Some(action) => write!(
                out,
                "<button type=\"button\" data-action=\"{}\">{}</button>",
                action.target_id(),
                escape_html(button_label(action, locale))
            ),
            None => write!(out, "<span>{content}</span>"),
        },
    };
}

/// Render already-tokenized segments as an HTML fragment.
pub fn render_html(segments: &[Segment], locale: Locale) -> String {
    let mut out = String::new();
    for segment in segments {
        render_segment(&mut out, segment, locale);
    }
    out
}

/// Tokenize and render an assistant response in one step.
pub fn render_response(text: &str, locale: Locale) -> String {
    render_html(&tokenize(text), locale)
}
