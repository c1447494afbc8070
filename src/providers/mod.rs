//! Rewrite service abstraction.
//!
//! Defines the [`RewriteService`] trait used by the personalizer and the
//! shared request and error types. [`openai::OpenAiRewriter`] is the one
//! network-backed implementation.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::p13n::persona::{Persona, MAX_PROMPT_CHARS};

pub mod openai;

/// Longest accepted content identifier, in characters.
pub const MAX_POST_ID_CHARS: usize = 256;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A request to rewrite one piece of Markdown for a persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteRequest {
    /// Content identifier (blog post slug).
    pub post_id: String,
    /// Persona the rewrite targets.
    pub persona: Persona,
    /// Instruction describing the persona's tone.
    pub prompt: String,
    /// Original Markdown.
    pub content_markdown: String,
}

impl RewriteRequest {
    /// Check field bounds before anything is sent upstream.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), RewriteError> {
        let post_id_len = self.post_id.chars().count();
        if post_id_len == 0 || post_id_len > MAX_POST_ID_CHARS {
            return Err(RewriteError::Invalid(format!(
                "postId must be 1..={MAX_POST_ID_CHARS} characters, got {post_id_len}"
            )));
        }
        let prompt_len = self.prompt.chars().count();
        if prompt_len == 0 || prompt_len > MAX_PROMPT_CHARS {
            return Err(RewriteError::Invalid(format!(
                "prompt must be 1..={MAX_PROMPT_CHARS} characters, got {prompt_len}"
            )));
        }
        if self.content_markdown.is_empty() {
            return Err(RewriteError::Invalid(
                "contentMarkdown must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by rewrite services.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// Request failed validation and was not sent.
    #[error("invalid rewrite request: {0}")]
    Invalid(String),
    /// Personalization is switched off in configuration.
    #[error("personalization is disabled")]
    Disabled,
    /// Service cannot be used with the current configuration.
    #[error("rewrite service unavailable: {0}")]
    Unavailable(String),
    /// HTTP transport failure.
    #[error("rewrite request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Upstream responded with an error status.
    #[error("rewrite service returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        body: String,
    },
    /// Response did not match the expected schema.
    #[error("rewrite response parse error: {0}")]
    Parse(String),
    /// The model returned no content.
    #[error("rewrite service returned empty content")]
    EmptyContent,
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `RewriteError::Request` on transport failure, `RewriteError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, RewriteError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(RewriteError::HttpStatus {
            status: status.as_u16(),
            body: sanitize_http_error_body(&body),
        });
    }
    Ok(body)
}

/// Collapse whitespace, mask API-key-like tokens and cap error body length.
pub fn sanitize_http_error_body(raw: &str) -> String {
    const MAX_ERROR_BODY_CHARS: usize = 256;

    let mut sanitized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    for pattern in [r"sk-proj-[A-Za-z0-9_\-]{10,}", r"sk-[A-Za-z0-9]{32,}"] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened: String = sanitized.chars().take(MAX_ERROR_BODY_CHARS).collect();
        return format!("{shortened}...[truncated]");
    }
    sanitized
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Something that can rewrite Markdown for a persona.
///
/// Implementations must be `Send + Sync` so one service can back many
/// concurrent personalization requests.
#[async_trait]
pub trait RewriteService: Send + Sync {
    /// Rewrite `request.content_markdown` following `request.prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError`] on transport, upstream or parse failure.
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, RewriteError>;

    /// Identifier of the model serving rewrites.
    fn model_id(&self) -> &str;
}
