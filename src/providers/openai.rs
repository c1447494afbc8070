//! OpenAI rewriter using the `/v1/chat/completions` API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_http_response, RewriteError, RewriteRequest, RewriteService};
use crate::config::OpenAiConfig;

/// Public chat completions endpoint.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1/chat/completions";
/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 10_000;

const SYSTEM_INSTRUCTION: &[&str] = &[
    "Jesteś asystentem do personalizacji treści bloga.",
    "Zwróć wyłącznie treść w formacie Markdown.",
    "Zachowaj: nagłówki (#), listy, cytaty, tabele, linki, obrazki.",
    "Nie zmieniaj ani nie tłumacz: bloków kodu ``` oraz inline code, URL-i, YAML frontmatter.",
    "Nie dodawaj komentarzy HTML ani metadanych. Nie dodawaj wstępów/podsumowań, jeśli nie ma ich w tekście.",
];

const CONTENT_HEADER: &str = "--- TREŚĆ MARKDOWN DO PRZETWORZENIA (NIE ZMIENIAJ KODU) ---";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Chat completions request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// System and user messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token cap.
    pub max_tokens: u32,
}

/// One message in chat format.
#[doc(hidden)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`.
    pub role: String,
    /// Message text.
    pub content: Option<String>,
}

/// Chat completions response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Response choices.
    pub choices: Vec<ChatChoice>,
    /// Token usage, logged for diagnostics.
    pub usage: Option<ChatUsage>,
}

/// A response choice.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// Assistant message for this choice.
    pub message: ChatMessage,
}

/// Token usage statistics.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ChatUsage {
    /// Prompt token count.
    pub prompt_tokens: Option<u32>,
    /// Completion token count.
    pub completion_tokens: Option<u32>,
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// User message carrying the persona instruction and the Markdown to rewrite.
#[doc(hidden)]
pub fn user_content(prompt: &str, markdown: &str) -> String {
    ["PERSONA INSTRUKCJA:", prompt, "", CONTENT_HEADER, markdown].join("\n")
}

/// Build a chat completions request for `request`.
#[doc(hidden)]
pub fn build_request(model: &str, request: &RewriteRequest) -> ChatRequest {
    ChatRequest {
        model: model.to_owned(),
        messages: vec![
            ChatMessage {
                role: "system".to_owned(),
                content: Some(SYSTEM_INSTRUCTION.join(" ")),
            },
            ChatMessage {
                role: "user".to_owned(),
                content: Some(user_content(&request.prompt, &request.content_markdown)),
            },
        ],
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    }
}

/// Extract the trimmed Markdown from a chat completions response body.
///
/// # Errors
///
/// Returns `RewriteError::Parse` if the body does not deserialize or has no
/// choices, and `RewriteError::EmptyContent` if the first choice is blank.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<String, RewriteError> {
    let resp: ChatResponse =
        serde_json::from_str(body).map_err(|e| RewriteError::Parse(e.to_string()))?;

    if let Some(usage) = &resp.usage {
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "rewrite usage"
        );
    }

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RewriteError::Parse("missing choices[0]".to_owned()))?;

    let content = choice
        .message
        .content
        .map(|text| text.trim().to_owned())
        .unwrap_or_default();
    if content.is_empty() {
        return Err(RewriteError::EmptyContent);
    }
    Ok(content)
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Rewrite service backed by OpenAI chat completions.
#[derive(Debug, Clone)]
pub struct OpenAiRewriter {
    model: String,
    api_key: Option<String>,
    api_key_env: String,
    endpoint: String,
    client: reqwest::Client,
}

impl OpenAiRewriter {
    /// Rewriter for `model` authenticated with `api_key`.
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: Some(api_key.into()),
            api_key_env: "OPENAI_API_KEY".to_owned(),
            endpoint: OPENAI_API_BASE.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    /// Rewriter configured from the `[openai]` section.
    ///
    /// A missing API key is not an error here; [`RewriteService::rewrite`]
    /// reports it when a rewrite is actually attempted.
    pub fn from_config(config: &OpenAiConfig) -> Self {
        Self {
            model: config.model.clone(),
            api_key: config.api_key(),
            api_key_env: config.api_key_env.clone(),
            endpoint: config.base_url.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Send requests to `endpoint` instead of the public API.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl RewriteService for OpenAiRewriter {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, RewriteError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            RewriteError::Unavailable(format!("missing API key: {} is not set", self.api_key_env))
        })?;
        let api_request = build_request(&self.model, request);
        debug!(
            model = %self.model,
            post_id = %request.post_id,
            persona = %request.persona,
            content_len = request.content_markdown.len(),
            "sending rewrite request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {api_key}"))
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        let markdown = parse_response(&payload)?;
        debug!(output_len = markdown.len(), "rewrite received");
        Ok(markdown)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
