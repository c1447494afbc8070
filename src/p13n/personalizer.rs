//! Cache-first persona rewriting of blog posts.

use std::sync::Arc;

use tracing::{debug, info};

use super::cache::PersonalizationCache;
use super::persona::{CacheKey, Persona, PersonaRequest};
use crate::providers::{RewriteError, RewriteRequest, RewriteService};

/// Where a personalized result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Served from the cache without calling the service.
    Cache,
    /// Produced by a fresh rewrite and then cached.
    Rewrite,
}

/// Outcome of [`Personalizer::personalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Personalized {
    /// Rewritten Markdown.
    pub markdown: String,
    /// Where the Markdown came from.
    pub source: Source,
}

/// Combines the cache with a rewrite service.
pub struct Personalizer {
    cache: PersonalizationCache,
    service: Arc<dyn RewriteService>,
    enabled: bool,
}

impl Personalizer {
    /// Personalizer using `cache` in front of `service`.
    pub fn new(cache: PersonalizationCache, service: Arc<dyn RewriteService>) -> Self {
        Self {
            cache,
            service,
            enabled: true,
        }
    }

    /// Switch rewriting on or off. Disabled personalizers never call the service.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The cache in front of the service.
    pub fn cache(&self) -> &PersonalizationCache {
        &self.cache
    }

    /// Rewrite `original_markdown` of `post_id` for the requested persona.
    ///
    /// A previously cached rewrite for the same (post, persona) pair is
    /// returned as-is. Otherwise the service is called and its output cached.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Disabled`] when switched off, and propagates
    /// validation and service failures. Cache problems are never errors.
    pub async fn personalize(
        &self,
        post_id: &str,
        request: &PersonaRequest,
        original_markdown: &str,
    ) -> Result<Personalized, RewriteError> {
        if !self.enabled {
            return Err(RewriteError::Disabled);
        }

        let key = CacheKey::new(post_id, request.persona).to_string();
        if let Some(markdown) = self.cache.get(&key).await {
            debug!(%key, "personalization cache hit");
            return Ok(Personalized {
                markdown,
                source: Source::Cache,
            });
        }

        let rewrite = RewriteRequest {
            post_id: post_id.to_owned(),
            persona: request.persona,
            prompt: request.effective_prompt().to_owned(),
            content_markdown: original_markdown.to_owned(),
        };
        rewrite.validate()?;

        let markdown = self.service.rewrite(&rewrite).await?;
        self.cache.set(&key, &markdown).await;
        info!(
            %key,
            model = self.service.model_id(),
            output_len = markdown.len(),
            "post personalized"
        );

        Ok(Personalized {
            markdown,
            source: Source::Rewrite,
        })
    }

    /// Forget the cached rewrite of `post_id` for `persona`.
    pub async fn forget(&self, post_id: &str, persona: Persona) {
        self.cache
            .invalidate(&CacheKey::new(post_id, persona).to_string())
            .await;
    }
}
