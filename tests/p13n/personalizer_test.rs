//! Personalizer tests with a scripted rewrite service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use folio::p13n::{
    Persona, PersonaRequest, PersonalizationCache, Personalizer, Source,
};
use folio::providers::{RewriteError, RewriteRequest, RewriteService};
use folio::storage::MemoryStore;

#[derive(Default)]
struct ScriptedService {
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
    fail: bool,
}

impl ScriptedService {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().expect("lock").clone()
    }
}

#[async_trait]
impl RewriteService for ScriptedService {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, RewriteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().expect("lock") = Some(request.prompt.clone());
        if self.fail {
            return Err(RewriteError::HttpStatus {
                status: 500,
                body: "upstream down".to_owned(),
            });
        }
        Ok(format!(
            "# {} version\n{}",
            request.persona, request.content_markdown
        ))
    }

    fn model_id(&self) -> &str {
        "test/scripted"
    }
}

fn setup(service: Arc<ScriptedService>) -> Personalizer {
    let cache = PersonalizationCache::new(Arc::new(MemoryStore::new()));
    Personalizer::new(cache, service)
}

#[tokio::test]
async fn first_request_rewrites_second_hits_cache() {
    let service = Arc::new(ScriptedService::default());
    let personalizer = setup(service.clone());
    let request = PersonaRequest::new(Persona::Hr);

    let first = personalizer
        .personalize("post1", &request, "original")
        .await
        .expect("rewrite should succeed");
    assert_eq!(first.source, Source::Rewrite);
    assert_eq!(first.markdown, "# HR version\noriginal");

    let second = personalizer
        .personalize("post1", &request, "original")
        .await
        .expect("cache hit should succeed");
    assert_eq!(second.source, Source::Cache);
    assert_eq!(second.markdown, first.markdown);
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn rewrite_is_stored_under_composite_key() {
    let service = Arc::new(ScriptedService::default());
    let personalizer = setup(service);

    personalizer
        .personalize("post1", &PersonaRequest::new(Persona::Poet), "original")
        .await
        .expect("rewrite should succeed");

    assert!(personalizer.cache().has("post1:Poet").await);
    assert!(!personalizer.cache().has("post1:HR").await);
}

#[tokio::test]
async fn each_persona_is_cached_separately() {
    let service = Arc::new(ScriptedService::default());
    let personalizer = setup(service.clone());

    for persona in [Persona::Hr, Persona::NonIt, Persona::Hr, Persona::NonIt] {
        personalizer
            .personalize("post1", &PersonaRequest::new(persona), "original")
            .await
            .expect("should succeed");
    }
    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn custom_prompt_is_sent_to_service() {
    let service = Arc::new(ScriptedService::default());
    let personalizer = setup(service.clone());

    personalizer
        .personalize("post1", &PersonaRequest::custom("Like a sports commentator"), "x")
        .await
        .expect("should succeed");
    assert_eq!(
        service.last_prompt().as_deref(),
        Some("Like a sports commentator")
    );
}

#[tokio::test]
async fn builtin_persona_sends_default_prompt() {
    let service = Arc::new(ScriptedService::default());
    let personalizer = setup(service.clone());

    personalizer
        .personalize("post1", &PersonaRequest::new(Persona::Developer), "x")
        .await
        .expect("should succeed");
    assert_eq!(
        service.last_prompt().as_deref(),
        Some(Persona::Developer.default_prompt())
    );
}

#[tokio::test]
async fn service_failure_propagates_and_caches_nothing() {
    let service = Arc::new(ScriptedService::failing());
    let personalizer = setup(service.clone());

    let result = personalizer
        .personalize("post1", &PersonaRequest::new(Persona::Hr), "original")
        .await;
    assert!(matches!(
        result,
        Err(RewriteError::HttpStatus { status: 500, .. })
    ));
    assert!(!personalizer.cache().has("post1:HR").await);
}

#[tokio::test]
async fn invalid_request_never_reaches_service() {
    let service = Arc::new(ScriptedService::default());
    let personalizer = setup(service.clone());

    let empty_content = personalizer
        .personalize("post1", &PersonaRequest::new(Persona::Hr), "")
        .await;
    assert!(matches!(empty_content, Err(RewriteError::Invalid(_))));

    let long_id = "p".repeat(257);
    let bad_id = personalizer
        .personalize(&long_id, &PersonaRequest::new(Persona::Hr), "x")
        .await;
    assert!(matches!(bad_id, Err(RewriteError::Invalid(_))));

    let long_prompt = PersonaRequest::custom("x".repeat(801));
    let bad_prompt = personalizer.personalize("post1", &long_prompt, "x").await;
    assert!(matches!(bad_prompt, Err(RewriteError::Invalid(_))));

    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn disabled_personalizer_refuses_without_calling_service() {
    let service = Arc::new(ScriptedService::default());
    let personalizer = setup(service.clone()).enabled(false);

    let result = personalizer
        .personalize("post1", &PersonaRequest::new(Persona::Hr), "original")
        .await;
    assert!(matches!(result, Err(RewriteError::Disabled)));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn forget_forces_a_fresh_rewrite() {
    let service = Arc::new(ScriptedService::default());
    let personalizer = setup(service.clone());
    let request = PersonaRequest::new(Persona::Child10);

    personalizer
        .personalize("post1", &request, "x")
        .await
        .expect("should succeed");
    personalizer.forget("post1", Persona::Child10).await;
    let again = personalizer
        .personalize("post1", &request, "x")
        .await
        .expect("should succeed");

    assert_eq!(again.source, Source::Rewrite);
    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn detached_cache_always_rewrites() {
    let service = Arc::new(ScriptedService::default());
    let personalizer = Personalizer::new(PersonalizationCache::detached(), service.clone());
    let request = PersonaRequest::new(Persona::Hr);

    for _ in 0..3 {
        let result = personalizer
            .personalize("post1", &request, "x")
            .await
            .expect("should succeed");
        assert_eq!(result.source, Source::Rewrite);
    }
    assert_eq!(service.calls(), 3);
}
