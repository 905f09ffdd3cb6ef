use async_trait::async_trait;
use ebookmaker::document::{Document, EbookStyle, SectionKey};
use ebookmaker::generation::{
    GenerationClient, GenerationError, GenerationKind, GenerationRequest, RetryPolicy, RetryingClient,
};
use ebookmaker::session::{EbookSession, NoticeKind};
use ebookmaker::surface::SyncPolicy;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Fails with `error` for the first `failures` calls, then succeeds
struct FlakyClient {
    failures: u32,
    error: GenerationError,
    calls: AtomicU32,
}

impl FlakyClient {
    fn new(failures: u32, error: GenerationError) -> Self {
        Self {
            failures,
            error,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl GenerationClient for FlakyClient {
    async fn generate_text(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(self.error.clone())
        } else {
            Ok("Pendahuluan yang hangat.".to_string())
        }
    }

    async fn generate_list(&self, request: &GenerationRequest) -> Result<Vec<String>, GenerationError> {
        self.generate_text(request).await.map(|text| vec![text])
    }
}

fn request() -> GenerationRequest {
    GenerationRequest::new(GenerationKind::Introduction, "Belajar Fotografi", EbookStyle::Santai)
}

fn document() -> Document {
    let mut doc = Document::new();
    doc.topic = "Belajar Fotografi".to_string();
    doc
}

#[tokio::test(start_paused = true)]
async fn test_two_transient_failures_then_success() {
    let client = RetryingClient::new(
        FlakyClient::new(2, GenerationError::classify("HTTP 503: high demand")),
        RetryPolicy::default(),
    );

    let start = Instant::now();
    let text = client.generate_text(&request()).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(text, "Pendahuluan yang hangat.");
    assert_eq!(client.inner().calls.load(Ordering::SeqCst), 3);
    // 1000ms + 2000ms of backoff
    assert!(elapsed >= Duration::from_millis(3000));
    assert!(elapsed < Duration::from_millis(3050));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_credential_fails_immediately() {
    let client = RetryingClient::new(
        FlakyClient::new(5, GenerationError::classify("HTTP 400: API key not valid")),
        RetryPolicy::default(),
    );

    let start = Instant::now();
    let err = client.generate_text(&request()).await.unwrap_err();
    assert!(matches!(err, GenerationError::InvalidCredential(_)));
    assert_eq!(client.inner().calls.load(Ordering::SeqCst), 1);
    assert!(start.elapsed() < Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_session_reports_exhausted_retries() {
    let policy = RetryPolicy {
        max_retries: 2,
        initial_backoff: Duration::from_millis(500),
        ..RetryPolicy::default()
    };
    let client = RetryingClient::new(
        FlakyClient::new(10, GenerationError::classify("429 RESOURCE_EXHAUSTED")),
        policy,
    );
    let session = EbookSession::new(document(), client, SyncPolicy::default());

    let start = Instant::now();
    let err = session
        .section(SectionKey::Introduction)
        .generate()
        .await
        .unwrap_err();

    assert_eq!(err.notice().kind, NoticeKind::Overloaded);
    assert_eq!(session.client().inner().calls.load(Ordering::SeqCst), 3);
    assert!(start.elapsed() >= Duration::from_millis(1500));
    assert!(!session.is_loading("intro"));
    assert!(session.document().introduction.content.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_session_recovers_after_transient_failure() {
    let client = RetryingClient::new(
        FlakyClient::new(1, GenerationError::classify("503 UNAVAILABLE")),
        RetryPolicy::default(),
    );
    let session = EbookSession::new(document(), client, SyncPolicy::default());

    session.section(SectionKey::Introduction).generate().await.unwrap();
    assert_eq!(
        session.document().introduction.content,
        "<p class=\"mb-4\">Pendahuluan yang hangat.</p>"
    );
}
