//! End-to-end search tests against a scripted backend over real HTTP

use pase_common::CorrelationId;
use pase_config::{ApiConfig, ResponseShape};
use pase_search::{
    HttpSearchClient, MatchResult, Outcome, QueryMode, QueryPlan, SearchClient, SearchError,
    SearchOrchestrator, SearchSession,
};
use pase_test_utils::{Endpoint, MockBackend, SAMPLE_PATCH};
use std::sync::Arc;
use std::time::Duration;

fn api_config(url: &str, timeout_seconds: u64) -> ApiConfig {
    ApiConfig {
        url: url.to_string(),
        timeout_seconds,
    }
}

fn orchestrator_for(url: &str, shape: ResponseShape) -> SearchOrchestrator {
    let client = HttpSearchClient::new(&api_config(url, 5)).unwrap();
    SearchOrchestrator::new(Arc::new(client), QueryPlan::for_shape(shape))
}

async fn search(backend: &MockBackend, patch: &str) -> Outcome {
    orchestrator_for(&backend.uri(), ResponseShape::MultiQuery)
        .run(patch, &CorrelationId::new())
        .await
}

#[tokio::test]
async fn test_successful_search_assembles_all_sections() {
    let backend = MockBackend::start().await;
    backend
        .respond(
            Endpoint::PatchTarget,
            200,
            r#"{"file.go": [[{"path":"file.go","score":12}]]}"#,
        )
        .await;
    backend.respond(Endpoint::AppliedPatch, 200, "{}").await;
    backend.respond(Endpoint::ByContent, 200, "[]").await;

    let outcome = search(&backend, SAMPLE_PATCH).await;

    let model = outcome.result_model().unwrap();
    assert_eq!(
        model.patch_targets.get("file.go").unwrap(),
        &vec![vec![MatchResult::new("file.go", 12)]]
    );
    assert!(model.applied_patch.is_empty());
    assert!(model.by_content.is_empty());

    // Every query carried the patch verbatim as its body
    let bodies = backend.received_bodies().await;
    assert_eq!(bodies.len(), 3);
    assert!(bodies.iter().all(|body| body == SAMPLE_PATCH));
}

#[tokio::test]
async fn test_primary_backend_error_skips_followups() {
    let backend = MockBackend::start().await;
    backend.respond(Endpoint::PatchTarget, 400, "bad patch").await;
    backend.respond(Endpoint::AppliedPatch, 200, "{}").await;
    backend.respond(Endpoint::ByContent, 200, "[]").await;

    let outcome = search(&backend, "garbage").await;

    assert_eq!(outcome.failure_reason().as_deref(), Some("bad patch"));
    assert_eq!(backend.received_count().await, 1);
}

#[tokio::test]
async fn test_followup_backend_error_fails_whole_submission() {
    let backend = MockBackend::start().await;
    backend
        .respond(
            Endpoint::PatchTarget,
            200,
            r#"{"a.c": [{"path":"a.c","score":0.9}]}"#,
        )
        .await;
    backend.respond(Endpoint::AppliedPatch, 504, "timeout").await;
    backend.respond(Endpoint::ByContent, 200, "[]").await;

    let outcome = search(&backend, SAMPLE_PATCH).await;

    assert_eq!(outcome.failure_reason().as_deref(), Some("timeout"));
    assert!(outcome.result_model().is_none());
}

#[tokio::test]
async fn test_empty_backend_answers_are_success() {
    let backend = MockBackend::start().await;
    backend.respond_empty().await;

    let outcome = search(&backend, "").await;

    assert!(outcome.is_success());
    assert_eq!(outcome.result_model().unwrap().match_count(), 0);
}

#[tokio::test]
async fn test_empty_error_body_reports_status() {
    let backend = MockBackend::start().await;
    backend.respond(Endpoint::PatchTarget, 502, "").await;

    let outcome = search(&backend, SAMPLE_PATCH).await;

    assert_eq!(
        outcome.failure_reason().as_deref(),
        Some("Backend returned HTTP 502")
    );
}

#[tokio::test]
async fn test_malformed_success_body_is_protocol_error() {
    let backend = MockBackend::start().await;
    backend.respond(Endpoint::PatchTarget, 200, "{}").await;
    backend.respond(Endpoint::AppliedPatch, 200, "{}").await;
    backend
        .respond(Endpoint::ByContent, 200, "<html>gateway</html>")
        .await;

    let outcome = search(&backend, SAMPLE_PATCH).await;

    assert!(matches!(
        outcome.error(),
        Some(SearchError::Protocol {
            mode: QueryMode::ByContent,
            ..
        })
    ));
}

#[tokio::test]
async fn test_legacy_single_query_sends_patch_in_query_string() {
    let backend = MockBackend::start().await;
    backend
        .respond_legacy_for(SAMPLE_PATCH, r#"[{"path":"vendor/file.go","score":7}]"#)
        .await;

    let outcome = orchestrator_for(&backend.uri(), ResponseShape::SingleQuery)
        .run(SAMPLE_PATCH, &CorrelationId::new())
        .await;

    assert_eq!(
        outcome.result_model().unwrap().by_content,
        vec![vec![MatchResult::new("vendor/file.go", 7)]]
    );
    assert_eq!(backend.received_count().await, 1);
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Bind then drop a listener to get a port nobody is serving
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = HttpSearchClient::new(&api_config(&format!("http://127.0.0.1:{port}"), 5)).unwrap();

    let err = client
        .query(SAMPLE_PATCH, QueryMode::PatchTarget)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "transport");
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let backend = MockBackend::start().await;
    backend
        .respond_after(Endpoint::PatchTarget, Duration::from_secs(3), "{}")
        .await;
    let client = HttpSearchClient::new(&api_config(&backend.uri(), 1)).unwrap();

    let err = client
        .query(SAMPLE_PATCH, QueryMode::PatchTarget)
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::Transport { .. }));
}

#[tokio::test]
async fn test_session_publishes_latest_submission() {
    let backend = MockBackend::start().await;
    backend.respond_empty().await;
    let session = SearchSession::new(orchestrator_for(&backend.uri(), ResponseShape::MultiQuery));

    let first = session.submit("first");
    let second = session.submit_and_wait(SAMPLE_PATCH).await;
    first.await.unwrap();

    assert!(second.unwrap().is_success());
    assert_eq!(session.snapshot().generation, 2);
}
