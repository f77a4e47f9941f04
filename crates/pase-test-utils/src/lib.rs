//! Shared test utilities for PaSe integration tests
//!
//! Provides a scripted stand-in for the PaSe search service so client
//! tests can exercise the real HTTP path without a running backend.
//!
//! ## Usage
//!
//! In your test crate's `Cargo.toml`:
//! ```toml
//! [dev-dependencies]
//! pase-test-utils = { path = "../pase-test-utils" }
//! ```
//!
//! In your tests:
//! ```no_run
//! use pase_test_utils::{Endpoint, MockBackend};
//!
//! # async fn example() {
//! let backend = MockBackend::start().await;
//! backend.respond(Endpoint::PatchTarget, 200, "{}").await;
//! backend.respond(Endpoint::AppliedPatch, 200, "{}").await;
//! backend.respond(Endpoint::ByContent, 200, "[]").await;
//! // ... point the client at backend.uri() ...
//! # }
//! ```

use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// A small two-hunk unified diff touching one Go file
pub const SAMPLE_PATCH: &str = "\
--- a/file.go
+++ b/file.go
@@ -1,3 +1,3 @@
 package main
-import \"fmt\"
+import \"log\"
@@ -10,2 +10,2 @@
-	fmt.Println(msg)
+	log.Println(msg)
";

/// Backend endpoint a scripted response is mounted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `POST /search`
    PatchTarget,
    /// `POST /search?applied_patch=true`
    AppliedPatch,
    /// `POST /search?by_content=true`
    ByContent,
    /// `GET /search?patch=...`
    Legacy,
}

/// Matches requests that carry no query string at all
///
/// `path("/search")` alone would also match the flagged variants.
struct NoQueryString;

impl Match for NoQueryString {
    fn matches(&self, request: &Request) -> bool {
        request.url.query().is_none()
    }
}

/// Scripted PaSe search service on a random local port
pub struct MockBackend {
    server: MockServer,
}

impl MockBackend {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to configure the client with
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Answer `endpoint` with `status` and a raw `body`
    pub async fn respond(&self, endpoint: Endpoint, status: u16, body: &str) {
        self.mount(endpoint, ResponseTemplate::new(status).set_body_string(body))
            .await;
    }

    /// Like `respond`, but only after `delay`
    pub async fn respond_after(&self, endpoint: Endpoint, delay: Duration, body: &str) {
        self.mount(
            endpoint,
            ResponseTemplate::new(200)
                .set_body_string(body)
                .set_delay(delay),
        )
        .await;
    }

    /// Answer the three multi-query endpoints with empty payloads
    pub async fn respond_empty(&self) {
        self.respond(Endpoint::PatchTarget, 200, "{}").await;
        self.respond(Endpoint::AppliedPatch, 200, "{}").await;
        self.respond(Endpoint::ByContent, 200, "[]").await;
    }

    /// Answer the legacy endpoint only when it is asked about `patch`
    pub async fn respond_legacy_for(&self, patch: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("patch", patch))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Number of requests the backend has received so far
    pub async fn received_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }

    /// Bodies of every `POST` received so far, in arrival order
    pub async fn received_bodies(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.method.as_str() == "POST")
            .map(|request| String::from_utf8_lossy(&request.body).into_owned())
            .collect()
    }

    async fn mount(&self, endpoint: Endpoint, template: ResponseTemplate) {
        let mock = match endpoint {
            Endpoint::PatchTarget => Mock::given(method("POST"))
                .and(path("/search"))
                .and(NoQueryString),
            Endpoint::AppliedPatch => Mock::given(method("POST"))
                .and(path("/search"))
                .and(query_param("applied_patch", "true")),
            Endpoint::ByContent => Mock::given(method("POST"))
                .and(path("/search"))
                .and(query_param("by_content", "true")),
            Endpoint::Legacy => Mock::given(method("GET")).and(path("/search")),
        };
        mock.respond_with(template).mount(&self.server).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_endpoints_are_routed_by_query_flag() {
        let backend = MockBackend::start().await;
        backend.respond(Endpoint::PatchTarget, 200, "targets").await;
        backend.respond(Endpoint::AppliedPatch, 200, "applied").await;
        backend.respond(Endpoint::ByContent, 200, "copies").await;

        let http = reqwest::Client::new();
        let uri = backend.uri();
        for (suffix, expected) in [
            ("", "targets"),
            ("?applied_patch=true", "applied"),
            ("?by_content=true", "copies"),
        ] {
            let body = http
                .post(format!("{uri}/search{suffix}"))
                .body(SAMPLE_PATCH)
                .send()
                .await
                .unwrap()
                .text()
                .await
                .unwrap();
            assert_eq!(body, expected);
        }

        assert_eq!(backend.received_count().await, 3);
        assert_eq!(backend.received_bodies().await.len(), 3);
    }

    #[tokio::test]
    async fn test_unmatched_request_gets_404() {
        let backend = MockBackend::start().await;
        let status = reqwest::Client::new()
            .post(format!("{}/search", backend.uri()))
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status.as_u16(), 404);
    }
}
