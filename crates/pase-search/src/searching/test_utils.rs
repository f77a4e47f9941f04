//! Test utilities for search clients

use super::client::{QueryMode, SearchClient};
use crate::error::{SearchError, SearchResult};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

type Scripted = SearchResult<String>;

/// Scripted `SearchClient` that records every call it receives
///
/// Responses are looked up per `(patch, mode)` first and per mode second.
/// A mode with no script answers like a backend without that endpoint.
#[derive(Default)]
pub struct MockSearchClient {
    by_mode: HashMap<QueryMode, Scripted>,
    by_patch: HashMap<(String, QueryMode), Scripted>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(QueryMode, String)>>,
}

impl MockSearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client whose three multi-query endpoints all report "nothing found"
    pub fn with_empty_payloads() -> Self {
        Self::new()
            .with_response(QueryMode::PatchTarget, "{}")
            .with_response(QueryMode::AppliedPatch, "{}")
            .with_response(QueryMode::ByContent, "[]")
    }

    /// Answer every `mode` query with `body`
    #[must_use]
    pub fn with_response(mut self, mode: QueryMode, body: &str) -> Self {
        self.by_mode.insert(mode, Ok(body.to_string()));
        self
    }

    /// Fail every `mode` query with `error`
    #[must_use]
    pub fn with_failure(mut self, mode: QueryMode, error: SearchError) -> Self {
        self.by_mode.insert(mode, Err(error));
        self
    }

    /// Answer `mode` queries for one specific patch with `body`
    #[must_use]
    pub fn with_patch_response(mut self, patch: &str, mode: QueryMode, body: &str) -> Self {
        self.by_patch
            .insert((patch.to_string(), mode), Ok(body.to_string()));
        self
    }

    /// Hold every query for `patch` for `delay` before answering
    #[must_use]
    pub fn with_delay(mut self, patch: &str, delay: Duration) -> Self {
        self.delays.insert(patch.to_string(), delay);
        self
    }

    /// Every call received so far, in arrival order
    #[allow(clippy::unwrap_used)] // Test infrastructure - a poisoned lock means a test already panicked
    pub fn calls(&self) -> Vec<(QueryMode, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    pub fn calls_for(&self, mode: QueryMode) -> usize {
        self.calls().iter().filter(|(m, _)| *m == mode).count()
    }

    pub fn calls_for_patch(&self, patch: &str) -> usize {
        self.calls().iter().filter(|(_, p)| p == patch).count()
    }

    fn scripted(&self, patch: &str, mode: QueryMode) -> Scripted {
        self.by_patch
            .get(&(patch.to_string(), mode))
            .or_else(|| self.by_mode.get(&mode))
            .cloned()
            .unwrap_or_else(|| {
                Err(SearchError::Backend {
                    status: 404,
                    body: format!("no mock response for {mode} query"),
                })
            })
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    #[allow(clippy::unwrap_used)] // Test infrastructure - a poisoned lock means a test already panicked
    async fn query(&self, patch: &str, mode: QueryMode) -> SearchResult<String> {
        // Recorded before the delay so cancelled calls are still counted
        self.calls
            .lock()
            .unwrap()
            .push((mode, patch.to_string()));

        if let Some(delay) = self.delays.get(patch) {
            tokio::time::sleep(*delay).await;
        }

        self.scripted(patch, mode)
    }
}
