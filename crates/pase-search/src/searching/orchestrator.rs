//! Turns one submitted patch into one `Outcome`
//!
//! The primary query runs first and short-circuits the submission when it
//! fails. The remaining queries all run; if any of them fails, the failure
//! observed last (in plan order) becomes the outcome and no partial result
//! is ever produced. Bodies are only decoded once every query succeeded.

use super::client::{QueryMode, SearchClient};
use crate::error::{SearchError, SearchResult};
use crate::model::{
    ChunkResults, FileResults, Outcome, ResultModel, decode_chunk_results, decode_combined,
    decode_file_results,
};
use futures::future::join_all;
use pase_common::CorrelationId;
use pase_config::{ResponseShape, SearchConfig};
use std::sync::Arc;

/// Ordered set of queries issued for one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    primary: QueryMode,
    followups: Vec<QueryMode>,
}

impl QueryPlan {
    /// Every query the given protocol shape needs
    pub fn for_shape(shape: ResponseShape) -> Self {
        match shape {
            ResponseShape::MultiQuery => Self {
                primary: QueryMode::PatchTarget,
                followups: vec![QueryMode::AppliedPatch, QueryMode::ByContent],
            },
            ResponseShape::SingleQuery => Self::only(QueryMode::Combined),
        }
    }

    /// A single query; the unqueried sections of the result stay empty
    pub const fn only(mode: QueryMode) -> Self {
        Self {
            primary: mode,
            followups: Vec::new(),
        }
    }

    pub const fn primary(&self) -> QueryMode {
        self.primary
    }

    pub fn followups(&self) -> &[QueryMode] {
        &self.followups
    }
}

/// Sequences the `SearchClient` calls of one submission and folds them
/// into one `Outcome`
pub struct SearchOrchestrator {
    client: Arc<dyn SearchClient>,
    plan: QueryPlan,
    concurrent_followups: bool,
}

impl SearchOrchestrator {
    /// Create an orchestrator that dispatches follow-up queries concurrently
    pub fn new(client: Arc<dyn SearchClient>, plan: QueryPlan) -> Self {
        Self {
            client,
            plan,
            concurrent_followups: true,
        }
    }

    /// Create an orchestrator for the configured shape and dispatch policy
    pub fn from_config(client: Arc<dyn SearchClient>, config: &SearchConfig) -> Self {
        Self::new(client, QueryPlan::for_shape(config.shape))
            .with_concurrent_followups(config.concurrent_followups)
    }

    #[must_use]
    pub fn with_concurrent_followups(mut self, concurrent: bool) -> Self {
        self.concurrent_followups = concurrent;
        self
    }

    /// Run every planned query for `patch` and produce exactly one outcome
    #[tracing::instrument(
        skip(self, patch),
        fields(correlation_id = %correlation_id, patch_len = patch.len(), primary = %self.plan.primary())
    )]
    pub async fn run(&self, patch: &str, correlation_id: &CorrelationId) -> Outcome {
        let outcome = Outcome::from(self.dispatch(patch).await);
        match &outcome {
            Outcome::Success(model) => tracing::info!(
                matches = model.match_count(),
                "Search completed successfully"
            ),
            Outcome::Failure(error) => tracing::warn!(
                kind = error.kind(),
                error = %error,
                "Search failed"
            ),
        }
        outcome
    }

    async fn dispatch(&self, patch: &str) -> SearchResult<ResultModel> {
        let primary = self.plan.primary();
        let primary_body = self.client.query(patch, primary).await.inspect_err(|e| {
            tracing::debug!(mode = %primary, error = %e, "Primary query failed, skipping follow-ups");
        })?;

        let mut bodies = vec![(primary, primary_body)];
        let mut last_failure: Option<SearchError> = None;

        for (mode, result) in self.run_followups(patch).await {
            match result {
                Ok(body) => bodies.push((mode, body)),
                Err(e) => {
                    tracing::debug!(mode = %mode, error = %e, "Follow-up query failed");
                    last_failure = Some(e);
                }
            }
        }

        if let Some(error) = last_failure {
            return Err(error);
        }

        Self::fold(bodies)
    }

    /// Results come back in plan order whether or not the queries overlapped
    async fn run_followups(&self, patch: &str) -> Vec<(QueryMode, SearchResult<String>)> {
        let followups = self.plan.followups();

        if self.concurrent_followups {
            let results = join_all(followups.iter().map(|mode| self.client.query(patch, *mode))).await;
            return followups.iter().copied().zip(results).collect();
        }

        let mut results = Vec::with_capacity(followups.len());
        for mode in followups {
            results.push((*mode, self.client.query(patch, *mode).await));
        }
        results
    }

    fn fold(bodies: Vec<(QueryMode, String)>) -> SearchResult<ResultModel> {
        let mut patch_targets = FileResults::new();
        let mut applied_patch = FileResults::new();
        let mut by_content = ChunkResults::new();

        for (mode, body) in bodies {
            match mode {
                QueryMode::PatchTarget => patch_targets = decode_file_results(mode, &body)?,
                QueryMode::AppliedPatch => applied_patch = decode_file_results(mode, &body)?,
                QueryMode::ByContent => by_content = decode_chunk_results(mode, &body)?,
                QueryMode::Combined => return decode_combined(&body),
            }
        }

        Ok(ResultModel::assemble(patch_targets, applied_patch, by_content))
    }
}
