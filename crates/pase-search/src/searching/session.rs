//! Last-submission-wins sessions
//!
//! Every submission bumps the session generation before its queries are
//! dispatched. An outcome is only published while its generation is still
//! the current one, so a slow earlier submission can never overwrite the
//! result of a later one. Observers follow the published state through a
//! `tokio::sync::watch` channel.

use super::orchestrator::SearchOrchestrator;
use crate::model::Outcome;
use pase_common::CorrelationId;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// What the session currently shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// The latest submission is still in flight
    Pending,
    /// The latest submission finished
    Resolved(Outcome),
}

/// Published session state tagged with the submission it belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Number of submissions so far; 0 while idle
    pub generation: u64,
    pub state: SearchState,
}

/// Accepts patch submissions and publishes only the newest outcome
pub struct SearchSession {
    orchestrator: Arc<SearchOrchestrator>,
    state: Arc<watch::Sender<SessionSnapshot>>,
    cancel_superseded: bool,
    shutdown: CancellationToken,
}

impl SearchSession {
    pub fn new(orchestrator: SearchOrchestrator) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            orchestrator: Arc::new(orchestrator),
            state: Arc::new(state),
            cancel_superseded: false,
            shutdown: CancellationToken::new(),
        }
    }

    /// Abandon in-flight queries of a submission as soon as it is superseded
    #[must_use]
    pub fn with_cancel_superseded(mut self, cancel: bool) -> Self {
        self.cancel_superseded = cancel;
        self
    }

    /// Follow every published state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Copy of the currently published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Start a search for `patch`, superseding any submission still in flight
    ///
    /// The returned handle completes once the submission has either published
    /// its outcome or been discarded.
    pub fn submit(&self, patch: impl Into<String>) -> JoinHandle<()> {
        let generation = self.begin();
        self.spawn(patch.into(), generation)
    }

    /// Submit `patch` and wait for its outcome
    ///
    /// Returns `None` when a later submission or a shutdown superseded it.
    pub async fn submit_and_wait(&self, patch: impl Into<String>) -> Option<Outcome> {
        let generation = self.begin();
        if let Err(e) = self.spawn(patch.into(), generation).await {
            tracing::error!(generation, "Search task failed: {e}");
            return None;
        }

        match self.snapshot() {
            SessionSnapshot {
                generation: published,
                state: SearchState::Resolved(outcome),
            } if published == generation => Some(outcome),
            _ => None,
        }
    }

    /// Abandon every in-flight submission; the published state is left as is
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn begin(&self) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|snapshot| {
            snapshot.generation = snapshot.generation.wrapping_add(1);
            snapshot.state = SearchState::Pending;
            generation = snapshot.generation;
        });
        generation
    }

    fn spawn(&self, patch: String, generation: u64) -> JoinHandle<()> {
        let orchestrator = Arc::clone(&self.orchestrator);
        let state = Arc::clone(&self.state);
        let token = self.shutdown.child_token();
        let cancel_superseded = self.cancel_superseded;
        let correlation_id = CorrelationId::new();
        let span = tracing::info_span!("search_submission", generation, correlation_id = %correlation_id);

        tokio::spawn(
            async move {
                let run = orchestrator.run(&patch, &correlation_id);
                let mut superseded = state.subscribe();

                let outcome = tokio::select! {
                    outcome = run => Some(outcome),
                    _ = superseded.wait_for(|s| s.generation != generation), if cancel_superseded => {
                        tracing::debug!("Superseded, abandoning in-flight queries");
                        None
                    }
                    () = token.cancelled() => {
                        tracing::debug!("Session shut down, abandoning in-flight queries");
                        None
                    }
                };

                if let Some(outcome) = outcome {
                    publish(&state, generation, outcome);
                }
            }
            .instrument(span),
        )
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn publish(state: &watch::Sender<SessionSnapshot>, generation: u64, outcome: Outcome) {
    let published = state.send_if_modified(|snapshot| {
        if snapshot.generation != generation {
            return false;
        }
        snapshot.state = SearchState::Resolved(outcome);
        true
    });

    if published {
        tracing::debug!("Outcome published");
    } else {
        tracing::debug!("Discarding outcome of superseded submission");
    }
}
