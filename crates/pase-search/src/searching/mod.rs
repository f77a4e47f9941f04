//! Query dispatch, outcome assembly and submission sessions
pub mod client;
pub mod orchestrator;
pub mod session;

pub use client::{HttpSearchClient, QueryMode, SearchClient};
pub use orchestrator::{QueryPlan, SearchOrchestrator};
pub use session::{SearchSession, SearchState, SessionSnapshot};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
