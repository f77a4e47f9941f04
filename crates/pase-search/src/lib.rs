//! PaSe patch search client crate
//!
//! This crate queries a PaSe backend for the places a patch could apply to,
//! the places it is already applied, and copies of its content. It folds
//! the answers into one normalized `ResultModel` per submission and makes
//! sure only the newest submission's outcome is ever published.

pub mod error;
pub mod model;
pub mod searching;

// Re-export main types
pub use error::{SearchError, SearchResult};
pub use model::{ChunkResults, FileResults, MatchResult, Outcome, ResultModel};
pub use pase_config::ResponseShape;
pub use searching::{
    client::{HttpSearchClient, QueryMode, SearchClient},
    orchestrator::{QueryPlan, SearchOrchestrator},
    session::{SearchSession, SearchState, SessionSnapshot},
};

// Re-export test utilities when test-utils feature is enabled
#[cfg(any(test, feature = "test-utils"))]
pub mod test_mocks {
    pub use crate::searching::test_utils::MockSearchClient;
}
