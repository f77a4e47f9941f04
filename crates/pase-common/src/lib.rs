//! Common utilities shared across the PaSe crates
//!
//! Holds the per-submission correlation identifier and one-time process
//! bootstrap helpers.

pub mod init;

pub use init::initialize_environment;
use uuid::Uuid;

/// Correlation ID used to tie together every backend query issued for one
/// patch submission
///
/// Uses UUID v4 so log lines from concurrent submissions never collide
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new correlation ID using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_ids_are_unique() {
        assert_ne!(CorrelationId::new(), CorrelationId::new());
    }

    #[test]
    fn test_display_is_a_parseable_uuid() {
        let id = CorrelationId::new();
        assert!(Uuid::try_parse(&id.to_string()).is_ok());
    }
}
