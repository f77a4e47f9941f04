use crate::searching::client::QueryMode;
use thiserror::Error;

/// Failure of one submission, surfaced to the renderer as its reason text
///
/// `Display` is the user-facing message: transport diagnostics and backend
/// bodies are passed through verbatim, protocol errors get a fixed prefix so
/// they can never be confused with a backend diagnostic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Network unreachable, timeout, connection reset, unreadable body
    #[error("{message}")]
    Transport { message: String },

    /// Non-2xx status; the body is the backend's diagnostic
    #[error("{}", backend_message(*status, body))]
    Backend { status: u16, body: String },

    /// 2xx status but the body is not the documented JSON shape
    #[error("Malformed response from backend for {mode} query: {detail}")]
    Protocol { mode: QueryMode, detail: String },
}

impl SearchError {
    /// Short machine-friendly kind, used as a structured log field
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Backend { .. } => "backend",
            Self::Protocol { .. } => "protocol",
        }
    }
}

fn backend_message(status: u16, body: &str) -> String {
    if body.is_empty() {
        format!("Backend returned HTTP {status}")
    } else {
        body.to_string()
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest keeps the useful part (refused, reset, dns) in the source chain
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Transport { message }
    }
}

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_displays_body_verbatim() {
        let err = SearchError::Backend {
            status: 400,
            body: "bad patch".to_string(),
        };
        assert_eq!(err.to_string(), "bad patch");
    }

    #[test]
    fn test_backend_error_with_empty_body_mentions_status() {
        let err = SearchError::Backend {
            status: 502,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "Backend returned HTTP 502");
    }

    #[test]
    fn test_whitespace_only_backend_body_is_kept_verbatim() {
        let err = SearchError::Backend {
            status: 400,
            body: "\n".to_string(),
        };
        assert_eq!(err.to_string(), "\n");
    }

    #[test]
    fn test_protocol_error_is_distinguishable() {
        let err = SearchError::Protocol {
            mode: QueryMode::AppliedPatch,
            detail: "expected value at line 1 column 1".to_string(),
        };
        assert!(err.to_string().starts_with("Malformed response"));
        assert!(err.to_string().contains("applied-patch"));
        assert_eq!(err.kind(), "protocol");
    }
}
