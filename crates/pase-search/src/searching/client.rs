//! Backend search client: one call, one request, no retries

use crate::error::{SearchError, SearchResult};
use async_trait::async_trait;
use pase_config::ApiConfig;
use reqwest::header::{CONTENT_TYPE, HeaderValue};

/// Which backend query to issue for a patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    /// Files the patch could be applied to (`POST /search`)
    PatchTarget,
    /// Locations where the patch is already applied (`POST /search?applied_patch=true`)
    AppliedPatch,
    /// Copies of the patch content (`POST /search?by_content=true`)
    ByContent,
    /// Legacy single query returning one pre-merged payload (`GET /search?patch=...`)
    Combined,
}

impl QueryMode {
    /// Query-string flag selecting this mode on the multi-query endpoint
    const fn flag(self) -> Option<&'static str> {
        match self {
            Self::AppliedPatch => Some("applied_patch=true"),
            Self::ByContent => Some("by_content=true"),
            Self::PatchTarget | Self::Combined => None,
        }
    }
}

impl std::fmt::Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PatchTarget => write!(f, "patch-target"),
            Self::AppliedPatch => write!(f, "applied-patch"),
            Self::ByContent => write!(f, "by-content"),
            Self::Combined => write!(f, "combined"),
        }
    }
}

impl std::str::FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "patch-target" => Ok(Self::PatchTarget),
            "applied-patch" => Ok(Self::AppliedPatch),
            "by-content" => Ok(Self::ByContent),
            "combined" => Ok(Self::Combined),
            _ => Err(format!(
                "Invalid query mode: '{s}'. Valid options are: patch-target, applied-patch, by-content, combined"
            )),
        }
    }
}

/// Issues exactly one backend request per call
///
/// Success means a 2xx status; the body is returned unparsed because
/// validating it is the orchestrator's job. Every failure comes back as an
/// `Err`, nothing is retried or cached.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run one query for `patch`
    ///
    /// # Errors
    /// Returns `SearchError::Transport` if the request could not complete and
    /// `SearchError::Backend` for a non-2xx status
    async fn query(&self, patch: &str, mode: QueryMode) -> SearchResult<String>;
}

/// `SearchClient` speaking HTTP to the search service
#[derive(Clone, Debug)]
pub struct HttpSearchClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSearchClient {
    /// Build a client for the configured endpoint and timeout
    ///
    /// # Errors
    /// Returns `SearchError::Transport` if the HTTP client cannot be created
    pub fn new(config: &ApiConfig) -> SearchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self::with_client(http, &config.url))
    }

    /// Wrap an existing `reqwest::Client`
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Full request URL for `mode`; the legacy mode carries the patch in the query string
    fn url_for(&self, patch: &str, mode: QueryMode) -> String {
        let base = &self.base_url;
        match (mode, mode.flag()) {
            (QueryMode::Combined, _) => {
                format!("{base}/search?patch={}", urlencoding::encode(patch))
            }
            (_, Some(flag)) => format!("{base}/search?{flag}"),
            (_, None) => format!("{base}/search"),
        }
    }

    fn request(&self, patch: &str, mode: QueryMode) -> reqwest::RequestBuilder {
        let url = self.url_for(patch, mode);
        if mode == QueryMode::Combined {
            self.http.get(url)
        } else {
            self.http
                .post(url)
                .header(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; charset=utf-8"),
                )
                .body(patch.to_owned())
        }
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    #[tracing::instrument(skip(self, patch), fields(mode = %mode, patch_len = patch.len(), status))]
    async fn query(&self, patch: &str, mode: QueryMode) -> SearchResult<String> {
        let resp = self.request(patch, mode).send().await?;
        let status = resp.status();
        tracing::Span::current().record("status", status.as_u16());

        let body = resp.text().await?;
        if !status.is_success() {
            tracing::debug!(body_len = body.len(), "Backend reported failure");
            return Err(SearchError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(body_len = body.len(), "Backend query succeeded");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpSearchClient {
        HttpSearchClient::with_client(reqwest::Client::new(), "http://localhost:4567/")
    }

    #[test]
    fn test_multi_query_urls() {
        let c = client();
        assert_eq!(
            c.url_for("p", QueryMode::PatchTarget),
            "http://localhost:4567/search"
        );
        assert_eq!(
            c.url_for("p", QueryMode::AppliedPatch),
            "http://localhost:4567/search?applied_patch=true"
        );
        assert_eq!(
            c.url_for("p", QueryMode::ByContent),
            "http://localhost:4567/search?by_content=true"
        );
    }

    #[test]
    fn test_combined_url_encodes_patch() {
        let url = client().url_for("--- a\n+++ b\n", QueryMode::Combined);
        assert_eq!(
            url,
            "http://localhost:4567/search?patch=---%20a%0A%2B%2B%2B%20b%0A"
        );
    }

    #[test]
    fn test_query_mode_from_str() {
        assert_eq!(
            "applied_patch".parse::<QueryMode>().unwrap(),
            QueryMode::AppliedPatch
        );
        assert_eq!(
            "By-Content".parse::<QueryMode>().unwrap(),
            QueryMode::ByContent
        );
        assert!("everything".parse::<QueryMode>().is_err());
    }

    #[test]
    fn test_query_mode_display() {
        assert_eq!(QueryMode::PatchTarget.to_string(), "patch-target");
        assert_eq!(QueryMode::Combined.to_string(), "combined");
    }
}
