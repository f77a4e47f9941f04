//! `pase search`: one submission, one rendered outcome

use super::exit_code;
use crate::input::PatchInput;
use crate::render::Renderer;
use anyhow::{Result, bail};
use pase_search::SearchSession;
use std::io::Write;
use std::process::ExitCode;

/// Read the patch, submit it and render the outcome to `out`
///
/// # Errors
/// Returns an error if the patch cannot be read, the submission was
/// abandoned, or the outcome cannot be written
pub async fn run(
    session: &SearchSession,
    input: &PatchInput,
    renderer: &dyn Renderer,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let patch = input.read()?;
    tracing::debug!(patch_len = patch.len(), "Submitting patch");

    let Some(outcome) = session.submit_and_wait(patch).await else {
        bail!("Search was abandoned before it completed");
    };

    renderer.render(&outcome, out)?;
    out.flush()?;
    Ok(exit_code(&outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::TextRenderer;
    use pase_search::test_mocks::MockSearchClient;
    use pase_search::{QueryMode, QueryPlan, ResponseShape, SearchError, SearchOrchestrator};
    use std::sync::Arc;

    fn session(client: MockSearchClient) -> SearchSession {
        SearchSession::new(SearchOrchestrator::new(
            Arc::new(client),
            QueryPlan::for_shape(ResponseShape::MultiQuery),
        ))
    }

    #[tokio::test]
    async fn test_success_renders_results_and_exits_zero() {
        let client = MockSearchClient::with_empty_payloads().with_response(
            QueryMode::PatchTarget,
            r#"{"file.go": [[{"path":"file.go","score":12}]]}"#,
        );
        let mut out = Vec::new();

        let code = run(
            &session(client),
            &PatchInput::Inline("--- a/file.go\n+++ b/file.go\n".to_string()),
            &TextRenderer,
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        assert!(String::from_utf8(out).unwrap().contains("file.go (score: 12)"));
    }

    #[tokio::test]
    async fn test_failure_renders_reason_and_exits_one() {
        let client = MockSearchClient::new().with_failure(
            QueryMode::PatchTarget,
            SearchError::Backend {
                status: 400,
                body: "bad patch".to_string(),
            },
        );
        let mut out = Vec::new();

        let code = run(
            &session(client),
            &PatchInput::Inline("garbage".to_string()),
            &TextRenderer,
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(String::from_utf8(out).unwrap(), "Error: bad patch\n");
    }
}
