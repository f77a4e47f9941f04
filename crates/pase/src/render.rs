//! Writes search outcomes to the terminal

use pase_search::{ChunkResults, FileResults, MatchResult, Outcome};
use serde_json::Number;
use std::io::{self, Write};

const NO_RESULTS: &str = "no results found";

/// Presents one outcome; a failure is shown instead of any result, never
/// alongside one
pub trait Renderer {
    /// Write `outcome` to `out`
    ///
    /// # Errors
    /// Returns any error from writing to `out`
    fn render(&self, outcome: &Outcome, out: &mut dyn Write) -> io::Result<()>;
}

/// Plain text sections, one line per match
pub struct TextRenderer;

impl TextRenderer {
    fn section(out: &mut dyn Write, title: &str) -> io::Result<()> {
        writeln!(out, "{title}")?;
        writeln!(out, "{}", "-".repeat(title.len()))
    }

    fn files(out: &mut dyn Write, files: &FileResults) -> io::Result<()> {
        if files.is_empty() {
            return writeln!(out, "  {NO_RESULTS}");
        }
        for (file, chunks) in files {
            writeln!(out, "  {file}:")?;
            Self::chunks(out, chunks, 4)?;
        }
        Ok(())
    }

    /// A single chunk is listed directly, several get numbered headers
    fn chunks(out: &mut dyn Write, chunks: &ChunkResults, indent: usize) -> io::Result<()> {
        let pad = " ".repeat(indent);
        match chunks.as_slice() {
            [] => writeln!(out, "{pad}{NO_RESULTS}"),
            [only] => Self::matches(out, only, indent),
            many => {
                for (number, chunk) in (1..).zip(many) {
                    writeln!(out, "{pad}chunk #{number}:")?;
                    Self::matches(out, chunk, indent.saturating_add(2))?;
                }
                Ok(())
            }
        }
    }

    fn matches(out: &mut dyn Write, matches: &[MatchResult], indent: usize) -> io::Result<()> {
        let pad = " ".repeat(indent);
        if matches.is_empty() {
            return writeln!(out, "{pad}{NO_RESULTS}");
        }
        for m in matches {
            writeln!(out, "{pad}{} (score: {})", m.path, display_score(&m.score))?;
        }
        Ok(())
    }
}

/// Integers print as sent, fractional scores are rounded to a whole number
fn display_score(score: &Number) -> String {
    match score.as_f64() {
        Some(value) if score.is_f64() => format!("{value:.0}"),
        _ => score.to_string(),
    }
}

impl Renderer for TextRenderer {
    fn render(&self, outcome: &Outcome, out: &mut dyn Write) -> io::Result<()> {
        let model = match outcome {
            Outcome::Failure(error) => return writeln!(out, "Error: {error}"),
            Outcome::Success(model) => model,
        };

        Self::section(out, "Potential patch targets")?;
        Self::files(out, &model.patch_targets)?;
        writeln!(out)?;

        Self::section(out, "Potentially already fixed code")?;
        Self::files(out, &model.applied_patch)?;
        writeln!(out)?;

        Self::section(out, "Potential patch copies")?;
        Self::chunks(out, &model.by_content, 2)
    }
}

/// The result model as pretty-printed JSON
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, outcome: &Outcome, out: &mut dyn Write) -> io::Result<()> {
        match outcome {
            Outcome::Success(model) => serde_json::to_writer_pretty(&mut *out, model)?,
            Outcome::Failure(error) => serde_json::to_writer_pretty(
                &mut *out,
                &serde_json::json!({ "error": error.to_string(), "kind": error.kind() }),
            )?,
        }
        writeln!(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pase_search::{ResultModel, SearchError};

    fn render_to_string(renderer: &dyn Renderer, outcome: &Outcome) -> String {
        let mut out = Vec::new();
        renderer.render(outcome, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn sample_model() -> ResultModel {
        let mut model = ResultModel::default();
        model.patch_targets.insert(
            "file.go".to_string(),
            vec![vec![MatchResult::new(
                "pkg/file.go",
                Number::from_f64(12.4).unwrap(),
            )]],
        );
        model.applied_patch.insert(
            "main.c".to_string(),
            vec![vec![], vec![MatchResult::new("src/main.c", 3)]],
        );
        model
    }

    #[test]
    fn test_text_sections_and_matches() {
        let text = render_to_string(&TextRenderer, &Outcome::Success(sample_model()));

        assert!(text.starts_with("Potential patch targets\n"));
        assert!(text.contains("  file.go:\n    pkg/file.go (score: 12)\n"));
        assert!(text.contains("Potentially already fixed code"));
        assert!(text.contains("    chunk #1:\n      no results found\n"));
        assert!(text.contains("    chunk #2:\n      src/main.c (score: 3)\n"));
        assert!(text.ends_with("Potential patch copies\n----------------------\n  no results found\n"));
    }

    #[test]
    fn test_text_empty_model_lists_every_section() {
        let text = render_to_string(&TextRenderer, &Outcome::Success(ResultModel::default()));
        assert_eq!(text.matches(NO_RESULTS).count(), 3);
    }

    #[test]
    fn test_text_failure_shows_only_the_reason() {
        let outcome = Outcome::Failure(SearchError::Backend {
            status: 400,
            body: "bad patch".to_string(),
        });
        assert_eq!(render_to_string(&TextRenderer, &outcome), "Error: bad patch\n");
    }

    #[test]
    fn test_json_success_uses_camel_case() {
        let json = render_to_string(&JsonRenderer, &Outcome::Success(sample_model()));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["patchTargets"]["file.go"][0][0]["path"], "pkg/file.go");
        assert_eq!(value["appliedPatch"]["main.c"][0], serde_json::json!([]));
        assert_eq!(value["byContent"], serde_json::json!([]));
    }

    #[test]
    fn test_json_keeps_integer_scores_integral() {
        let json = render_to_string(&JsonRenderer, &Outcome::Success(sample_model()));
        assert!(json.contains(r#""score": 3"#));
        assert!(!json.contains("3.0"));
        assert!(json.contains(r#""score": 12.4"#));
    }

    #[test]
    fn test_display_score() {
        assert_eq!(display_score(&Number::from(12)), "12");
        assert_eq!(display_score(&Number::from(-4)), "-4");
        assert_eq!(display_score(&Number::from_f64(12.4).unwrap()), "12");
        assert_eq!(display_score(&Number::from_f64(0.9).unwrap()), "1");
    }

    #[test]
    fn test_json_failure() {
        let outcome = Outcome::Failure(SearchError::Transport {
            message: "connection refused".to_string(),
        });
        let value: serde_json::Value =
            serde_json::from_str(&render_to_string(&JsonRenderer, &outcome)).unwrap();

        assert_eq!(value["error"], "connection refused");
        assert_eq!(value["kind"], "transport");
    }
}
