//! Normalized result model shared by every backend protocol shape
//!
//! Backend payloads are decoded here and nowhere else. Ordering is the
//! backend's: nothing is re-sorted or de-duplicated.

use crate::error::{SearchError, SearchResult};
use crate::searching::client::QueryMode;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;

/// One candidate location reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Location in the indexed corpus
    pub path: String,
    /// Backend-defined relevance, kept exactly as sent
    pub score: Number,
}

impl MatchResult {
    pub fn new(path: impl Into<String>, score: impl Into<Number>) -> Self {
        Self {
            path: path.into(),
            score: score.into(),
        }
    }
}

/// Matches per patch chunk, index-aligned with the patch's hunks
pub type ChunkResults = Vec<Vec<MatchResult>>;

/// Matches per file touched by the patch
///
/// A file missing from the map means the backend found nothing for it.
pub type FileResults = BTreeMap<String, ChunkResults>;

/// Aggregate result of one successful submission
///
/// Built once from the backend payloads and never modified afterwards; the
/// next submission produces a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultModel {
    /// Files the patch could apply to
    pub patch_targets: FileResults,
    /// Locations where the patch's change already appears
    pub applied_patch: FileResults,
    /// Copies of the patch content regardless of file identity
    pub by_content: ChunkResults,
}

impl ResultModel {
    /// Assemble the model from already decoded payloads
    pub const fn assemble(
        patch_targets: FileResults,
        applied_patch: FileResults,
        by_content: ChunkResults,
    ) -> Self {
        Self {
            patch_targets,
            applied_patch,
            by_content,
        }
    }

    /// Total number of matches across all three sections
    pub fn match_count(&self) -> usize {
        let in_files = |files: &FileResults| -> usize {
            files.values().flatten().map(Vec::len).sum()
        };
        in_files(&self.patch_targets)
            .saturating_add(in_files(&self.applied_patch))
            .saturating_add(self.by_content.iter().map(Vec::len).sum())
    }
}

/// Externally observable result of one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(ResultModel),
    Failure(SearchError),
}

impl Outcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub const fn result_model(&self) -> Option<&ResultModel> {
        match self {
            Self::Success(model) => Some(model),
            Self::Failure(_) => None,
        }
    }

    pub const fn error(&self) -> Option<&SearchError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }

    /// The message to show the user for a failure
    pub fn failure_reason(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }
}

impl From<SearchResult<ResultModel>> for Outcome {
    fn from(result: SearchResult<ResultModel>) -> Self {
        match result {
            Ok(model) => Self::Success(model),
            Err(error) => Self::Failure(error),
        }
    }
}

/// Per-chunk payload; older backends send one flat list instead of one
/// list per chunk
#[derive(Deserialize)]
#[serde(untagged)]
enum ChunkPayload {
    Chunked(ChunkResults),
    Flat(Vec<MatchResult>),
}

impl ChunkPayload {
    fn into_chunks(self) -> ChunkResults {
        match self {
            Self::Chunked(chunks) => chunks,
            Self::Flat(matches) => vec![matches],
        }
    }
}

/// Single-query payload: either the per-file map or a bare match list
#[derive(Deserialize)]
#[serde(untagged)]
enum CombinedPayload {
    Files(BTreeMap<String, ChunkPayload>),
    Matches(ChunkPayload),
}

fn parse<'a, T: Deserialize<'a>>(mode: QueryMode, body: &'a str) -> SearchResult<T> {
    serde_json::from_str(body).map_err(|e| SearchError::Protocol {
        mode,
        detail: e.to_string(),
    })
}

fn normalize_files(files: BTreeMap<String, ChunkPayload>) -> FileResults {
    files
        .into_iter()
        .map(|(file, payload)| (file, payload.into_chunks()))
        .collect()
}

/// Decode a patch-target or applied-patch body
///
/// # Errors
/// Returns `SearchError::Protocol` if the body is not a file-to-matches map
pub fn decode_file_results(mode: QueryMode, body: &str) -> SearchResult<FileResults> {
    parse(mode, body).map(normalize_files)
}

/// Decode a by-content body
///
/// # Errors
/// Returns `SearchError::Protocol` if the body is not a match list
pub fn decode_chunk_results(mode: QueryMode, body: &str) -> SearchResult<ChunkResults> {
    parse(mode, body).map(ChunkPayload::into_chunks)
}

/// Decode the single-query (legacy) body into a complete model
///
/// A file map lands in `patch_targets`, a bare match list in `by_content`.
///
/// # Errors
/// Returns `SearchError::Protocol` if the body matches neither layout
pub fn decode_combined(body: &str) -> SearchResult<ResultModel> {
    let model = match parse(QueryMode::Combined, body)? {
        CombinedPayload::Files(files) => ResultModel {
            patch_targets: normalize_files(files),
            ..ResultModel::default()
        },
        CombinedPayload::Matches(matches) => ResultModel {
            by_content: matches.into_chunks(),
            ..ResultModel::default()
        },
    };
    Ok(model)
}
