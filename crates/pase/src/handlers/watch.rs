//! `pase watch`: resubmit a patch file whenever its content changes
//!
//! Each change is a new submission. Edits arriving faster than the backend
//! answers supersede one another and only the latest outcome is rendered.

use crate::input::read_patch_file;
use crate::render::Renderer;
use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, DebouncedEventKind, Debouncer, new_debouncer};
use pase_search::{SearchSession, SearchState};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Debounced change notifications for a single patch file
///
/// Watches the file's parent directory; events for sibling files are dropped.
struct PatchWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    changes: mpsc::UnboundedReceiver<()>,
}

impl PatchWatcher {
    fn new(path: &Path, debounce: Duration) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(ToOwned::to_owned)
            .with_context(|| format!("'{}' does not name a patch file", path.display()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, changes) = mpsc::unbounded_channel();
        let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let touched = events.iter().any(|event| {
                        matches!(event.kind, DebouncedEventKind::Any)
                            && event.path.file_name() == Some(file_name.as_os_str())
                    });
                    if touched && tx.send(()).is_err() {
                        tracing::debug!("Watch loop has ended, dropping change");
                    }
                }
                Err(e) => tracing::error!("File watcher error: {e}"),
            }
        })
        .context("Failed to create file watcher")?;

        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory '{}'", dir.display()))?;

        Ok(Self {
            _debouncer: debouncer,
            changes,
        })
    }
}

/// Submit `path` now and again after every debounced change, until `stop` completes
///
/// # Errors
/// Returns an error if the file cannot be watched or an outcome cannot be
/// written to `out`
pub async fn run(
    session: &SearchSession,
    path: &Path,
    debounce: Duration,
    renderer: &dyn Renderer,
    out: &mut dyn Write,
    stop: impl Future<Output = ()>,
) -> Result<()> {
    let mut watcher = PatchWatcher::new(path, debounce)?;
    let mut updates = session.subscribe();
    let mut last_patch: Option<String> = None;
    tokio::pin!(stop);

    tracing::info!(path = %path.display(), ?debounce, "Watching patch file");
    resubmit_if_changed(session, path, &mut last_patch);

    loop {
        tokio::select! {
            () = &mut stop => break,
            Some(()) = watcher.changes.recv() => {
                resubmit_if_changed(session, path, &mut last_patch);
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if let SearchState::Resolved(outcome) = &snapshot.state {
                    writeln!(out, "== submission {} ==", snapshot.generation)?;
                    renderer.render(outcome, out)?;
                    out.flush()?;
                }
            }
        }
    }

    session.shutdown();
    Ok(())
}

/// Saving a file without changing it is not a new submission
fn resubmit_if_changed(session: &SearchSession, path: &Path, last_patch: &mut Option<String>) {
    let patch = match read_patch_file(path) {
        Ok(patch) => patch,
        Err(e) => {
            tracing::warn!("{e:#}");
            return;
        }
    };
    if last_patch.as_deref() == Some(patch.as_str()) {
        return;
    }

    tracing::debug!(patch_len = patch.len(), "Patch changed, resubmitting");
    // Detached; the session discards it once superseded
    drop(session.submit(patch.clone()));
    *last_patch = Some(patch);
}
