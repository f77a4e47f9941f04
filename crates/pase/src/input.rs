//! Where the patch text comes from

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Source of the patch to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchInput {
    File(PathBuf),
    Stdin,
    Inline(String),
}

impl PatchInput {
    /// Inline text wins; a missing path or `-` means standard input
    pub fn from_args(file: Option<PathBuf>, inline: Option<String>) -> Self {
        match (inline, file) {
            (Some(text), _) => Self::Inline(text),
            (None, Some(path)) if path.as_os_str() != "-" => Self::File(path),
            (None, _) => Self::Stdin,
        }
    }

    /// Read the whole patch; the text is passed on unchanged, even when empty
    ///
    /// # Errors
    /// Returns an error if the file or standard input cannot be read
    pub fn read(&self) -> Result<String> {
        match self {
            Self::File(path) => read_patch_file(path),
            Self::Stdin => {
                let mut patch = String::new();
                std::io::stdin()
                    .read_to_string(&mut patch)
                    .context("Failed to read patch from standard input")?;
                Ok(patch)
            }
            Self::Inline(text) => Ok(text.clone()),
        }
    }
}

/// Read a patch file
///
/// # Errors
/// Returns an error naming the file if it cannot be read as UTF-8 text
pub fn read_patch_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read patch file '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_args() {
        assert_eq!(
            PatchInput::from_args(Some("fix.patch".into()), None),
            PatchInput::File("fix.patch".into())
        );
        assert_eq!(
            PatchInput::from_args(Some("-".into()), None),
            PatchInput::Stdin
        );
        assert_eq!(PatchInput::from_args(None, None), PatchInput::Stdin);
        assert_eq!(
            PatchInput::from_args(None, Some(String::new())),
            PatchInput::Inline(String::new())
        );
    }

    #[test]
    fn test_file_is_read_verbatim() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"--- a/x\n+++ b/x\n\n").unwrap();

        let patch = PatchInput::File(file.path().to_path_buf()).read().unwrap();
        assert_eq!(patch, "--- a/x\n+++ b/x\n\n");
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let err = PatchInput::File("/no/such/fix.patch".into())
            .read()
            .unwrap_err();
        assert!(err.to_string().contains("/no/such/fix.patch"));
    }
}
