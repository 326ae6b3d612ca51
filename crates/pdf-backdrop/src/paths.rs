//! Filesystem helpers and temporary artifacts

use crate::types::*;
use log::{debug, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Whether two paths name the same file.
///
/// Symlinks are resolved when both paths exist; otherwise the absolute
/// forms are compared.
pub(crate) fn paths_equal(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => match (std::path::absolute(a), std::path::absolute(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => a == b,
        },
    }
}

/// `dir/stem.pdf` + `_suffix` → `dir/stem_suffix.pdf`
pub(crate) fn with_stem_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    if let Some(extension) = path.extension() {
        name.push(".");
        name.push(extension);
    }
    path.with_file_name(name)
}

/// Whether the file stem already ends with `suffix` (ASCII case-insensitive)
pub(crate) fn stem_ends_with(path: &Path, suffix: &str) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_ascii_lowercase().ends_with(&suffix.to_ascii_lowercase()))
        .unwrap_or(false)
}

pub(crate) fn copy_file(from: &Path, to: &Path) -> Result<()> {
    std::fs::copy(from, to).map_err(MergeError::filesystem(to))?;
    Ok(())
}

/// Delete a file; a file that is already gone is not an error
pub(crate) fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MergeError::filesystem(path)(e)),
    }
}

/// Transient files owned by one job, deleted when the guard is dropped
#[derive(Debug, Default)]
pub(crate) struct TemporaryArtifacts {
    paths: Vec<PathBuf>,
}

impl TemporaryArtifacts {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }
}

impl Drop for TemporaryArtifacts {
    fn drop(&mut self) {
        for path in self.paths.drain(..).rev() {
            match remove_if_exists(&path) {
                Ok(()) => debug!("Removed temporary file {}", path.display()),
                Err(e) => warn!("Failed to remove temporary file: {}", e),
            }
        }
    }
}
