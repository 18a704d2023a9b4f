//! Directory lifecycle: parents are created on write, empty ancestors are pruned after a
//! record leaves, and stale temporary files from interrupted writes are purged.

use crate::error::{StoreError, StoreErrorExt};
use crate::security;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Marker embedded in temporary file names written by atomic puts.
pub(crate) const TMP_MARKER: &str = ".fskvtmp.";

const STALE_AFTER: Duration = Duration::from_secs(300);

/// Outcome of the empty-directory cleanup that follows a move or delete.
///
/// The primary operation has already succeeded when a `Cleanup` is returned. A prune
/// failure is reported here instead of failing the call.
#[must_use = "A cleanup may carry a prune failure"]
#[derive(Debug, Default)]
pub struct Cleanup {
    pruned: Vec<PathBuf>,
    failure: Option<PruneFailure>,
}

/// A directory that could not be inspected or removed during pruning.
#[derive(Debug)]
pub struct PruneFailure {
    pub path: PathBuf,
    pub source: io::Error,
}

impl fmt::Display for PruneFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.source)
    }
}

impl Cleanup {
    /// Directories removed, deepest first.
    #[must_use]
    pub fn pruned(&self) -> &[PathBuf] {
        &self.pruned
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&PruneFailure> {
        self.failure.as_ref()
    }

    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failure.is_none()
    }

    /// Treats a prune failure as an error.
    ///
    /// # Errors
    /// Returns [`StoreError::Prune`] if an ancestor directory could not be cleaned up.
    pub fn into_result(self) -> Result<Vec<PathBuf>, StoreError> {
        match self.failure {
            None => Ok(self.pruned),
            Some(failure) => Err(StoreError::Prune {
                message: failure.to_string().into(),
                context: Some(format!("{} directories pruned before failing", self.pruned.len()).into()),
            }),
        }
    }
}

/// Summary of a temporary file purge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub removed: usize,
    pub failed: usize,
}

/// Creates every missing parent directory of `file`.
pub(crate) fn ensure_parent(file: &Path) -> Result<(), StoreError> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)
            .context(format!("Failed to create directories for {}", file.display()))?;
    }
    Ok(())
}

/// Removes the now-empty ancestor directories of a departed key, deepest first.
///
/// Stops at the first ancestor that still holds entries and never touches `root`.
pub(crate) fn prune(root: &Path, segments: &[&str]) -> Cleanup {
    let mut cleanup = Cleanup::default();

    for dir in security::ancestor_dirs(root, segments) {
        match is_empty_dir(&dir) {
            Ok(true) => {},
            Ok(false) => break,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(source) => {
                warn!(path = %dir.display(), error = %source, "Failed to inspect directory");
                cleanup.failure = Some(PruneFailure { path: dir, source });
                break;
            },
        }

        match fs::remove_dir(&dir) {
            Ok(()) => {
                debug!(path = %dir.display(), "Pruned empty directory");
                cleanup.pruned.push(dir);
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {},
            Err(source) => {
                warn!(path = %dir.display(), error = %source, "Failed to prune directory");
                cleanup.failure = Some(PruneFailure { path: dir, source });
                break;
            },
        }
    }

    cleanup
}

fn is_empty_dir(dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

/// Removes stale temporary files under `root`, then any directories left empty.
pub(crate) fn purge_tmp(root: &Path, extension: &str) -> PurgeReport {
    let report = remove_stale(root, extension, SystemTime::now(), STALE_AFTER);
    if report.removed > 0 || report.failed > 0 {
        info!(removed = report.removed, failed = report.failed, "Cleaned up temporary files");
    }
    report
}

fn remove_stale(root: &Path, extension: &str, now: SystemTime, threshold: Duration) -> PurgeReport {
    let suffix = format!(".{extension}");
    let mut report = PurgeReport::default();

    // Children come before their directory, so emptied directories cascade upwards.
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let Ok(entry) = entry else { continue };
        let path = entry.path();

        if entry.file_type().is_dir() {
            if fs::remove_dir(path).is_ok() {
                debug!(dir = %path.display(), "Removed empty directory");
            }
            continue;
        }
        if !is_abandoned_write(&entry, &suffix, now, threshold) {
            continue;
        }

        match fs::remove_file(path) {
            Ok(()) => {
                debug!(file = %path.display(), "Removed stale temporary file");
                report.removed += 1;
            },
            Err(source) => {
                warn!(file = %path.display(), %source, "Stale temporary file could not be removed");
                report.failed += 1;
            },
        }
    }

    report
}

/// A temporary file from an atomic put that was never renamed into place.
///
/// Files with an unknown age count as stale.
fn is_abandoned_write(entry: &DirEntry, suffix: &str, now: SystemTime, threshold: Duration) -> bool {
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    if !name.contains(TMP_MARKER) || name.ends_with(suffix) {
        return false;
    }

    let age = entry
        .metadata()
        .ok()
        .and_then(|meta| meta.modified().ok())
        .and_then(|modified| now.duration_since(modified).ok());
    age.is_none_or(|age| age > threshold)
}
