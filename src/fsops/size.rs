//! Recursive directory size measurement.
//!
//! `tree_size` is the authoritative measurement used for cleanup accounting;
//! `quick_scan` is a bounded sampling pass used only for validation
//! heuristics and never for size totals.

use crate::error::SizeError;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Sum the sizes of every regular file reachable from `dir`.
///
/// Hidden entries are skipped. Per-entry traversal errors (unreadable
/// subdirectory, broken symlink) are logged and skipped; only a root that
/// cannot be listed at all is an error.
pub fn tree_size(dir: &Path) -> Result<u64, SizeError> {
    // Surface an unreadable root as a real error instead of a silent zero.
    std::fs::read_dir(dir).map_err(|e| SizeError::EnumerationFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut total = 0u64;
    for entry in WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    match entry.metadata() {
                        Ok(meta) => total += meta.len(),
                        Err(e) => {
                            tracing::debug!(path = %entry.path().display(), error = %e, "skipping unreadable entry");
                        }
                    }
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable subtree entry");
            }
        }
    }

    Ok(total)
}

/// Like [`tree_size`] but never fails: an unreadable root counts as zero.
/// Used when measuring candidate cache subtrees before deletion.
pub fn tree_size_or_zero(dir: &Path) -> u64 {
    match tree_size(dir) {
        Ok(size) => size,
        Err(e) => {
            tracing::debug!(error = %e, "size measurement degraded to zero");
            0
        }
    }
}

/// Bounded sampling of a directory tree: collects at most `cap` non-hidden
/// entry paths. Estimation only; cleanup decisions never consume this.
pub fn quick_scan(dir: &Path, cap: usize) -> Result<Vec<PathBuf>, SizeError> {
    std::fs::read_dir(dir).map_err(|e| SizeError::EnumerationFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let entries = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|e| e.ok())
        .skip(1) // the root itself
        .take(cap)
        .map(|e| e.into_path())
        .collect();

    Ok(entries)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
