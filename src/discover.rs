//! Project discovery: locate ecosystem marker files under configured roots.

use crate::ecosystem::{non_descend_dirs, Ecosystem};
use crate::fsops;
use crate::project::Project;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Result of discovering one ecosystem across a set of roots.
///
/// A failing root is recorded here and never aborts the remaining roots.
#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    pub projects: Vec<Project>,
    /// (root, error text) for roots that could not be enumerated.
    pub root_errors: Vec<(PathBuf, String)>,
}

/// Outcome of validating a prospective scan directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Usable, with an approximate marker count.
    Valid(String),
    /// Readable but a bounded quick-scan found no markers at all.
    Warning(String),
    /// Missing, not a directory, or unreadable.
    Invalid(String),
}

/// Walks root directories looking for ecosystem marker files.
#[derive(Debug, Clone)]
pub struct Discoverer {
    max_depth: usize,
    quick_scan_cap: usize,
}

impl Discoverer {
    pub fn new(max_depth: usize, quick_scan_cap: usize) -> Self {
        Self {
            max_depth,
            quick_scan_cap,
        }
    }

    /// Discover every `ecosystem` project under `roots`.
    ///
    /// Each file named like the ecosystem's marker makes its parent directory
    /// a project root; multiple markers in one directory collapse to one
    /// Project, while markers in nested subdirectories yield distinct
    /// Projects. Order is deterministic within a root (sorted listing).
    pub fn discover(&self, roots: &[PathBuf], ecosystem: Ecosystem) -> DiscoveryOutcome {
        let mut outcome = DiscoveryOutcome::default();

        for root in roots {
            match self.discover_root(root, ecosystem) {
                Ok(mut projects) => outcome.projects.append(&mut projects),
                Err(message) => {
                    tracing::warn!(root = %root.display(), %message, "root enumeration failed");
                    outcome.root_errors.push((root.clone(), message));
                }
            }
        }

        outcome
    }

    fn discover_root(&self, root: &Path, ecosystem: Ecosystem) -> Result<Vec<Project>, String> {
        std::fs::read_dir(root).map_err(|e| e.to_string())?;

        let markers: HashSet<&str> = ecosystem.marker_files().iter().copied().collect();
        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        let mut projects = Vec::new();

        let walker = WalkDir::new(root)
            .max_depth(self.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || should_descend(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable entry during discovery");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !markers.contains(name) {
                continue;
            }

            let Some(parent) = entry.path().parent() else {
                continue;
            };
            if seen_dirs.insert(parent.to_path_buf()) {
                projects.push(Project::new(parent.to_path_buf(), ecosystem));
            }
        }

        Ok(projects)
    }

    /// Validate a directory as a prospective scan root.
    ///
    /// Counts marker files of every known ecosystem within a bounded
    /// quick-scan; the count is approximate by design.
    pub fn validate(&self, dir: &Path) -> Validation {
        if !dir.exists() {
            return Validation::Invalid(format!("'{}' does not exist", dir.display()));
        }
        if !dir.is_dir() {
            return Validation::Invalid(format!("'{}' is not a directory", dir.display()));
        }

        let entries = match fsops::quick_scan(dir, self.quick_scan_cap) {
            Ok(entries) => entries,
            Err(e) => return Validation::Invalid(format!("'{}' is not readable: {e}", dir.display())),
        };

        let all_markers: HashSet<&str> = Ecosystem::ALL
            .iter()
            .flat_map(|e| e.marker_files().iter().copied())
            .collect();

        let marker_count = entries
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .filter(|name| all_markers.contains(name))
            .count();

        if marker_count == 0 {
            Validation::Warning(format!(
                "no project markers found in the first {} entries of '{}'",
                self.quick_scan_cap,
                dir.display()
            ))
        } else {
            Validation::Valid(format!(
                "found about {} project marker(s) under '{}'",
                marker_count,
                dir.display()
            ))
        }
    }
}

impl Default for Discoverer {
    fn default() -> Self {
        Self::new(10, 2000)
    }
}

/// Hidden entries and cache/bundle directories are never descended into.
fn should_descend(entry: &DirEntry) -> bool {
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    if entry.file_type().is_dir() && non_descend_dirs().contains(&name) {
        return false;
    }
    true
}
