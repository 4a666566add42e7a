//! Scan-result data model.

use crate::ecosystem::Ecosystem;
use std::path::PathBuf;
use std::time::SystemTime;

/// A discovered project. Owned by the scan result that produced it;
/// rescans build fresh records instead of mutating old ones.
#[derive(Debug, Clone)]
pub struct Project {
    /// Stable handle derived from the ecosystem tag and root path.
    pub id: String,
    /// Display name (the root directory's file name).
    pub name: String,
    /// Directory that contained the ecosystem marker at discovery time.
    pub root: PathBuf,
    pub ecosystem: Ecosystem,
    /// Last-modified time of the root directory, if readable.
    pub modified: Option<SystemTime>,
    /// Declared dependencies, best-effort.
    pub dependencies: Vec<Dependency>,
    /// Cumulative size of the project's cache subtrees, in bytes.
    pub cache_size: u64,
}

impl Project {
    pub fn new(root: PathBuf, ecosystem: Ecosystem) -> Self {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        let modified = root.metadata().and_then(|m| m.modified()).ok();

        Self {
            id: format!("{}:{}", ecosystem.id(), root.display()),
            name,
            root,
            ecosystem,
            modified,
            dependencies: Vec::new(),
            cache_size: 0,
        }
    }
}

/// A declared dependency of one project. No identity beyond (name, version)
/// within its project; never persisted independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    /// Ecosystem-specific version string; "unknown" when not declared.
    pub version: String,
    /// Best-effort size in bytes; zero when not resolvable.
    pub size: u64,
    /// On-disk cache location for this dependency, when one is known.
    pub cache_path: Option<PathBuf>,
    /// True if the owning project no longer resolves it.
    pub orphaned: bool,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            size: 0,
            cache_path: None,
            orphaned: false,
        }
    }
}

/// A filesystem path judged to be a cache/build artifact, used for global
/// cross-project accounting. Ownerless, keyed by path.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub ecosystem: Ecosystem,
    pub size: u64,
    pub last_accessed: Option<SystemTime>,
    /// True if no live project references this path.
    pub orphaned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_is_stable_per_root_and_ecosystem() {
        let a = Project::new(PathBuf::from("/work/app"), Ecosystem::Go);
        let b = Project::new(PathBuf::from("/work/app"), Ecosystem::Go);
        let c = Project::new(PathBuf::from("/work/app"), Ecosystem::Node);

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn project_name_is_root_file_name() {
        let p = Project::new(PathBuf::from("/work/my-service"), Ecosystem::Node);
        assert_eq!(p.name, "my-service");
    }

    #[test]
    fn dependency_defaults_are_best_effort() {
        let d = Dependency::new("left-pad", "1.3.0");
        assert_eq!(d.size, 0);
        assert!(d.cache_path.is_none());
        assert!(!d.orphaned);
    }
}
