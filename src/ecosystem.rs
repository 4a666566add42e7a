//! The closed set of supported ecosystems and their per-tag strategy table.
//!
//! Every place that needs ecosystem-specific behavior (discovery, sizing,
//! dependency inspection, cleanup) dispatches through this table, so adding
//! an ecosystem means adding one variant and one table entry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported toolchain/package-manager ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// Go modules (`go.mod`).
    Go,
    /// Node.js / npm (`package.json`).
    Node,
    /// Python with pip requirements (`requirements.txt`).
    Python,
    /// Gradle builds (`build.gradle` / `build.gradle.kts`).
    Gradle,
}

/// How dependencies are enumerated for an ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencySource {
    /// Ask the toolchain itself (e.g. `go list -m all`).
    Toolchain,
    /// Read one or more well-known manifest files directly.
    Manifest,
}

impl Ecosystem {
    /// All supported ecosystems, in scan order.
    pub const ALL: [Ecosystem; 4] = [
        Ecosystem::Go,
        Ecosystem::Node,
        Ecosystem::Python,
        Ecosystem::Gradle,
    ];

    /// Stable identifier used in CLI arguments and config files.
    pub fn id(&self) -> &'static str {
        match self {
            Ecosystem::Go => "go",
            Ecosystem::Node => "node",
            Ecosystem::Python => "python",
            Ecosystem::Gradle => "gradle",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Ecosystem::Go => "Go modules",
            Ecosystem::Node => "Node/npm",
            Ecosystem::Python => "Python/pip",
            Ecosystem::Gradle => "Gradle",
        }
    }

    /// Parse an identifier as produced by [`Ecosystem::id`].
    pub fn from_id(id: &str) -> Option<Ecosystem> {
        Ecosystem::ALL.into_iter().find(|e| e.id() == id)
    }

    /// Marker filenames whose presence identifies a project root.
    pub fn marker_files(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::Go => &["go.mod"],
            Ecosystem::Node => &["package.json"],
            Ecosystem::Python => &["requirements.txt"],
            Ecosystem::Gradle => &["build.gradle", "build.gradle.kts"],
        }
    }

    /// Project-local cache/build directory names, relative to the project root.
    pub fn cache_dirs(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::Go => &[],
            Ecosystem::Node => &["node_modules"],
            Ecosystem::Python => &["venv", ".venv"],
            Ecosystem::Gradle => &["build", ".gradle"],
        }
    }

    /// Name of a cache directory that recurs throughout the source tree,
    /// one per source subdirectory, if the ecosystem has one.
    pub fn nested_cache_dir(&self) -> Option<&'static str> {
        match self {
            Ecosystem::Python => Some("__pycache__"),
            _ => None,
        }
    }

    /// The toolchain executable backing this ecosystem.
    pub fn tool(&self) -> &'static str {
        match self {
            Ecosystem::Go => "go",
            Ecosystem::Node => "npm",
            Ecosystem::Python => "pip",
            Ecosystem::Gradle => "gradle",
        }
    }

    /// Arguments for the tool's version query.
    pub fn version_args(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::Go => &["version"],
            Ecosystem::Node => &["--version"],
            Ecosystem::Python => &["--version"],
            Ecosystem::Gradle => &["--version"],
        }
    }

    /// Arguments for the toolchain's global-cache purge, if one exists.
    pub fn global_purge_args(&self) -> Option<&'static [&'static str]> {
        match self {
            Ecosystem::Go => Some(&["clean", "-modcache"]),
            Ecosystem::Node => Some(&["cache", "clean", "--force"]),
            Ecosystem::Python => Some(&["cache", "purge"]),
            Ecosystem::Gradle => None,
        }
    }

    /// Arguments for the toolchain's unused-dependency prune, if one exists.
    pub fn prune_args(&self) -> Option<&'static [&'static str]> {
        match self {
            Ecosystem::Go => Some(&["mod", "tidy"]),
            Ecosystem::Node => Some(&["prune"]),
            Ecosystem::Python => None,
            Ecosystem::Gradle => None,
        }
    }

    /// The user-wide cache location for this ecosystem, used for global
    /// cross-project accounting.
    pub fn global_cache_dir(&self, home: &std::path::Path) -> std::path::PathBuf {
        match self {
            Ecosystem::Go => home.join("go/pkg/mod"),
            Ecosystem::Node => home.join(".npm"),
            Ecosystem::Python => home.join(".cache/pip"),
            Ecosystem::Gradle => home.join(".gradle/caches"),
        }
    }

    /// How dependencies are listed for this ecosystem.
    pub fn dependency_source(&self) -> DependencySource {
        match self {
            Ecosystem::Go => DependencySource::Toolchain,
            Ecosystem::Node | Ecosystem::Python | Ecosystem::Gradle => DependencySource::Manifest,
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Directory names that discovery never descends into: VCS metadata plus
/// every cache directory any ecosystem owns. A marker file inside a cache
/// tree is a vendored copy, not a project of its own.
pub fn non_descend_dirs() -> &'static [&'static str] {
    &[
        ".git",
        "node_modules",
        "venv",
        ".venv",
        "__pycache__",
        "build",
        ".gradle",
        "target",
        "vendor",
    ]
}
