use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Root configuration structure.
///
/// The scan-root set and per-tool overrides are the only state that survives
/// process restarts; everything else is derived per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub roots: ScanRootSet,
    pub tools: ToolConfig,
    pub scan: ScanSettings,
}

/// Ordered, deduplicated set of root directories to scan.
///
/// Mutated only by explicit add/remove; insertion order is preserved so
/// scan output stays stable across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanRootSet {
    paths: Vec<PathBuf>,
}

impl ScanRootSet {
    /// Add a root. Returns false if it was already present.
    pub fn add(&mut self, path: PathBuf) -> bool {
        if self.paths.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    /// Remove a root. Returns false if it was not present.
    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.paths.len();
        self.paths.retain(|p| p != path);
        self.paths.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Per-tool path overrides and the auto-detect switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// When true, tools without an override are resolved automatically.
    pub auto_detect: bool,
    /// Tool name -> absolute executable path.
    pub overrides: BTreeMap<String, PathBuf>,
}

impl ToolConfig {
    /// The configured override for a tool, if any.
    pub fn override_for(&self, tool: &str) -> Option<&PathBuf> {
        self.overrides.get(tool)
    }

    pub fn set_override(&mut self, tool: &str, path: PathBuf) {
        self.overrides.insert(tool.to_string(), path);
    }

    pub fn clear_override(&mut self, tool: &str) -> bool {
        self.overrides.remove(tool).is_some()
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            auto_detect: true,
            overrides: BTreeMap::new(),
        }
    }
}

/// Tunables for discovery and annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Maximum directory depth during discovery.
    pub max_depth: usize,
    /// Parallel annotation jobs.
    pub parallel_jobs: usize,
    /// Entry cap for the bounded quick-scan used by validation.
    pub quick_scan_cap: usize,
    /// Wall-clock budget for a single toolchain invocation, in seconds.
    pub command_timeout_secs: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_depth: 10,
            parallel_jobs: 4,
            quick_scan_cap: 2000,
            command_timeout_secs: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roots: ScanRootSet::default(),
            tools: ToolConfig::default(),
            scan: ScanSettings::default(),
        }
    }
}

impl Config {
    /// Default config file location under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("devsweep").join("config.toml"))
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file yields the default configuration; a present but
    /// unparseable file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => return Ok(Self::default()),
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&raw).map_err(|e| ConfigError::ParseError { path, source: e })
    }

    /// Persist configuration to `path`, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<(), ConfigError> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => {
                return Err(ConfigError::Invalid(
                    "no config directory available on this platform".into(),
                ))
            }
        };

        let rendered = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(format!("serialization failed: {e}")))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.clone(),
                source: e,
            })?;
        }

        std::fs::write(&path, rendered).map_err(|e| ConfigError::WriteError { path, source: e })
    }
}
