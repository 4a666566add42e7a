//! Resolution of toolchain executables.
//!
//! Lookup order: user-configured override, well-known install directories,
//! then a `which` fallback through [`ProcessRunner`]. All spawned tool
//! processes get an augmented environment: inherited OS vars, a search PATH
//! combining the system PATH with common install directories and whatever
//! PATH the user's shell startup file exports, and a resolved HOME.

use crate::config::ToolConfig;
use crate::error::ExecError;
use crate::exec::runner::ProcessRunner;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Install directories probed for every tool.
const COMMON_BIN_DIRS: &[&str] = &[
    "/usr/local/bin",
    "/opt/homebrew/bin",
    "/usr/bin",
    "/bin",
];

/// Shell startup files scraped (best-effort) for an exported PATH.
const SHELL_RC_FILES: &[&str] = &[".zshrc", ".bashrc", ".profile"];

/// Resolves toolchain executables and builds their process environment.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    tools: ToolConfig,
    runner: ProcessRunner,
    env: HashMap<String, String>,
}

impl ToolLocator {
    pub fn new(tools: ToolConfig, runner: ProcessRunner) -> Self {
        let env = build_tool_env();
        Self { tools, runner, env }
    }

    /// The environment used for every toolchain invocation.
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// Resolve the absolute path of a named tool, if it can be found.
    pub fn locate(&self, tool: &str) -> Option<PathBuf> {
        if let Some(override_path) = self.tools.override_for(tool) {
            if is_executable(override_path) {
                return Some(override_path.clone());
            }
            tracing::warn!(
                tool,
                path = %override_path.display(),
                "configured override is not executable; falling back to auto-detection"
            );
        }

        if !self.tools.auto_detect {
            return None;
        }

        for dir in self.well_known_dirs(tool) {
            let candidate = dir.join(tool);
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }

        self.which(tool)
    }

    /// Whether the tool resolves to an executable at all.
    pub fn exists(&self, tool: &str) -> bool {
        self.locate(tool).is_some()
    }

    /// Run the tool's version query and extract a version-looking token.
    ///
    /// Returns None (never an error) when the tool is missing or its output
    /// does not parse; version absence must not block anything else.
    pub fn version(&self, tool: &str, version_args: &[&str]) -> Option<String> {
        let path = self.locate(tool)?;
        let result = self
            .runner
            .run(&path.to_string_lossy(), version_args, None, &self.env)
            .ok()?;

        extract_version_token(&result.stdout)
            .or_else(|| extract_version_token(&result.stderr))
    }

    fn well_known_dirs(&self, tool: &str) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = COMMON_BIN_DIRS.iter().map(PathBuf::from).collect();

        if let Some(home) = dirs::home_dir() {
            dirs.push(home.join(".local/bin"));
            match tool {
                "go" => dirs.push(home.join("go/bin")),
                "gradle" => dirs.push(home.join(".sdkman/candidates/gradle/current/bin")),
                "npm" => dirs.push(home.join(".nvm/current/bin")),
                _ => {}
            }
        }

        dirs
    }

    fn which(&self, tool: &str) -> Option<PathBuf> {
        let result = self.runner.run("which", &[tool], None, &self.env).ok()?;
        let line = result.stdout.lines().next()?.trim();
        if line.is_empty() {
            return None;
        }
        let path = PathBuf::from(line);
        is_executable(&path).then_some(path)
    }
}

/// Convert a locate miss into the error surfaced by cleanup operations.
pub fn require_tool(locator: &ToolLocator, tool: &str) -> Result<PathBuf, ExecError> {
    locator.locate(tool).ok_or_else(|| ExecError::ToolNotFound {
        program: tool.to_string(),
    })
}

/// Build the augmented environment shared by all tool invocations.
fn build_tool_env() -> HashMap<String, String> {
    let mut env: HashMap<String, String> = std::env::vars().collect();

    let mut path_parts: Vec<String> = Vec::new();
    if let Some(system_path) = env.get("PATH") {
        path_parts.extend(system_path.split(':').map(str::to_string));
    }
    path_parts.extend(COMMON_BIN_DIRS.iter().map(|s| s.to_string()));

    if let Some(home) = dirs::home_dir() {
        path_parts.push(home.join(".local/bin").to_string_lossy().into_owned());
        path_parts.push(home.join("go/bin").to_string_lossy().into_owned());

        // Best-effort; a missing or odd rc file is silently ignored.
        path_parts.extend(scrape_shell_path(&home));

        env.insert("HOME".to_string(), home.to_string_lossy().into_owned());
    }

    let mut seen = std::collections::HashSet::new();
    let merged: Vec<String> = path_parts
        .into_iter()
        .filter(|p| !p.is_empty() && seen.insert(p.clone()))
        .collect();
    env.insert("PATH".to_string(), merged.join(":"));

    env
}

/// Pull PATH components out of `export PATH=...` lines in shell rc files.
/// Segments that still reference other variables are dropped.
fn scrape_shell_path(home: &Path) -> Vec<String> {
    let mut parts = Vec::new();

    for rc in SHELL_RC_FILES {
        let Ok(contents) = std::fs::read_to_string(home.join(rc)) else {
            continue;
        };
        for line in contents.lines() {
            let line = line.trim();
            let Some(assignment) = line
                .strip_prefix("export PATH=")
                .or_else(|| line.strip_prefix("PATH="))
            else {
                continue;
            };
            let value = assignment.trim_matches(|c| c == '"' || c == '\'');
            for segment in value.split(':') {
                if !segment.is_empty() && !segment.contains('$') {
                    parts.push(segment.to_string());
                }
            }
        }
    }

    parts
}

/// First whitespace-delimited token of the first non-empty line that looks
/// like a version: contains a digit and a dot, and is not a path.
fn extract_version_token(output: &str) -> Option<String> {
    let line = output.lines().find(|l| !l.trim().is_empty())?;
    line.split_whitespace()
        .find(|token| {
            token.chars().any(|c| c.is_ascii_digit())
                && token.contains('.')
                && !token.contains('/')
        })
        .map(str::to_string)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn write_executable(dir: &Path, name: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn locator_with(tools: ToolConfig) -> ToolLocator {
        ToolLocator::new(tools, ProcessRunner::default())
    }

    #[test]
    fn override_wins_when_executable() {
        let tmp = TempDir::new().unwrap();
        let fake = write_executable(tmp.path(), "fake-go");

        let mut tools = ToolConfig::default();
        tools.set_override("fake-go", fake.clone());

        let locator = locator_with(tools);
        assert_eq!(locator.locate("fake-go"), Some(fake));
    }

    #[test]
    fn non_executable_override_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let plain = tmp.path().join("not-a-binary");
        std::fs::write(&plain, "data").unwrap();

        let mut tools = ToolConfig {
            auto_detect: false,
            overrides: BTreeMap::new(),
        };
        tools.set_override("devsweep-missing-tool", plain);

        let locator = locator_with(tools);
        assert_eq!(locator.locate("devsweep-missing-tool"), None);
    }

    #[test]
    fn auto_detect_off_means_overrides_only() {
        let tools = ToolConfig {
            auto_detect: false,
            overrides: BTreeMap::new(),
        };
        let locator = locator_with(tools);

        // `sh` is everywhere, but without auto-detect it must not resolve.
        assert_eq!(locator.locate("sh"), None);
        assert!(!locator.exists("sh"));
    }

    #[test]
    fn missing_tool_does_not_exist() {
        let locator = locator_with(ToolConfig::default());
        assert!(!locator.exists("devsweep-no-such-tool-xyz"));
    }

    #[test]
    fn locates_a_ubiquitous_tool() {
        let locator = locator_with(ToolConfig::default());
        assert!(locator.exists("sh"));
    }

    #[test]
    fn missing_tool_version_is_none() {
        let locator = locator_with(ToolConfig::default());
        assert_eq!(
            locator.version("devsweep-no-such-tool-xyz", &["--version"]),
            None
        );
    }

    #[test]
    fn env_has_augmented_path_and_home() {
        let locator = locator_with(ToolConfig::default());
        let path = locator.env().get("PATH").unwrap();
        assert!(path.contains("/usr/local/bin"));
        assert!(locator.env().contains_key("HOME"));
    }

    #[test]
    fn version_token_extraction() {
        assert_eq!(
            extract_version_token("go version go1.22.1 linux/amd64"),
            Some("go1.22.1".to_string())
        );
        assert_eq!(
            extract_version_token("10.2.4\n"),
            Some("10.2.4".to_string())
        );
        assert_eq!(
            extract_version_token("pip 23.2.1 from /usr/lib/python3 (python 3.11)"),
            Some("23.2.1".to_string())
        );
        assert_eq!(extract_version_token("no digits here"), None);
        assert_eq!(extract_version_token(""), None);
    }

    #[test]
    fn shell_rc_scrape_skips_variable_references() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(".zshrc"),
            "export PATH=\"/custom/bin:$PATH\"\nalias ll='ls -l'\n",
        )
        .unwrap();

        let parts = scrape_shell_path(tmp.path());
        assert_eq!(parts, vec!["/custom/bin".to_string()]);
    }
}
