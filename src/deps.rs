//! Best-effort dependency enumeration per ecosystem.
//!
//! Dependency data is advisory: every failure here (missing toolchain,
//! absent manifest, unparseable line) degrades to an empty or shorter list
//! and never aborts a scan.

use crate::ecosystem::Ecosystem;
use crate::exec::ToolLocator;
use crate::fsops;
use crate::project::{Dependency, Project};
use std::path::Path;

/// Version-constraint operators recognized in requirements files,
/// longest first so `==` wins over `=`.
const PYTHON_CONSTRAINT_OPS: &[&str] = &["===", "==", ">=", "<=", "~=", "!=", ">", "<"];

/// Gradle configuration names whose declarations carry coordinates.
const GRADLE_CONFIGURATIONS: &[&str] = &[
    "implementation",
    "api",
    "compileOnly",
    "runtimeOnly",
    "testImplementation",
    "classpath",
];

/// Enumerates declared dependencies for a discovered project.
#[derive(Debug, Clone)]
pub struct DependencyInspector {
    locator: ToolLocator,
}

impl DependencyInspector {
    pub fn new(locator: ToolLocator) -> Self {
        Self { locator }
    }

    /// List the project's declared dependencies, best-effort.
    pub fn inspect(&self, project: &Project) -> Vec<Dependency> {
        match project.ecosystem {
            Ecosystem::Go => self.inspect_go(&project.root),
            Ecosystem::Node => inspect_node(&project.root),
            Ecosystem::Python => inspect_python(&project.root),
            Ecosystem::Gradle => inspect_gradle(&project.root),
        }
    }

    fn inspect_go(&self, root: &Path) -> Vec<Dependency> {
        let Some(go) = self.locator.locate("go") else {
            tracing::debug!("go toolchain not found; returning no dependencies");
            return Vec::new();
        };

        let result = match self.locator.runner().run(
            &go.to_string_lossy(),
            &["list", "-m", "all"],
            Some(root),
            self.locator.env(),
        ) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(error = %e, "go list failed; returning no dependencies");
                return Vec::new();
            }
        };

        parse_go_list_output(&result.stdout)
    }
}

/// Parse `go list -m all` output: one module per line, first line is the
/// project's own root module, `=>` lines are local path replacements.
fn parse_go_list_output(output: &str) -> Vec<Dependency> {
    output
        .lines()
        .skip(1)
        .filter(|line| !line.contains("=>"))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let version = parts.next().unwrap_or("unknown");
            Some(Dependency::new(name, version))
        })
        .collect()
}

/// Read `package.json` and flatten `dependencies` + `devDependencies`.
/// When `node_modules/<name>` exists its measured size is attached.
fn inspect_node(root: &Path) -> Vec<Dependency> {
    let manifest = root.join("package.json");
    let Ok(raw) = std::fs::read_to_string(&manifest) else {
        return Vec::new();
    };
    let Ok(json) = serde_json::from_str::<serde_json::Value>(&raw) else {
        tracing::debug!(path = %manifest.display(), "unparseable package.json");
        return Vec::new();
    };

    let mut deps = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        let Some(map) = json.get(section).and_then(|v| v.as_object()) else {
            continue;
        };
        for (name, version) in map {
            let mut dep = Dependency::new(name, version.as_str().unwrap_or("unknown"));
            let installed = root.join("node_modules").join(name);
            if installed.is_dir() {
                dep.size = fsops::tree_size_or_zero(&installed);
                dep.cache_path = Some(installed);
            }
            deps.push(dep);
        }
    }
    deps
}

/// Line-based `requirements.txt` parse.
fn inspect_python(root: &Path) -> Vec<Dependency> {
    let Ok(raw) = std::fs::read_to_string(root.join("requirements.txt")) else {
        return Vec::new();
    };

    raw.lines().filter_map(parse_requirement_line).collect()
}

fn parse_requirement_line(line: &str) -> Option<Dependency> {
    let line = line.split(" #").next().unwrap_or(line).trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
        return None;
    }

    for op in PYTHON_CONSTRAINT_OPS {
        if let Some((name, version)) = line.split_once(op) {
            let name = name.trim().trim_end_matches(|c| c == '[' || c == ']');
            let name = name.split('[').next().unwrap_or(name).trim();
            if name.is_empty() {
                return None;
            }
            return Some(Dependency::new(name, version.trim()));
        }
    }

    let name = line.split('[').next().unwrap_or(line).trim();
    Some(Dependency::new(name, "unknown"))
}

/// Best-effort line scan of Gradle build files for `group:name:version`
/// coordinates. Declarations needing real Groovy/Kotlin parsing are skipped.
fn inspect_gradle(root: &Path) -> Vec<Dependency> {
    let mut deps = Vec::new();

    for manifest in ["build.gradle", "build.gradle.kts"] {
        let Ok(raw) = std::fs::read_to_string(root.join(manifest)) else {
            continue;
        };
        for line in raw.lines() {
            if let Some(dep) = parse_gradle_line(line) {
                deps.push(dep);
            }
        }
    }

    deps
}

fn parse_gradle_line(line: &str) -> Option<Dependency> {
    let trimmed = line.trim();
    let configured = GRADLE_CONFIGURATIONS
        .iter()
        .any(|cfg| trimmed.starts_with(cfg));
    if !configured {
        return None;
    }

    // Pull the first quoted string out of the declaration.
    let quote = trimmed.find(['"', '\''])?;
    let quote_char = trimmed.as_bytes()[quote] as char;
    let rest = &trimmed[quote + 1..];
    let end = rest.find(quote_char)?;
    let coordinate = &rest[..end];

    let mut parts = coordinate.split(':');
    let group = parts.next()?;
    let artifact = parts.next()?;
    let version = parts.next().unwrap_or("unknown");
    if group.is_empty() || artifact.is_empty() {
        return None;
    }

    Some(Dependency::new(
        format!("{group}:{artifact}"),
        version,
    ))
}
