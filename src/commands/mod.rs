//! CLI subcommand implementations.

pub mod clean;
pub mod roots;
pub mod scan;
pub mod tools;
pub mod validate;

use crate::config::Config;
use crate::ecosystem::Ecosystem;
use crate::exec::{ProcessRunner, ToolLocator};
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Build the tool locator from the loaded configuration.
fn locator_from(config: &Config) -> ToolLocator {
    let runner = ProcessRunner::new(Duration::from_secs(config.scan.command_timeout_secs));
    ToolLocator::new(config.tools.clone(), runner)
}

/// Resolve requested ecosystem ids, defaulting to all of them.
fn parse_ecosystems(types: &Option<Vec<String>>) -> Result<Vec<Ecosystem>> {
    let Some(types) = types else {
        return Ok(Ecosystem::ALL.to_vec());
    };

    let mut ecosystems = Vec::new();
    for id in types {
        match Ecosystem::from_id(id) {
            Some(eco) => ecosystems.push(eco),
            None => bail!(
                "unknown ecosystem '{}'; valid values: {}",
                id,
                Ecosystem::ALL.map(|e| e.id()).join(", ")
            ),
        }
    }
    Ok(ecosystems)
}

/// Use explicit paths when given, otherwise the persisted root set.
fn resolve_roots(paths: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>> {
    if !paths.is_empty() {
        return Ok(paths.to_vec());
    }
    if config.roots.is_empty() {
        bail!("no scan roots: pass a directory or add one with 'devsweep roots add <PATH>'");
    }
    Ok(config.roots.iter().cloned().collect())
}

/// Shorten a long path for table display, keeping the tail. Counts and cuts
/// in characters, never bytes, so non-ASCII path names render safely.
fn truncate_path(path: &str, max: usize) -> String {
    let total = path.chars().count();
    if total <= max {
        return path.to_string();
    }
    let skip = total - max.saturating_sub(3);
    let tail: String = path.chars().skip(skip).collect();
    format!("...{tail}")
}
