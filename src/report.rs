//! Toolchain availability diagnostics.

use crate::ecosystem::Ecosystem;
use crate::exec::ToolLocator;
use std::path::PathBuf;

/// Resolution status of one supported toolchain.
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub ecosystem: Ecosystem,
    pub tool: &'static str,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
    pub available: bool,
}

/// Resolve every supported toolchain to its path, version, and availability.
///
/// Version lookup failures never mask availability: a tool that resolves
/// but won't report a version is still available.
pub fn diagnose(locator: &ToolLocator) -> Vec<ToolStatus> {
    Ecosystem::ALL
        .iter()
        .map(|&ecosystem| {
            let tool = ecosystem.tool();
            let path = locator.locate(tool);
            let version = path
                .is_some()
                .then(|| locator.version(tool, ecosystem.version_args()))
                .flatten();
            ToolStatus {
                ecosystem,
                tool,
                available: path.is_some(),
                path,
                version,
            }
        })
        .collect()
}
