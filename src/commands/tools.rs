//! Tools command: toolchain diagnostics.

use crate::cli::ToolsArgs;
use crate::config::Config;
use crate::report;
use anyhow::Result;

/// Run the tools command.
pub fn run(_args: ToolsArgs, config: &Config) -> Result<()> {
    let locator = super::locator_from(config);
    let statuses = report::diagnose(&locator);

    println!("  {:<8} {:<10} {:<12} {}", "TOOL", "STATUS", "VERSION", "PATH");
    println!("  {}", "-".repeat(70));

    for status in &statuses {
        let state = if status.available { "found" } else { "missing" };
        let version = status.version.as_deref().unwrap_or("-");
        let path = status
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());

        println!("  {:<8} {:<10} {:<12} {}", status.tool, state, version, path);
    }

    let missing: Vec<&str> = statuses
        .iter()
        .filter(|s| !s.available)
        .map(|s| s.tool)
        .collect();
    if !missing.is_empty() {
        println!(
            "\nMissing tools limit dependency listing and global purges for: {}",
            missing.join(", ")
        );
    }

    Ok(())
}
