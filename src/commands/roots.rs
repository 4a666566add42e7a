//! Roots command: manage the persisted scan-root set.

use crate::cli::{RootsAction, RootsArgs};
use crate::config::Config;
use crate::discover::{Discoverer, Validation};
use anyhow::Result;
use std::path::Path;

/// Run the roots command. Mutations are persisted immediately.
pub fn run(args: RootsArgs, config: &mut Config, config_path: Option<&Path>) -> Result<()> {
    match args.action {
        RootsAction::Add { path } => {
            let resolved = path.canonicalize().unwrap_or(path);

            let discoverer =
                Discoverer::new(config.scan.max_depth, config.scan.quick_scan_cap);
            match discoverer.validate(&resolved) {
                Validation::Invalid(message) => {
                    anyhow::bail!("cannot add root: {message}");
                }
                Validation::Warning(message) => {
                    println!("warning: {message}");
                }
                Validation::Valid(message) => {
                    println!("{message}");
                }
            }

            if config.roots.add(resolved.clone()) {
                config.save(config_path)?;
                println!("Added {}", resolved.display());
            } else {
                println!("{} is already a scan root", resolved.display());
            }
        }
        RootsAction::Remove { path } => {
            let resolved = path.canonicalize().unwrap_or(path);
            if config.roots.remove(&resolved) {
                config.save(config_path)?;
                println!("Removed {}", resolved.display());
            } else {
                println!("{} is not a scan root", resolved.display());
            }
        }
        RootsAction::List => {
            if config.roots.is_empty() {
                println!("No scan roots configured.");
            } else {
                for root in config.roots.iter() {
                    println!("{}", root.display());
                }
            }
        }
    }

    Ok(())
}
