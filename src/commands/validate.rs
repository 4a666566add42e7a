//! Validate command: judge whether a directory is worth scanning.

use crate::cli::ValidateArgs;
use crate::config::Config;
use crate::discover::{Discoverer, Validation};
use anyhow::Result;

/// Run the validate command.
pub fn run(args: ValidateArgs, config: &Config) -> Result<()> {
    let discoverer = Discoverer::new(config.scan.max_depth, config.scan.quick_scan_cap);

    match discoverer.validate(&args.path) {
        Validation::Valid(message) => {
            println!("valid: {message}");
        }
        Validation::Warning(message) => {
            println!("warning: {message}");
        }
        Validation::Invalid(message) => {
            eprintln!("invalid: {message}");
            std::process::exit(2);
        }
    }

    Ok(())
}
