//! Devsweep - discover development projects and reclaim their caches
//!
//! This crate provides functionality for:
//! - Discovering projects by ecosystem marker file (go.mod, package.json, ...)
//! - Measuring the disk space their dependency/build caches consume
//! - Cleaning those caches directly or through the toolchains' own
//!   purge/prune commands

pub mod cleaner;
pub mod cli;
pub mod commands;
pub mod config;
pub mod deps;
pub mod discover;
pub mod ecosystem;
pub mod error;
pub mod exec;
pub mod fsops;
pub mod project;
pub mod report;
pub mod session;

// Re-export commonly used types
pub use cleaner::{CacheCleaner, CleanupOutcome};
pub use config::Config;
pub use ecosystem::Ecosystem;
pub use error::{DevsweepError, Result};
pub use project::{CacheEntry, Dependency, Project};
pub use session::{CancelFlag, ScanEvent, ScanReport, ScanSession};
