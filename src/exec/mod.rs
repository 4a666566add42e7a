//! Toolchain process execution and executable resolution.

pub mod locator;
pub mod runner;

pub use locator::{require_tool, ToolLocator};
pub use runner::{CommandResult, ProcessRunner};
