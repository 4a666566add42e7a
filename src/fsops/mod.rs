//! Filesystem measurement helpers.

pub mod size;

pub use size::{quick_scan, tree_size, tree_size_or_zero};
