use std::path::PathBuf;
use thiserror::Error;

/// Core library errors
#[derive(Error, Debug)]
pub enum DevsweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Size(#[from] SizeError),

    #[error("IO error at path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Errors from spawning and supervising external toolchain processes.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("'{program}' timed out after {timeout_secs}s and was killed")]
    Timeout { program: String, timeout_secs: u64 },

    #[error("'{program}' exited with status {code:?}: {stderr}")]
    ExecutionFailed {
        program: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("permission denied while running '{program}': {detail}")]
    PermissionDenied { program: String, detail: String },

    #[error("tool '{program}' not found; install it or configure an override path")]
    ToolNotFound { program: String },

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from directory size calculation.
#[derive(Error, Debug)]
pub enum SizeError {
    #[error("cannot enumerate '{path}': {source}")]
    EnumerationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Non-fatal problems collected during a nested cache sweep.
///
/// Enumeration problems only shrink the walk; a deletion problem means a
/// matched directory survived and the sweep cannot be called successful.
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("cannot enumerate '{path}': {source}")]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to delete '{path}': {source}")]
    Deletion {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DevsweepError>;
