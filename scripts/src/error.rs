//! Error types for script loading.
//!
//! Covers I/O, serialization, naming, and integrity failures encountered
//! while reading script directories, bundles, and configuration files.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading scripts or configuration.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// An alter script file name does not start with a valid version.
    #[error("invalid script name '{name}': {reason}", name = .path.display())]
    InvalidScriptName { path: PathBuf, reason: String },

    /// Bundle hash does not match the scripts it carries.
    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),

    /// Bundle file extension is not `.json`, `.yml`, or `.yaml`.
    #[error("unsupported bundle format: {name}", name = .0.display())]
    UnsupportedFormat(PathBuf),

    /// All configured loader sources failed.
    #[error("no script sources available")]
    NoSourcesAvailable,
}

/// Convenience alias for results with [`ScriptError`].
pub type Result<T> = std::result::Result<T, ScriptError>;
