//! Error types for hma-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors that stop a merge run before any output is written.
///
/// Per-line and per-field problems are not errors; they are reported as
/// [`MergeWarning`](crate::merger::MergeWarning) values instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read an input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the output script
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The override source is not valid JSON of the expected shape
    #[error("invalid override source '{path}': {source}")]
    OverrideParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The config file is not valid JSON of the expected shape
    #[error("invalid config file '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The enumeration file produced no ability entries
    #[error("no abilities found in '{path}'; cannot resolve ability overrides")]
    EmptyAbilityTable { path: PathBuf },

    /// Unknown format profile name
    #[error("unknown format profile '{0}' (expected 'extended' or 'positional')")]
    UnknownProfile(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
