//! Error types for the load test.
//!
//! Corpus and configuration problems are fatal and surface before any
//! virtual user starts. Per-iteration failures never produce an error;
//! they are recorded as failed checks instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the recorded request corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The test case file could not be read
    #[error("Failed to read test cases for '{algorithm}' from {}: {source}", path.display())]
    Read {
        algorithm: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON or lacks `test_cases` / `input`
    #[error("Invalid test case file for '{algorithm}' at {}: {source}", path.display())]
    Parse {
        algorithm: String,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An algorithm has no recorded requests
    #[error("No test cases recorded for '{0}'")]
    Empty(String),

    /// Algorithm is not part of the catalogue
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// The same algorithm was added twice
    #[error("Duplicate algorithm: {0}")]
    DuplicateAlgorithm(String),

    /// Nothing to pick from
    #[error("Corpus contains no algorithms")]
    NoAlgorithms,
}

/// Errors raised while validating the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("At least one virtual user is required")]
    NoVirtualUsers,

    #[error("Request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("Run has no stop condition: duration is 0 and no iteration budget was given")]
    NoStopCondition,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
