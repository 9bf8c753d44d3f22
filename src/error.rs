// ABOUTME: Application-wide error types for taskroll.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::deploy::DeployError;
use crate::stage::StageError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no platform snapshot given; pass --platform or set `platform` in taskroll.yml")]
    MissingPlatform,

    #[error("invalid input {0}: {1}")]
    InvalidInput(String, #[source] serde_json::Error),

    #[error("platform snapshot not found: {0}")]
    SnapshotNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{failed} of {total} target(s) failed")]
    ReleaseFailed { failed: usize, total: usize },

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Deploy(#[from] DeployError),
}

impl Error {
    /// Whether running the same command again later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Stage(e) => e.is_retryable(),
            Error::Deploy(e) => e.is_retryable(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
