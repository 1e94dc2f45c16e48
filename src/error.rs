// ABOUTME: Application-wide error types for gantry.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::lifecycle::LifecycleError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid artifact location: {0}")]
    InvalidArtifact(String),

    #[error("invalid release id: {0}")]
    InvalidReleaseId(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code for this error: 2 for fatal double failures that
    /// need manual intervention, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Lifecycle(e) if e.is_fatal() => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
