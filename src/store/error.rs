// ABOUTME: Error types for the release store.
// ABOUTME: Distinguishes usage errors from I/O and corruption failures.

use std::path::PathBuf;
use thiserror::Error;

use super::release::ReleaseStatus;
use crate::types::{ArtifactLocation, ReleaseId};

#[derive(Debug, Error)]
pub enum StoreError {
    /// No release with the given id.
    #[error("release not found: {0}")]
    NotFound(ReleaseId),

    /// The artifact location is already registered and not purged.
    #[error("artifact already registered: {0}")]
    DuplicateArtifact(ArtifactLocation),

    /// The requested status change is not in the transition table.
    #[error("invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: ReleaseId,
        from: ReleaseStatus,
        to: ReleaseStatus,
    },

    /// A release file exists but cannot be parsed.
    #[error("corrupt release record at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
