// ABOUTME: The immutable release record and its status transition table.
// ABOUTME: Status changes outside the table are rejected by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ArtifactLocation, ReleaseId};

/// Lifecycle status of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseStatus {
    /// Registered, artifact in place, not yet exposed.
    Staged,
    /// Pointer aimed at it, health verification in progress.
    Verifying,
    /// The release currently serving traffic.
    Live,
    /// Failed verification and was reverted away from.
    RolledBack,
    /// Was Live (or Staged) and has been replaced.
    Superseded,
    /// Retention has reclaimed the artifact; record kept for history.
    Purged,
}

impl ReleaseStatus {
    /// Whether a transition from `self` to `to` is legal.
    ///
    /// Beyond the forward deploy path, `Superseded -> Live` and
    /// `RolledBack -> Live` are allowed so an operator rollback can
    /// re-promote an earlier release.
    pub fn can_transition_to(self, to: ReleaseStatus) -> bool {
        use ReleaseStatus::*;
        matches!(
            (self, to),
            (Staged, Verifying)
                | (Staged, Superseded)
                | (Verifying, Live)
                | (Verifying, RolledBack)
                | (Live, Superseded)
                | (Superseded, Live)
                | (RolledBack, Live)
                | (Superseded, Purged)
                | (RolledBack, Purged)
        )
    }

    /// Purged releases keep a tombstone record but are invisible to
    /// listing, duplicate checks, and rollback-target selection.
    pub fn is_purged(self) -> bool {
        matches!(self, ReleaseStatus::Purged)
    }
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReleaseStatus::Staged => "staged",
            ReleaseStatus::Verifying => "verifying",
            ReleaseStatus::Live => "live",
            ReleaseStatus::RolledBack => "rolled-back",
            ReleaseStatus::Superseded => "superseded",
            ReleaseStatus::Purged => "purged",
        };
        write!(f, "{s}")
    }
}

/// An immutable release record. Everything except `status` is fixed at
/// registration time; `status` moves only through `ReleaseStore::mark`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    pub artifact_location: ArtifactLocation,
    pub created_at: DateTime<Utc>,
    pub status: ReleaseStatus,
}

impl Release {
    pub fn is_live(&self) -> bool {
        self.status == ReleaseStatus::Live
    }
}
