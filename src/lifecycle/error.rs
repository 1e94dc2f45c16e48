// ABOUTME: Error types for deployment lifecycle operations.
// ABOUTME: Covers lock contention, verification failures, and double failures.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::collaborators::CollaboratorError;
use crate::pointer::PointerError;
use crate::probe::ProbeStatus;
use crate::store::{ReleaseStatus, StoreError};
use crate::types::ReleaseId;

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// No live release exists and the attempt was not flagged as a
    /// first-time bootstrap deploy.
    #[error("no live release exists; pass --bootstrap for a first-time deploy")]
    Uninitialized,

    /// Another attempt holds the deploy lock. Always safe to retry later.
    #[error("deployment already in progress: held by {holder} (pid {pid}) since {started_at}")]
    DeploymentInProgress {
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    #[error("lock error: {0}")]
    Lock(String),

    /// Artifact could not be placed. The pointer was never touched.
    #[error("artifact transfer failed: {0}")]
    Transfer(#[source] CollaboratorError),

    /// The probe gate refused to commit. Internal to the attempt: the
    /// controller turns this into the rollback path.
    #[error("verification of {release} failed: probe reported {status:?}")]
    Verification {
        release: ReleaseId,
        status: ProbeStatus,
    },

    /// A first-ever deploy failed verification; with nothing to revert to,
    /// the pointer was cleared and the system is uninitialized again.
    #[error(
        "bootstrap deploy of {release} failed verification ({status:?}); \
         pointer cleared, system is uninitialized"
    )]
    BootstrapFailed {
        release: ReleaseId,
        status: ProbeStatus,
    },

    /// The new release failed verification and the reconfirmation probe of
    /// the restored release also failed. Fatal: the pointer is left exactly
    /// where the reversal set it and no further automatic action is taken.
    #[error(
        "double failure: {forward} failed verification and {back} failed \
         reconfirmation; manual intervention required"
    )]
    DoubleFailure { forward: ReleaseId, back: ReleaseId },

    /// Rollback requested but no superseded release is available.
    #[error("no rollback target available")]
    NoRollbackTarget,

    /// Abort requested but no release is stuck in Verifying.
    #[error("no release is stranded in verifying")]
    NoStrandedRelease,

    /// The requested rollback target cannot be re-promoted.
    #[error("release {id} is not a valid rollback target (status: {status})")]
    BadRollbackTarget {
        id: ReleaseId,
        status: ReleaseStatus,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pointer(#[from] PointerError),
}

impl LifecycleError {
    /// Fatal errors require manual intervention and map to a distinct exit
    /// code at the CLI surface.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LifecycleError::DoubleFailure { .. })
    }
}
