// ABOUTME: Retention policy: prunes old releases without breaking rollback.
// ABOUTME: Pure planning separated from execution for testability.

use crate::collaborators::ArtifactTransfer;
use crate::diagnostics::{Diagnostics, Warning};
use crate::store::{Release, ReleaseStatus, ReleaseStore, StoreError};
use crate::types::ReleaseId;

/// What one prune pass decided.
#[derive(Debug, Default)]
pub struct PrunePlan {
    /// Releases to mark Purged and reclaim.
    pub purge: Vec<Release>,
    /// Ids kept, for reporting.
    pub retain: Vec<ReleaseId>,
}

/// What one prune pass actually did.
pub struct PruneReport {
    pub purged: Vec<Release>,
    pub retained: Vec<ReleaseId>,
    /// Non-fatal reclamation failures, for the operator.
    pub diagnostics: Diagnostics,
}

/// Decide which releases to purge, given all non-purged releases newest
/// first.
///
/// Retained: the Live release, anything still Staged or Verifying (an
/// in-flight or stranded attempt), the most recent RolledBack release
/// (emergency rollback target), and the `keep_count` most recent
/// Superseded releases. Everything else is purgeable.
pub fn plan(releases: &[Release], keep_count: usize) -> PrunePlan {
    let mut plan = PrunePlan::default();
    let mut superseded_kept = 0usize;
    let mut rolled_back_kept = false;

    for release in releases {
        let keep = match release.status {
            ReleaseStatus::Live | ReleaseStatus::Staged | ReleaseStatus::Verifying => true,
            ReleaseStatus::Superseded => {
                if superseded_kept < keep_count {
                    superseded_kept += 1;
                    true
                } else {
                    false
                }
            }
            ReleaseStatus::RolledBack => {
                if rolled_back_kept {
                    false
                } else {
                    rolled_back_kept = true;
                    true
                }
            }
            ReleaseStatus::Purged => false,
        };

        if keep {
            plan.retain.push(release.id.clone());
        } else {
            plan.purge.push(release.clone());
        }
    }

    plan
}

/// Execute a prune pass: mark each purgeable release Purged (durable
/// before any reclamation) and request artifact deletion from the storage
/// collaborator. A failed deletion is logged, not fatal; the tombstone is
/// already durable and a later pass can retry nothing — the artifact is
/// simply leaked for the operator to reclaim.
pub async fn execute(
    store: &ReleaseStore,
    transfer: &dyn ArtifactTransfer,
    keep_count: usize,
) -> Result<PruneReport, StoreError> {
    let releases = store.list_ordered()?;
    let plan = plan(&releases, keep_count);

    let mut diagnostics = Diagnostics::default();
    let mut purged = Vec::with_capacity(plan.purge.len());
    for release in plan.purge {
        let tombstone = store.mark(&release.id, ReleaseStatus::Purged)?;
        if let Err(e) = transfer.remove(&tombstone.artifact_location).await {
            diagnostics.warn(Warning::artifact_reclaim(format!(
                "failed to reclaim artifact for {}: {e}",
                tombstone.id
            )));
        }
        purged.push(tombstone);
    }

    Ok(PruneReport {
        purged,
        retained: plan.retain,
        diagnostics,
    })
}
