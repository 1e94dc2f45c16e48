// ABOUTME: Durable, append-only release store backed by one JSON file per release.
// ABOUTME: Every successful mark() is fsynced before it returns.

mod error;
mod release;

pub use error::StoreError;
pub use release::{Release, ReleaseStatus};

use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::types::{ArtifactLocation, ReleaseId};

const RELEASES_SUBDIR: &str = "releases";

/// Durable record of every release ever registered for a project.
///
/// Each release is a JSON file `releases/<id>.json` under the state
/// directory. Records are only ever rewritten through `mark`, which
/// persists with write-temp/fsync/rename so a crash immediately after a
/// successful call cannot lose the new status.
#[derive(Debug)]
pub struct ReleaseStore {
    releases_dir: PathBuf,
}

impl ReleaseStore {
    /// Open (creating if needed) the store under the given state directory.
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        let releases_dir = state_dir.join(RELEASES_SUBDIR);
        fs::create_dir_all(&releases_dir)?;
        Ok(Self { releases_dir })
    }

    /// Register a new artifact as a Staged release with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateArtifact` if the location is already
    /// registered and not purged.
    pub fn register(&self, artifact_location: ArtifactLocation) -> Result<Release, StoreError> {
        let mut max_seq = 0u64;
        for release in self.load_all()? {
            if let Some(seq) = release.id.sequence() {
                max_seq = max_seq.max(seq);
            }
            if !release.status.is_purged() && release.artifact_location == artifact_location {
                return Err(StoreError::DuplicateArtifact(artifact_location));
            }
        }

        let release = Release {
            id: ReleaseId::from_sequence(max_seq + 1),
            artifact_location,
            created_at: Utc::now(),
            status: ReleaseStatus::Staged,
        };
        self.persist(&release)?;
        Ok(release)
    }

    /// Fetch a single release by id.
    pub fn get(&self, id: &ReleaseId) -> Result<Release, StoreError> {
        let path = self.release_path(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.load(&path)
    }

    /// Whether a release with this id exists (purged tombstones included).
    pub fn contains(&self, id: &ReleaseId) -> bool {
        self.release_path(id).exists()
    }

    /// All non-purged releases, newest first (`created_at` descending,
    /// sequence number as tiebreak).
    pub fn list_ordered(&self) -> Result<Vec<Release>, StoreError> {
        let mut releases: Vec<Release> = self
            .load_all()?
            .into_iter()
            .filter(|r| !r.status.is_purged())
            .collect();
        releases.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.sequence().cmp(&a.id.sequence()))
        });
        Ok(releases)
    }

    /// Move a release to a new status, enforcing the transition table.
    ///
    /// The updated record is durably persisted before this returns.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidTransition` for moves outside the table
    /// and `StoreError::NotFound` for unknown ids.
    pub fn mark(
        &self,
        id: &ReleaseId,
        new_status: ReleaseStatus,
    ) -> Result<Release, StoreError> {
        let mut release = self.get(id)?;

        if !release.status.can_transition_to(new_status) {
            return Err(StoreError::InvalidTransition {
                id: id.clone(),
                from: release.status,
                to: new_status,
            });
        }

        release.status = new_status;
        self.persist(&release)?;
        Ok(release)
    }

    /// The release currently marked Live, if any.
    pub fn live(&self) -> Result<Option<Release>, StoreError> {
        Ok(self.load_all()?.into_iter().find(Release::is_live))
    }

    /// A release left in Verifying by a crashed or interrupted attempt.
    ///
    /// At most one can exist, since an attempt holds the deploy lock for
    /// its whole duration.
    pub fn stale_verifying(&self) -> Result<Option<Release>, StoreError> {
        Ok(self
            .load_all()?
            .into_iter()
            .find(|r| r.status == ReleaseStatus::Verifying))
    }

    fn release_path(&self, id: &ReleaseId) -> PathBuf {
        self.releases_dir.join(format!("{id}.json"))
    }

    fn load(&self, path: &Path) -> Result<Release, StoreError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    fn load_all(&self) -> Result<Vec<Release>, StoreError> {
        let mut releases = Vec::new();
        for entry in fs::read_dir(&self.releases_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                releases.push(self.load(&path)?);
            }
        }
        Ok(releases)
    }

    /// Write-temp, fsync, rename, fsync-dir. The record is either the old
    /// version or the new one after a crash, never a partial write.
    fn persist(&self, release: &Release) -> Result<(), StoreError> {
        let final_path = self.release_path(&release.id);
        let tmp_path = final_path.with_extension("json.tmp");

        let json = serde_json::to_vec_pretty(release).expect("release serializes");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &final_path)?;
        fs::File::open(&self.releases_dir)?.sync_all()?;
        Ok(())
    }
}
