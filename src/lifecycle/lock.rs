// ABOUTME: Deploy lock to prevent concurrent attempts on the same project.
// ABOUTME: Uses atomic file creation with lock info stored in the state directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::ProjectName;

use super::LifecycleError;

/// Subdirectory of the state dir holding lock files.
const LOCKS_SUBDIR: &str = "locks";

/// Information about who holds a deploy lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// Project being deployed.
    pub project: String,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(project: &ProjectName) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            project: project.to_string(),
        }
    }

    /// Check if this lock is stale (older than 1 hour).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }

    /// Path to the lock file for a project.
    pub fn lock_path(state_dir: &Path, project: &ProjectName) -> PathBuf {
        state_dir.join(LOCKS_SUBDIR).join(format!("{project}.lock"))
    }
}

/// A held deploy lock. Released explicitly on terminal transitions, or
/// best-effort on drop if the attempt unwinds early.
#[derive(Debug)]
pub struct DeployLock {
    path: Option<PathBuf>,
}

impl DeployLock {
    /// Acquire the deploy lock for a project.
    ///
    /// Uses `create_new` for atomic acquisition (no TOCTOU race). Returns
    /// `DeploymentInProgress` if the lock is validly held by another
    /// process. Auto-breaks stale locks (>1 hour) with a warning.
    pub fn acquire(
        state_dir: &Path,
        project: &ProjectName,
        force: bool,
    ) -> Result<Self, LifecycleError> {
        let path = LockInfo::lock_path(state_dir, project);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| LifecycleError::Lock(format!("cannot create lock dir: {e}")))?;
        }

        let info = LockInfo::new(project);
        let json = serde_json::to_string(&info)
            .map_err(|e| LifecycleError::Lock(format!("failed to serialize lock: {e}")))?;

        match Self::try_create(&path, &json) {
            Ok(()) => return Ok(Self { path: Some(path) }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(LifecycleError::Lock(format!("failed to acquire lock: {e}"))),
        }

        // Lock file exists. Decide whether to break it.
        if !Self::should_break(&path, force)? {
            let existing = Self::read_info(&path)
                .ok_or_else(|| LifecycleError::Lock("lock held by another process".to_string()))?;
            return Err(LifecycleError::DeploymentInProgress {
                holder: existing.holder,
                pid: existing.pid,
                started_at: existing.started_at,
            });
        }

        tracing::debug!("removing stale/forced lock at {}", path.display());
        let _ = fs::remove_file(&path);

        match Self::try_create(&path, &json) {
            Ok(()) => Ok(Self { path: Some(path) }),
            Err(_) => Err(LifecycleError::Lock(
                "lock acquired by another process during break".to_string(),
            )),
        }
    }

    /// Release the lock.
    pub fn release(mut self) -> Result<(), LifecycleError> {
        if let Some(path) = self.path.take() {
            fs::remove_file(&path)
                .map_err(|e| LifecycleError::Lock(format!("failed to release lock: {e}")))?;
        }
        Ok(())
    }

    fn try_create(path: &Path, json: &str) -> std::io::Result<()> {
        use std::io::Write;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    fn read_info(path: &Path) -> Option<LockInfo> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Check if an existing lock should be broken (stale, forced, or
    /// corrupted).
    fn should_break(path: &Path, force: bool) -> Result<bool, LifecycleError> {
        match Self::read_info(path) {
            Some(existing) => {
                if force {
                    tracing::warn!(
                        "breaking lock held by {} (pid {}) since {}",
                        existing.holder,
                        existing.pid,
                        existing.started_at
                    );
                    Ok(true)
                } else if existing.is_stale() {
                    tracing::warn!(
                        "auto-breaking stale lock held by {} (pid {}) since {}",
                        existing.holder,
                        existing.pid,
                        existing.started_at
                    );
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            None => {
                // Lock info unreadable or corrupted, break it.
                tracing::warn!("lock info unreadable, breaking lock");
                Ok(true)
            }
        }
    }
}

impl Drop for DeployLock {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let _ = fs::remove_file(&path);
        }
    }
}
