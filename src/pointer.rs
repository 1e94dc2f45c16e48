// ABOUTME: Crash-safe "current release" indirection with atomic republication.
// ABOUTME: Writes the new target to a temp file, then renames over the published one.

use parking_lot::RwLock;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::ReleaseStore;
use crate::types::ReleaseId;

const POINTER_FILE: &str = "current";
const POINTER_TMP: &str = "current.tmp";

#[derive(Debug, Error)]
pub enum PointerError {
    /// No release has ever been made live.
    #[error("no live release: pointer has never been set")]
    Uninitialized,

    /// The identifier names no existing release.
    #[error("switch target does not exist: {0}")]
    TargetNotFound(ReleaseId),

    #[error("pointer record is corrupt: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The single source of truth for which release is live.
///
/// Durably a one-line file `current` in the state directory. A switch
/// writes the new target to `current.tmp`, fsyncs it, and renames it over
/// `current`: a crash before the rename leaves the old pointer intact, a
/// crash after leaves the new one, and no intermediate state is ever
/// published. In-process readers go through an `RwLock` cache and are
/// never blocked by a writer mid-switch.
#[derive(Debug)]
pub struct PointerSwitch {
    state_dir: PathBuf,
    cached: RwLock<Option<ReleaseId>>,
}

impl PointerSwitch {
    /// Open the pointer for a state directory, loading any published value.
    pub fn open(state_dir: &Path) -> Result<Self, PointerError> {
        fs::create_dir_all(state_dir)?;
        let published = Self::read_published(state_dir)?;
        Ok(Self {
            state_dir: state_dir.to_path_buf(),
            cached: RwLock::new(published),
        })
    }

    /// The currently live release id.
    ///
    /// # Errors
    ///
    /// Returns `PointerError::Uninitialized` if no pointer has ever been
    /// set (or it has been cleared).
    pub fn current(&self) -> Result<ReleaseId, PointerError> {
        self.cached
            .read()
            .clone()
            .ok_or(PointerError::Uninitialized)
    }

    /// Atomically repoint at another release.
    ///
    /// # Errors
    ///
    /// Returns `PointerError::TargetNotFound` if the id names no release
    /// in the store.
    pub fn switch_to(&self, id: &ReleaseId, store: &ReleaseStore) -> Result<(), PointerError> {
        if !store.contains(id) {
            return Err(PointerError::TargetNotFound(id.clone()));
        }

        let tmp_path = self.state_dir.join(POINTER_TMP);
        let final_path = self.state_dir.join(POINTER_FILE);

        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(id.as_str().as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &final_path)?;
        fs::File::open(&self.state_dir)?.sync_all()?;

        tracing::debug!("pointer switched to {}", id);
        *self.cached.write() = Some(id.clone());
        Ok(())
    }

    /// Remove the pointer entirely, returning the project to the
    /// uninitialized state. Used when a bootstrap deploy fails
    /// verification and there is nothing to revert to.
    pub fn clear(&self) -> Result<(), PointerError> {
        let final_path = self.state_dir.join(POINTER_FILE);
        match fs::remove_file(&final_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::File::open(&self.state_dir)?.sync_all()?;

        tracing::debug!("pointer cleared");
        *self.cached.write() = None;
        Ok(())
    }

    fn read_published(state_dir: &Path) -> Result<Option<ReleaseId>, PointerError> {
        let path = state_dir.join(POINTER_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let value = content.trim();
        if value.is_empty() {
            return Err(PointerError::Corrupt(format!(
                "empty pointer file at {}",
                path.display()
            )));
        }
        Ok(Some(ReleaseId::new(value.to_string())))
    }
}
