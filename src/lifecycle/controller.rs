// ABOUTME: High-level orchestration of deploy, rollback, and prune runs.
// ABOUTME: Acquires the deploy lock and drives the typestate transitions.

use crate::collaborators::{ArtifactTransfer, HealthCheck, ProcessSupervisor};
use crate::config::Config;
use crate::diagnostics::Warning;
use crate::pointer::{PointerError, PointerSwitch};
use crate::probe::{ProbeGate, ProbeStatus};
use crate::retention::{self, PruneReport};
use crate::store::{Release, ReleaseStatus, ReleaseStore};
use crate::types::{ArtifactLocation, ReleaseId};

use super::Attempt;
use super::error::LifecycleError;
use super::lock::DeployLock;

/// Terminal result of a successful `deploy()` call.
#[derive(Debug)]
pub enum DeployOutcome {
    /// The new release passed verification and is live.
    Committed { release: Release },
    /// Verification failed; the previous release was restored and
    /// reconfirmed healthy.
    RolledBack {
        release: Release,
        restored: Release,
        status: ProbeStatus,
    },
}

/// What an operator rollback should re-promote.
#[derive(Debug, Clone)]
pub enum RollbackTarget {
    /// The most recently superseded release.
    Previous,
    /// A specific release id.
    To(ReleaseId),
}

/// Point-in-time view of the project state, for `status`.
#[derive(Debug)]
pub struct StatusReport {
    /// The release the pointer currently names, if initialized.
    pub current: Option<Release>,
    /// A release stranded in Verifying by an interrupted attempt.
    pub stale_verifying: Option<Release>,
    /// All non-purged releases, newest first.
    pub releases: Vec<Release>,
}

/// Drives the deploy -> verify -> commit/rollback state machine.
///
/// Holds references to the durable state (store, pointer) and the external
/// collaborators; one controller instance per project.
pub struct LifecycleController<'a> {
    config: &'a Config,
    store: &'a ReleaseStore,
    pointer: &'a PointerSwitch,
    transfer: &'a dyn ArtifactTransfer,
    health: &'a dyn HealthCheck,
    supervisor: &'a dyn ProcessSupervisor,
}

impl<'a> LifecycleController<'a> {
    pub fn new(
        config: &'a Config,
        store: &'a ReleaseStore,
        pointer: &'a PointerSwitch,
        transfer: &'a dyn ArtifactTransfer,
        health: &'a dyn HealthCheck,
        supervisor: &'a dyn ProcessSupervisor,
    ) -> Self {
        Self {
            config,
            store,
            pointer,
            transfer,
            health,
            supervisor,
        }
    }

    /// Run one full deployment attempt for the given artifact.
    ///
    /// Holds the deploy lock for the whole attempt. On verification
    /// failure the previous release is restored and reconfirmed; only a
    /// failed reconfirmation surfaces as an error (`DoubleFailure`).
    ///
    /// # Errors
    ///
    /// `DeploymentInProgress` if another attempt holds the lock,
    /// `Uninitialized` when no live release exists and `bootstrap` is
    /// false, `Transfer`/`Store`/`Pointer` errors for aborts that never
    /// touched the pointer, `BootstrapFailed` and `DoubleFailure` as
    /// described on their variants.
    pub async fn deploy(
        &self,
        artifact: &ArtifactLocation,
        bootstrap: bool,
        force_lock: bool,
    ) -> Result<DeployOutcome, LifecycleError> {
        let lock = DeployLock::acquire(&self.config.state_dir, &self.config.project, force_lock)?;

        let previous = match self.pointer.current() {
            Ok(id) => Some(self.store.get(&id)?),
            Err(PointerError::Uninitialized) if bootstrap => None,
            Err(PointerError::Uninitialized) => return Err(LifecycleError::Uninitialized),
            Err(e) => return Err(e.into()),
        };

        // Register first so a duplicate artifact is rejected before any copy.
        let destination = self.release_destination(artifact);
        let release = self.store.register(destination.clone())?;
        tracing::debug!("registered {} for {}", release.id, destination);

        if let Err(e) = self.transfer.place(artifact, &destination).await {
            // The pointer was never touched; retire the record and abort.
            self.abort_release(&release);
            return Err(LifecycleError::Transfer(e));
        }

        let attempt = Attempt::new(release, previous);

        let attempt = match attempt.stage(self.store, self.pointer) {
            Ok(attempt) => attempt,
            Err((failed, e)) => {
                self.abort_release(failed.target());
                return Err(e);
            }
        };

        let gate = ProbeGate::new(self.health, &self.config.probe);
        let timeout = self.config.probe.verify_timeout;
        let service = self.config.service_name();

        match attempt
            .verify(&gate, self.supervisor, service, timeout)
            .await
        {
            Ok(verified) => {
                let committed = verified.commit(self.store)?;
                let release = committed.finish();
                lock.release()?;
                Ok(DeployOutcome::Committed { release })
            }
            Err((failed, LifecycleError::Verification { status, .. })) => {
                if failed.previous().is_none() {
                    // First-ever deploy has nothing to revert to.
                    let id = failed.target_id().clone();
                    self.pointer.clear()?;
                    self.store.mark(&id, ReleaseStatus::RolledBack)?;
                    return Err(LifecycleError::BootstrapFailed {
                        release: id,
                        status,
                    });
                }

                let rolling = failed
                    .begin_rollback(self.store, self.pointer, self.supervisor, service)
                    .await?;
                let rolled = rolling.reconfirm(&gate, timeout).await?;
                let (release, restored) = rolled.finish();
                lock.release()?;
                Ok(DeployOutcome::RolledBack {
                    release,
                    restored,
                    status,
                })
            }
            Err((_, e)) => Err(e),
        }
    }

    /// Operator-requested rollback: re-promote an earlier release.
    ///
    /// Runs the same switch -> restart -> probe path as a deploy. If the
    /// re-promoted release fails its probe, this is fatal: the pointer is
    /// left where the switch put it and both ids are reported.
    pub async fn rollback(
        &self,
        target: RollbackTarget,
        force_lock: bool,
    ) -> Result<Release, LifecycleError> {
        let lock = DeployLock::acquire(&self.config.state_dir, &self.config.project, force_lock)?;

        let current_id = match self.pointer.current() {
            Ok(id) => id,
            Err(PointerError::Uninitialized) => return Err(LifecycleError::Uninitialized),
            Err(e) => return Err(e.into()),
        };
        let current = self.store.get(&current_id)?;

        let candidate = self.select_rollback_target(&target, &current_id)?;

        self.pointer.switch_to(&candidate.id, self.store)?;
        if let Err(e) = self.supervisor.restart(self.config.service_name()).await {
            tracing::warn!("supervisor restart failed during rollback: {e}");
        }

        let gate = ProbeGate::new(self.health, &self.config.probe);
        let status = gate
            .check(&candidate, self.config.probe.verify_timeout)
            .await;
        if !status.is_healthy() {
            return Err(LifecycleError::DoubleFailure {
                forward: current.id,
                back: candidate.id,
            });
        }

        self.store.mark(&current.id, ReleaseStatus::Superseded)?;
        let promoted = self.store.mark(&candidate.id, ReleaseStatus::Live)?;
        lock.release()?;
        Ok(promoted)
    }

    /// Prune old releases under the deploy lock.
    pub async fn prune(&self, keep_count: Option<usize>) -> Result<PruneReport, LifecycleError> {
        let lock = DeployLock::acquire(&self.config.state_dir, &self.config.project, false)?;
        let keep = keep_count.unwrap_or(self.config.retention.keep_count);
        let mut report = retention::execute(self.store, self.transfer, keep).await?;
        if let Err(e) = lock.release() {
            report
                .diagnostics
                .warn(Warning::lock_release(e.to_string()));
        }
        Ok(report)
    }

    /// Current pointer, live release, and any stranded Verifying release.
    pub fn status(&self) -> Result<StatusReport, LifecycleError> {
        let current = match self.pointer.current() {
            Ok(id) => Some(self.store.get(&id)?),
            Err(PointerError::Uninitialized) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(StatusReport {
            current,
            stale_verifying: self.store.stale_verifying()?,
            releases: self.store.list_ordered()?,
        })
    }

    /// Abort a release stranded in Verifying by an interrupted attempt.
    ///
    /// Marks it rolled back and repairs the pointer: if the pointer still
    /// names the stranded release, it is re-aimed at the live release, or
    /// cleared when none exists.
    pub fn abort_stale(&self) -> Result<Release, LifecycleError> {
        let lock = DeployLock::acquire(&self.config.state_dir, &self.config.project, false)?;

        let stale = self
            .store
            .stale_verifying()?
            .ok_or(LifecycleError::NoStrandedRelease)?;

        if self.pointer.current().ok().as_ref() == Some(&stale.id) {
            match self.store.live()? {
                Some(live) => self.pointer.switch_to(&live.id, self.store)?,
                None => self.pointer.clear()?,
            }
        }

        let aborted = self.store.mark(&stale.id, ReleaseStatus::RolledBack)?;
        lock.release()?;
        Ok(aborted)
    }

    /// Release-addressable destination for an incoming artifact.
    fn release_destination(&self, artifact: &ArtifactLocation) -> ArtifactLocation {
        let name = artifact
            .file_name()
            .unwrap_or_else(|| "artifact".to_string());
        ArtifactLocation::from(self.config.artifacts_dir.join(name).as_path())
    }

    /// Best-effort retirement of a release whose attempt aborted before
    /// any pointer movement.
    fn abort_release(&self, release: &Release) {
        let status = match release.status {
            ReleaseStatus::Staged => ReleaseStatus::Superseded,
            _ => ReleaseStatus::RolledBack,
        };
        if let Err(e) = self.store.mark(&release.id, status) {
            tracing::warn!("failed to retire aborted release {}: {e}", release.id);
        }
    }

    fn select_rollback_target(
        &self,
        target: &RollbackTarget,
        current_id: &ReleaseId,
    ) -> Result<Release, LifecycleError> {
        match target {
            RollbackTarget::Previous => self
                .store
                .list_ordered()?
                .into_iter()
                .find(|r| r.status == ReleaseStatus::Superseded && &r.id != current_id)
                .ok_or(LifecycleError::NoRollbackTarget),
            RollbackTarget::To(id) => {
                let release = self.store.get(id)?;
                let promotable = matches!(
                    release.status,
                    ReleaseStatus::Superseded | ReleaseStatus::RolledBack
                );
                if &release.id == current_id || !promotable {
                    return Err(LifecycleError::BadRollbackTarget {
                        id: release.id,
                        status: release.status,
                    });
                }
                Ok(release)
            }
        }
    }
}
