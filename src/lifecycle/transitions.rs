// ABOUTME: State transition methods for the deployment lifecycle.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::marker::PhantomData;
use std::time::Duration;

use crate::collaborators::ProcessSupervisor;
use crate::pointer::PointerSwitch;
use crate::probe::{ProbeGate, ProbeStatus};
use crate::store::{ReleaseStatus, ReleaseStore};

use super::Attempt;
use super::error::LifecycleError;
use super::state::{Committed, RolledBack, RollingBack, Staging, Verified, Verifying};

/// Result type for transitions that may need rollback on failure.
///
/// On failure the attempt is handed back alongside the error so the
/// caller can drive the rollback path.
pub type TransitionResult<T, S> = Result<Attempt<T>, (Attempt<S>, LifecycleError)>;

impl<S> Attempt<S> {
    /// Internal helper to transition to a new state.
    fn transition<T>(self) -> Attempt<T> {
        Attempt {
            id: self.id,
            target: self.target,
            previous: self.previous,
            _state: PhantomData,
        }
    }
}

// =============================================================================
// Staging -> Verifying
// =============================================================================

impl Attempt<Staging> {
    /// Mark the target release Verifying and aim the pointer at it.
    ///
    /// The pointer moves before commit so verification exercises the real
    /// live path; `previous` stays resolvable for immediate reversal. A
    /// failure here means the pointer may not have moved — the caller
    /// aborts without any rollback.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` so the caller can abort the attempt.
    #[must_use = "attempt state must be used"]
    pub fn stage(
        mut self,
        store: &ReleaseStore,
        pointer: &PointerSwitch,
    ) -> TransitionResult<Verifying, Staging> {
        match store.mark(&self.target.id, ReleaseStatus::Verifying) {
            Ok(updated) => self.target = updated,
            Err(e) => return Err((self, e.into())),
        }

        if let Err(e) = pointer.switch_to(&self.target.id, store) {
            return Err((self, e.into()));
        }

        tracing::debug!("attempt {}: {} is verifying", self.id, self.target.id);
        Ok(self.transition())
    }
}

// =============================================================================
// Verifying -> Verified (or back to Verifying for rollback)
// =============================================================================

impl Attempt<Verifying> {
    /// Restart the supervised service and run the health probe gate.
    ///
    /// A supervisor restart failure is treated as an unhealthy result: the
    /// pointer has already moved, so the only safe forward path is the
    /// rollback machinery.
    ///
    /// # Errors
    ///
    /// Returns `(self, LifecycleError::Verification)` to allow rollback.
    #[must_use = "attempt state must be used"]
    pub async fn verify(
        self,
        gate: &ProbeGate<'_>,
        supervisor: &dyn ProcessSupervisor,
        service: &str,
        timeout: Duration,
    ) -> TransitionResult<Verified, Verifying> {
        if let Err(e) = supervisor.restart(service).await {
            tracing::warn!("supervisor restart failed after pointer switch: {e}");
            let release = self.target.id.clone();
            return Err((
                self,
                LifecycleError::Verification {
                    release,
                    status: ProbeStatus::Unhealthy,
                },
            ));
        }

        match gate.check(&self.target, timeout).await {
            ProbeStatus::Healthy => Ok(self.transition()),
            status => {
                let release = self.target.id.clone();
                Err((self, LifecycleError::Verification { release, status }))
            }
        }
    }

    /// Reverse the pointer switch back to the previous release.
    ///
    /// Restores the pointer, restarts the service, and marks the target
    /// rolled back. A restart failure is logged but does not stop the
    /// reversal: the reconfirmation probe will catch a service that did
    /// not come back.
    ///
    /// # Errors
    ///
    /// Returns an error if the pointer or store cannot be updated.
    #[must_use = "attempt state must be used"]
    pub async fn begin_rollback(
        mut self,
        store: &ReleaseStore,
        pointer: &PointerSwitch,
        supervisor: &dyn ProcessSupervisor,
        service: &str,
    ) -> Result<Attempt<RollingBack>, LifecycleError> {
        let previous = self
            .previous
            .as_ref()
            .expect("rollback requires a previous release");

        pointer.switch_to(&previous.id, store)?;

        if let Err(e) = supervisor.restart(service).await {
            tracing::warn!("supervisor restart failed during rollback: {e}");
        }

        self.target = store.mark(&self.target.id, ReleaseStatus::RolledBack)?;
        tracing::debug!("attempt {}: pointer reverted, {} rolled back", self.id, self.target.id);
        Ok(self.transition())
    }
}

// =============================================================================
// Verified -> Committed
// =============================================================================

impl Attempt<Verified> {
    /// Commit the attempt: the old live release becomes Superseded, the
    /// target becomes Live.
    ///
    /// The old release is superseded first so at most one release is ever
    /// Live. A crash between the two marks leaves the pointer at a
    /// Verifying release, which `status` reports for repair.
    ///
    /// # Errors
    ///
    /// Returns an error if either mark fails to persist.
    #[must_use = "attempt state must be used"]
    pub fn commit(mut self, store: &ReleaseStore) -> Result<Attempt<Committed>, LifecycleError> {
        if let Some(previous) = &self.previous {
            store.mark(&previous.id, ReleaseStatus::Superseded)?;
        }
        self.target = store.mark(&self.target.id, ReleaseStatus::Live)?;
        tracing::debug!("attempt {}: {} committed live", self.id, self.target.id);
        Ok(self.transition())
    }
}

// =============================================================================
// RollingBack -> RolledBack
// =============================================================================

impl Attempt<RollingBack> {
    /// Re-confirm that the restored release is actually healthy.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::DoubleFailure` if the reconfirmation probe
    /// also fails. The pointer is left exactly as the reversal set it.
    #[must_use = "attempt state must be used"]
    pub async fn reconfirm(
        self,
        gate: &ProbeGate<'_>,
        timeout: Duration,
    ) -> Result<Attempt<RolledBack>, LifecycleError> {
        let previous = self
            .previous
            .as_ref()
            .expect("rollback requires a previous release");

        match gate.check(previous, timeout).await {
            ProbeStatus::Healthy => Ok(self.transition()),
            status => {
                tracing::warn!(
                    "reconfirmation of {} reported {:?} after rollback",
                    previous.id,
                    status
                );
                Err(LifecycleError::DoubleFailure {
                    forward: self.target.id.clone(),
                    back: previous.id.clone(),
                })
            }
        }
    }
}
