// ABOUTME: Generic deployment attempt struct parameterized by state marker.
// ABOUTME: Ephemeral; only the Release and Pointer state it produces survives.

use std::marker::PhantomData;

use crate::store::Release;
use crate::types::{AttemptId, ReleaseId};

use super::state::{Committed, RolledBack, Staging};

/// One lifecycle run, parameterized by its current state.
///
/// Carries the target release and the release that was live when the
/// attempt began (`previous`). `previous` is `None` only for an explicit
/// bootstrap deploy. Never persisted: crash recovery works from the
/// Release and Pointer records alone.
#[derive(Debug)]
pub struct Attempt<S> {
    pub(crate) id: AttemptId,
    pub(crate) target: Release,
    pub(crate) previous: Option<Release>,
    pub(crate) _state: PhantomData<S>,
}

impl Attempt<Staging> {
    /// Begin an attempt for a freshly registered release.
    pub fn new(target: Release, previous: Option<Release>) -> Self {
        Attempt {
            id: AttemptId::generate(),
            target,
            previous,
            _state: PhantomData,
        }
    }
}

impl<S> Attempt<S> {
    /// Log-correlation id for this run.
    pub fn id(&self) -> &AttemptId {
        &self.id
    }

    /// The release this attempt is trying to make live.
    pub fn target(&self) -> &Release {
        &self.target
    }

    /// The release that was live when the attempt began, if any.
    pub fn previous(&self) -> Option<&Release> {
        self.previous.as_ref()
    }

    pub fn target_id(&self) -> &ReleaseId {
        &self.target.id
    }
}

impl Attempt<Committed> {
    /// Consume the attempt and return the now-live release.
    pub fn finish(self) -> Release {
        self.target
    }
}

impl Attempt<RolledBack> {
    /// Consume the attempt, returning (rolled-back target, restored release).
    pub fn finish(self) -> (Release, Release) {
        let restored = self
            .previous
            .expect("rolled-back attempt always has a previous release");
        (self.target, restored)
    }
}
