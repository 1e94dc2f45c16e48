// ABOUTME: Trait seams for the external services the release engine calls into.
// ABOUTME: Artifact transfer, health checking, and process supervision.

use async_trait::async_trait;
use std::time::Duration;

use super::CollaboratorError;
use crate::store::Release;
use crate::types::ArtifactLocation;

/// Moves built artifacts into release-addressable locations and reclaims
/// them when retention purges a release.
#[async_trait]
pub trait ArtifactTransfer: Send + Sync {
    /// Place the artifact at `source` into `destination`.
    async fn place(
        &self,
        source: &ArtifactLocation,
        destination: &ArtifactLocation,
    ) -> Result<(), CollaboratorError>;

    /// Delete the artifact at `location`. Removing an already-absent
    /// artifact is not an error.
    async fn remove(&self, location: &ArtifactLocation) -> Result<(), CollaboratorError>;
}

/// The network/process probe backing the health gate.
///
/// `Ok(true)` means the service responded healthy, `Ok(false)` that it
/// responded unhealthy. An error whose `is_unreachable()` is true means
/// the collaborator itself could not be consulted.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn probe(&self, release: &Release, timeout: Duration)
        -> Result<bool, CollaboratorError>;
}

/// Control interface of whatever supervises the running service, invoked
/// after a pointer switch so the new release takes effect.
#[async_trait]
pub trait ProcessSupervisor: Send + Sync {
    async fn restart(&self, service: &str) -> Result<(), CollaboratorError>;
}
