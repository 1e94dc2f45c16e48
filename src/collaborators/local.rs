// ABOUTME: Thin local adapters for the collaborator traits.
// ABOUTME: Filesystem copies for transfer, shell commands for probe and restart.

use async_trait::async_trait;
use snafu::ResultExt;
use std::time::Duration;

use super::error::{ProbeSpawnSnafu, RemoveFailedSnafu, TransferFailedSnafu};
use super::{ArtifactTransfer, CollaboratorError, HealthCheck, ProcessSupervisor};
use crate::store::Release;
use crate::types::ArtifactLocation;

/// Artifact transfer over the local filesystem.
#[derive(Debug, Default)]
pub struct FsTransfer;

#[async_trait]
impl ArtifactTransfer for FsTransfer {
    async fn place(
        &self,
        source: &ArtifactLocation,
        destination: &ArtifactLocation,
    ) -> Result<(), CollaboratorError> {
        let dest = destination.as_path();
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context(TransferFailedSnafu)?;
        }
        tokio::fs::copy(source.as_path(), &dest)
            .await
            .context(TransferFailedSnafu)?;
        Ok(())
    }

    async fn remove(&self, location: &ArtifactLocation) -> Result<(), CollaboratorError> {
        match tokio::fs::remove_file(location.as_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context(RemoveFailedSnafu),
        }
    }
}

/// Health probe that runs a user-configured shell command.
///
/// Exit status zero is healthy, non-zero unhealthy. A command that cannot
/// be spawned counts as the collaborator being unreachable.
#[derive(Debug, Clone)]
pub struct CommandHealthCheck {
    cmd: String,
}

impl CommandHealthCheck {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }
}

#[async_trait]
impl HealthCheck for CommandHealthCheck {
    async fn probe(
        &self,
        release: &Release,
        timeout: Duration,
    ) -> Result<bool, CollaboratorError> {
        let mut command = tokio::process::Command::new("sh");
        command
            .arg("-c")
            .arg(&self.cmd)
            .env("GANTRY_RELEASE", release.id.as_str())
            .env("GANTRY_ARTIFACT", release.artifact_location.as_str());

        let run = async {
            let status = command.status().await.context(ProbeSpawnSnafu)?;
            Ok::<bool, CollaboratorError>(status.success())
        };

        match tokio::time::timeout(timeout, run).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::ProbeUnreachable {
                reason: format!("probe command did not answer within {timeout:?}"),
            }),
        }
    }
}

/// Supervisor adapter that runs a configured restart command.
#[derive(Debug, Clone)]
pub struct CommandSupervisor {
    cmd: String,
}

impl CommandSupervisor {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }
}

#[async_trait]
impl ProcessSupervisor for CommandSupervisor {
    async fn restart(&self, service: &str) -> Result<(), CollaboratorError> {
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.cmd)
            .env("GANTRY_SERVICE", service)
            .output()
            .await
            .map_err(|e| CollaboratorError::RestartFailed {
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(CollaboratorError::RestartFailed {
                reason: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

/// Supervisor that does nothing, for setups where the service picks up the
/// pointer on its own.
#[derive(Debug, Default)]
pub struct NullSupervisor;

#[async_trait]
impl ProcessSupervisor for NullSupervisor {
    async fn restart(&self, _service: &str) -> Result<(), CollaboratorError> {
        Ok(())
    }
}
