// ABOUTME: Shared test doubles for the collaborator interfaces.
// ABOUTME: Scripted probes and recording transfer/supervisor adapters.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use gantry::collaborators::{
    ArtifactTransfer, CollaboratorError, HealthCheck, ProcessSupervisor,
};
use gantry::config::{Config, ProbeConfig, RetentionConfig};
use gantry::store::Release;
use gantry::types::{ArtifactLocation, ProjectName};

/// One scripted probe response.
#[derive(Debug, Clone, Copy)]
pub enum ProbeScript {
    Healthy,
    Unhealthy,
    /// The collaborator itself cannot be reached.
    Unreachable,
}

/// Health check double that replays a fixed script, then reports healthy.
pub struct ScriptedProbe {
    responses: Mutex<VecDeque<ProbeScript>>,
    pub probed: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new(script: Vec<ProbeScript>) -> Self {
        Self {
            responses: Mutex::new(script.into()),
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn always_healthy() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl HealthCheck for ScriptedProbe {
    async fn probe(
        &self,
        release: &Release,
        _timeout: Duration,
    ) -> Result<bool, CollaboratorError> {
        self.probed.lock().push(release.id.to_string());
        match self.responses.lock().pop_front() {
            Some(ProbeScript::Healthy) | None => Ok(true),
            Some(ProbeScript::Unhealthy) => Ok(false),
            Some(ProbeScript::Unreachable) => Err(CollaboratorError::ProbeUnreachable {
                reason: "scripted outage".to_string(),
            }),
        }
    }
}

/// Transfer double that records calls and can be told to fail placements.
#[derive(Default)]
pub struct RecordingTransfer {
    pub placed: Mutex<Vec<(String, String)>>,
    pub removed: Mutex<Vec<String>>,
    fail_place: AtomicBool,
}

impl RecordingTransfer {
    pub fn failing() -> Self {
        let transfer = Self::default();
        transfer.fail_place.store(true, Ordering::SeqCst);
        transfer
    }
}

#[async_trait]
impl ArtifactTransfer for RecordingTransfer {
    async fn place(
        &self,
        source: &ArtifactLocation,
        destination: &ArtifactLocation,
    ) -> Result<(), CollaboratorError> {
        if self.fail_place.load(Ordering::SeqCst) {
            return Err(CollaboratorError::TransferFailed {
                source: std::io::Error::other("injected transfer failure"),
            });
        }
        self.placed
            .lock()
            .push((source.to_string(), destination.to_string()));
        Ok(())
    }

    async fn remove(&self, location: &ArtifactLocation) -> Result<(), CollaboratorError> {
        self.removed.lock().push(location.to_string());
        Ok(())
    }
}

/// Supervisor double that records restart calls.
#[derive(Default)]
pub struct RecordingSupervisor {
    pub restarts: Mutex<Vec<String>>,
}

#[async_trait]
impl ProcessSupervisor for RecordingSupervisor {
    async fn restart(&self, service: &str) -> Result<(), CollaboratorError> {
        self.restarts.lock().push(service.to_string());
        Ok(())
    }
}

/// A config rooted in a temp directory with no-wait probe settings.
pub fn test_config(root: &Path) -> Config {
    Config {
        project: ProjectName::new("testapp").unwrap(),
        service: None,
        state_dir: root.join("state"),
        artifacts_dir: root.join("artifacts"),
        probe: ProbeConfig::immediate("true"),
        retention: RetentionConfig::default(),
        restart_cmd: None,
    }
}

/// Create a dummy artifact file and return its location.
pub fn artifact_file(root: &Path, name: &str) -> ArtifactLocation {
    let path = root.join(name);
    std::fs::write(&path, name).unwrap();
    ArtifactLocation::from(path.as_path())
}
