// ABOUTME: Scenario tests for the deployment lifecycle controller.
// ABOUTME: Drives deploy/rollback/prune against scripted collaborator doubles.

mod support;

use std::path::Path;

use gantry::config::Config;
use gantry::lifecycle::{
    DeployLock, DeployOutcome, LifecycleController, LifecycleError, RollbackTarget,
};
use gantry::pointer::{PointerError, PointerSwitch};
use gantry::probe::ProbeStatus;
use gantry::store::{ReleaseStatus, ReleaseStore, StoreError};
use gantry::types::ReleaseId;

use support::{
    ProbeScript, RecordingSupervisor, RecordingTransfer, ScriptedProbe, artifact_file,
    test_config,
};

struct Harness {
    config: Config,
    store: ReleaseStore,
    pointer: PointerSwitch,
}

impl Harness {
    fn new(root: &Path) -> Self {
        let config = test_config(root);
        let store = ReleaseStore::open(&config.state_dir).unwrap();
        let pointer = PointerSwitch::open(&config.state_dir).unwrap();
        Self {
            config,
            store,
            pointer,
        }
    }

    fn controller<'a>(
        &'a self,
        transfer: &'a RecordingTransfer,
        probe: &'a ScriptedProbe,
        supervisor: &'a RecordingSupervisor,
    ) -> LifecycleController<'a> {
        LifecycleController::new(
            &self.config,
            &self.store,
            &self.pointer,
            transfer,
            probe,
            supervisor,
        )
    }

    fn status_of(&self, id: &str) -> ReleaseStatus {
        self.store
            .get(&ReleaseId::new(id.to_string()))
            .unwrap()
            .status
    }
}

/// Deploy one healthy release so later tests start from a live system.
async fn deploy_healthy(harness: &Harness, root: &Path, name: &str, bootstrap: bool) {
    let transfer = RecordingTransfer::default();
    let probe = ScriptedProbe::always_healthy();
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    let artifact = artifact_file(root, name);
    let outcome = controller.deploy(&artifact, bootstrap, false).await.unwrap();
    assert!(matches!(outcome, DeployOutcome::Committed { .. }));
}

#[tokio::test]
async fn bootstrap_deploy_commits_and_goes_live() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());

    let transfer = RecordingTransfer::default();
    let probe = ScriptedProbe::always_healthy();
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    let artifact = artifact_file(dir.path(), "v1.tar");
    let outcome = controller.deploy(&artifact, true, false).await.unwrap();

    let DeployOutcome::Committed { release } = outcome else {
        panic!("expected committed outcome");
    };
    assert_eq!(release.id.as_str(), "r1");
    assert_eq!(release.status, ReleaseStatus::Live);
    assert_eq!(harness.pointer.current().unwrap(), release.id);

    // Artifact was placed into the release-addressable location.
    let placed = transfer.placed.lock();
    assert_eq!(placed.len(), 1);
    assert!(placed[0].1.contains("artifacts"));

    // Supervisor restarted once for the switch.
    assert_eq!(supervisor.restarts.lock().as_slice(), ["testapp"]);
}

#[tokio::test]
async fn deploy_on_uninitialized_system_requires_bootstrap() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());

    let transfer = RecordingTransfer::default();
    let probe = ScriptedProbe::always_healthy();
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    let artifact = artifact_file(dir.path(), "v1.tar");
    let err = controller.deploy(&artifact, false, false).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Uninitialized));

    // Nothing was registered or placed.
    assert!(harness.store.list_ordered().unwrap().is_empty());
    assert!(transfer.placed.lock().is_empty());
}

#[tokio::test]
async fn healthy_deploy_supersedes_previous_live() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    deploy_healthy(&harness, dir.path(), "v1.tar", true).await;
    deploy_healthy(&harness, dir.path(), "v2.tar", false).await;

    assert_eq!(harness.pointer.current().unwrap().as_str(), "r2");
    assert_eq!(harness.status_of("r2"), ReleaseStatus::Live);
    assert_eq!(harness.status_of("r1"), ReleaseStatus::Superseded);

    // Exactly one live release.
    let live: Vec<_> = harness
        .store
        .list_ordered()
        .unwrap()
        .into_iter()
        .filter(|r| r.status == ReleaseStatus::Live)
        .collect();
    assert_eq!(live.len(), 1);
}

#[tokio::test]
async fn unhealthy_deploy_rolls_back_to_previous() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    deploy_healthy(&harness, dir.path(), "v1.tar", true).await;
    deploy_healthy(&harness, dir.path(), "v2.tar", false).await;

    // r3 fails verification; reconfirmation of r2 passes.
    let transfer = RecordingTransfer::default();
    let probe = ScriptedProbe::new(vec![ProbeScript::Unhealthy, ProbeScript::Healthy]);
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    let artifact = artifact_file(dir.path(), "v3.tar");
    let outcome = controller.deploy(&artifact, false, false).await.unwrap();

    let DeployOutcome::RolledBack {
        release,
        restored,
        status,
    } = outcome
    else {
        panic!("expected rolled-back outcome");
    };
    assert_eq!(release.id.as_str(), "r3");
    assert_eq!(release.status, ReleaseStatus::RolledBack);
    assert_eq!(restored.id.as_str(), "r2");
    assert_eq!(status, ProbeStatus::Unhealthy);

    assert_eq!(harness.pointer.current().unwrap().as_str(), "r2");
    assert_eq!(harness.status_of("r2"), ReleaseStatus::Live);

    // Both r3 and r2 were probed; service restarted forward and back.
    assert_eq!(probe.probed.lock().as_slice(), ["r3", "r2"]);
    assert_eq!(supervisor.restarts.lock().len(), 2);
}

#[tokio::test]
async fn inconclusive_probe_blocks_commit_and_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    deploy_healthy(&harness, dir.path(), "v1.tar", true).await;

    let transfer = RecordingTransfer::default();
    let probe = ScriptedProbe::new(vec![ProbeScript::Unreachable, ProbeScript::Healthy]);
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    let artifact = artifact_file(dir.path(), "v2.tar");
    let outcome = controller.deploy(&artifact, false, false).await.unwrap();

    let DeployOutcome::RolledBack { status, .. } = outcome else {
        panic!("expected rolled-back outcome");
    };
    // Surfaced as inconclusive, not as a plain service failure.
    assert_eq!(status, ProbeStatus::Inconclusive);
    assert_eq!(harness.pointer.current().unwrap().as_str(), "r1");
}

#[tokio::test]
async fn failed_reconfirmation_is_a_double_failure() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    deploy_healthy(&harness, dir.path(), "v1.tar", true).await;

    let transfer = RecordingTransfer::default();
    let probe = ScriptedProbe::new(vec![ProbeScript::Unhealthy, ProbeScript::Unhealthy]);
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    let artifact = artifact_file(dir.path(), "v2.tar");
    let err = controller.deploy(&artifact, false, false).await.unwrap_err();

    let LifecycleError::DoubleFailure { forward, back } = err else {
        panic!("expected double failure, got {err:?}");
    };
    assert_eq!(forward.as_str(), "r2");
    assert_eq!(back.as_str(), "r1");

    // Pointer left exactly where the reversal set it, not changed further.
    assert_eq!(harness.pointer.current().unwrap().as_str(), "r1");
    assert_eq!(harness.status_of("r2"), ReleaseStatus::RolledBack);
    assert_eq!(harness.status_of("r1"), ReleaseStatus::Live);
}

#[tokio::test]
async fn bootstrap_failure_returns_to_uninitialized() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());

    let transfer = RecordingTransfer::default();
    let probe = ScriptedProbe::new(vec![ProbeScript::Unhealthy]);
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    let artifact = artifact_file(dir.path(), "v1.tar");
    let err = controller.deploy(&artifact, true, false).await.unwrap_err();
    assert!(matches!(err, LifecycleError::BootstrapFailed { .. }));

    assert!(matches!(
        harness.pointer.current(),
        Err(PointerError::Uninitialized)
    ));
    assert_eq!(harness.status_of("r1"), ReleaseStatus::RolledBack);
}

#[tokio::test]
async fn transfer_failure_aborts_without_touching_pointer() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    deploy_healthy(&harness, dir.path(), "v1.tar", true).await;

    let transfer = RecordingTransfer::failing();
    let probe = ScriptedProbe::always_healthy();
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    let artifact = artifact_file(dir.path(), "v2.tar");
    let err = controller.deploy(&artifact, false, false).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Transfer(_)));

    assert_eq!(harness.pointer.current().unwrap().as_str(), "r1");
    assert_eq!(harness.status_of("r1"), ReleaseStatus::Live);
    // The aborted registration is retired, not left staged.
    assert_eq!(harness.status_of("r2"), ReleaseStatus::Superseded);
    // No probe or restart ever happened.
    assert!(probe.probed.lock().is_empty());
    assert!(supervisor.restarts.lock().is_empty());
}

#[tokio::test]
async fn duplicate_artifact_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    deploy_healthy(&harness, dir.path(), "v1.tar", true).await;

    let transfer = RecordingTransfer::default();
    let probe = ScriptedProbe::always_healthy();
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    let artifact = artifact_file(dir.path(), "v1.tar");
    let err = controller.deploy(&artifact, false, false).await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Store(StoreError::DuplicateArtifact(_))
    ));
}

#[tokio::test]
async fn concurrent_deploy_is_rejected_while_lock_held() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    deploy_healthy(&harness, dir.path(), "v1.tar", true).await;

    let held = DeployLock::acquire(&harness.config.state_dir, &harness.config.project, false)
        .unwrap();

    let transfer = RecordingTransfer::default();
    let probe = ScriptedProbe::always_healthy();
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    let artifact = artifact_file(dir.path(), "v2.tar");
    let err = controller.deploy(&artifact, false, false).await.unwrap_err();

    let LifecycleError::DeploymentInProgress { holder, pid, .. } = err else {
        panic!("expected deployment-in-progress, got {err:?}");
    };
    assert!(!holder.is_empty());
    assert_eq!(pid, std::process::id());

    held.release().unwrap();

    // Safe to retry after release.
    let outcome = controller.deploy(&artifact, false, false).await.unwrap();
    assert!(matches!(outcome, DeployOutcome::Committed { .. }));
}

#[tokio::test]
async fn operator_rollback_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    deploy_healthy(&harness, dir.path(), "v1.tar", true).await;
    deploy_healthy(&harness, dir.path(), "v2.tar", false).await;

    let transfer = RecordingTransfer::default();
    let probe = ScriptedProbe::always_healthy();
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    // Roll back to the previous release.
    let promoted = controller
        .rollback(RollbackTarget::Previous, false)
        .await
        .unwrap();
    assert_eq!(promoted.id.as_str(), "r1");
    assert_eq!(harness.pointer.current().unwrap().as_str(), "r1");
    assert_eq!(harness.status_of("r1"), ReleaseStatus::Live);
    assert_eq!(harness.status_of("r2"), ReleaseStatus::Superseded);

    // And forward again: X -> Y -> X leaves X live, Y superseded.
    let promoted = controller
        .rollback(
            RollbackTarget::To(ReleaseId::new("r2".to_string())),
            false,
        )
        .await
        .unwrap();
    assert_eq!(promoted.id.as_str(), "r2");
    assert_eq!(harness.status_of("r2"), ReleaseStatus::Live);
    assert_eq!(harness.status_of("r1"), ReleaseStatus::Superseded);
}

#[tokio::test]
async fn operator_rollback_rejects_bad_targets() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    deploy_healthy(&harness, dir.path(), "v1.tar", true).await;

    let transfer = RecordingTransfer::default();
    let probe = ScriptedProbe::always_healthy();
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    // Nothing superseded yet.
    let err = controller
        .rollback(RollbackTarget::Previous, false)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NoRollbackTarget));

    // The live release is not a rollback target.
    let err = controller
        .rollback(
            RollbackTarget::To(ReleaseId::new("r1".to_string())),
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::BadRollbackTarget { .. }));

    // Unknown ids surface as not-found.
    let err = controller
        .rollback(
            RollbackTarget::To(ReleaseId::new("r9".to_string())),
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Store(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn operator_rollback_probe_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    deploy_healthy(&harness, dir.path(), "v1.tar", true).await;
    deploy_healthy(&harness, dir.path(), "v2.tar", false).await;

    let transfer = RecordingTransfer::default();
    let probe = ScriptedProbe::new(vec![ProbeScript::Unhealthy]);
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    let err = controller
        .rollback(RollbackTarget::Previous, false)
        .await
        .unwrap_err();
    assert!(err.is_fatal());

    let LifecycleError::DoubleFailure { forward, back } = err else {
        panic!("expected double failure, got {err:?}");
    };
    assert_eq!(forward.as_str(), "r2");
    assert_eq!(back.as_str(), "r1");

    // Pointer left where the switch put it; statuses untouched.
    assert_eq!(harness.pointer.current().unwrap().as_str(), "r1");
    assert_eq!(harness.status_of("r2"), ReleaseStatus::Live);
    assert_eq!(harness.status_of("r1"), ReleaseStatus::Superseded);
}

#[tokio::test]
async fn abort_repairs_a_stranded_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    deploy_healthy(&harness, dir.path(), "v1.tar", true).await;

    // Simulate a crash after mark(Verifying) and the pointer switch.
    let stranded = harness
        .store
        .register(gantry::types::ArtifactLocation::parse("/srv/a/v2.tar").unwrap())
        .unwrap();
    harness
        .store
        .mark(&stranded.id, ReleaseStatus::Verifying)
        .unwrap();
    harness
        .pointer
        .switch_to(&stranded.id, &harness.store)
        .unwrap();

    let transfer = RecordingTransfer::default();
    let probe = ScriptedProbe::always_healthy();
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    let aborted = controller.abort_stale().unwrap();
    assert_eq!(aborted.id, stranded.id);
    assert_eq!(aborted.status, ReleaseStatus::RolledBack);

    // Pointer re-aimed at the surviving live release.
    assert_eq!(harness.pointer.current().unwrap().as_str(), "r1");

    // A second abort has nothing to do.
    let err = controller.abort_stale().unwrap_err();
    assert!(matches!(err, LifecycleError::NoStrandedRelease));
}

#[tokio::test]
async fn prune_under_lock_reclaims_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    deploy_healthy(&harness, dir.path(), "v1.tar", true).await;
    deploy_healthy(&harness, dir.path(), "v2.tar", false).await;
    deploy_healthy(&harness, dir.path(), "v3.tar", false).await;

    let transfer = RecordingTransfer::default();
    let probe = ScriptedProbe::always_healthy();
    let supervisor = RecordingSupervisor::default();
    let controller = harness.controller(&transfer, &probe, &supervisor);

    // Keep zero superseded releases: r1 and r2 go, r3 stays live.
    let report = controller.prune(Some(0)).await.unwrap();
    let purged: Vec<&str> = report.purged.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(purged, vec!["r2", "r1"]);
    assert_eq!(transfer.removed.lock().len(), 2);
    assert_eq!(harness.status_of("r3"), ReleaseStatus::Live);

    // Idempotent: a second pass has nothing left to purge.
    let report = controller.prune(Some(0)).await.unwrap();
    assert!(report.purged.is_empty());
}
