// ABOUTME: Integration tests for the deploy lock.
// ABOUTME: Covers contention, release, stale breaking, and forced acquisition.

use chrono::Utc;
use std::fs;

use gantry::lifecycle::{DeployLock, LifecycleError, LockInfo};
use gantry::types::ProjectName;

fn project() -> ProjectName {
    ProjectName::new("myapp").unwrap()
}

#[test]
fn acquire_creates_lock_file() {
    let dir = tempfile::tempdir().unwrap();
    let project = project();

    let lock = DeployLock::acquire(dir.path(), &project, false).unwrap();
    assert!(LockInfo::lock_path(dir.path(), &project).exists());

    lock.release().unwrap();
    assert!(!LockInfo::lock_path(dir.path(), &project).exists());
}

#[test]
fn second_acquire_reports_the_holder() {
    let dir = tempfile::tempdir().unwrap();
    let project = project();

    let _held = DeployLock::acquire(dir.path(), &project, false).unwrap();
    let err = DeployLock::acquire(dir.path(), &project, false).unwrap_err();

    let LifecycleError::DeploymentInProgress { holder, pid, .. } = err else {
        panic!("expected deployment-in-progress, got {err:?}");
    };
    assert!(!holder.is_empty());
    assert_eq!(pid, std::process::id());
}

#[test]
fn locks_are_scoped_per_project() {
    let dir = tempfile::tempdir().unwrap();

    let _a = DeployLock::acquire(dir.path(), &ProjectName::new("app-a").unwrap(), false).unwrap();
    // A different project is unaffected.
    DeployLock::acquire(dir.path(), &ProjectName::new("app-b").unwrap(), false).unwrap();
}

#[test]
fn drop_releases_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    let project = project();

    {
        let _lock = DeployLock::acquire(dir.path(), &project, false).unwrap();
    }
    assert!(!LockInfo::lock_path(dir.path(), &project).exists());

    DeployLock::acquire(dir.path(), &project, false).unwrap();
}

#[test]
fn stale_lock_is_broken_automatically() {
    let dir = tempfile::tempdir().unwrap();
    let project = project();
    let path = LockInfo::lock_path(dir.path(), &project);
    fs::create_dir_all(path.parent().unwrap()).unwrap();

    let mut info = LockInfo::new(&project);
    info.started_at = Utc::now() - chrono::Duration::hours(2);
    fs::write(&path, serde_json::to_string(&info).unwrap()).unwrap();

    DeployLock::acquire(dir.path(), &project, false).unwrap();
}

#[test]
fn corrupt_lock_is_broken() {
    let dir = tempfile::tempdir().unwrap();
    let project = project();
    let path = LockInfo::lock_path(dir.path(), &project);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "not json").unwrap();

    DeployLock::acquire(dir.path(), &project, false).unwrap();
}

#[test]
fn force_breaks_a_fresh_lock() {
    let dir = tempfile::tempdir().unwrap();
    let project = project();

    // Leave a fresh lock file behind without a guard to drop it.
    let info = LockInfo::new(&project);
    let path = LockInfo::lock_path(dir.path(), &project);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, serde_json::to_string(&info).unwrap()).unwrap();

    let err = DeployLock::acquire(dir.path(), &project, false).unwrap_err();
    assert!(matches!(err, LifecycleError::DeploymentInProgress { .. }));

    DeployLock::acquire(dir.path(), &project, true).unwrap();
}
