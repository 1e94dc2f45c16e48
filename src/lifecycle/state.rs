// ABOUTME: Deployment attempt state marker types for the type state pattern.
// ABOUTME: Zero-sized types enforce valid lifecycle transitions at compile time.

/// Initial state: release registered, artifact placed, pointer untouched.
/// Available actions: `stage()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Staging;

/// Pointer aimed at the new release, health verification pending.
/// Available actions: `verify()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Verifying;

/// Probe reported healthy. Available actions: `commit()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Verified;

/// Committed: new release is live, old one superseded. Terminal success.
#[derive(Debug, Clone, Copy, Default)]
pub struct Committed;

/// Pointer reverted to the previous release, reconfirmation pending.
/// Available actions: `reconfirm()`
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingBack;

/// Rolled back: previous release reconfirmed healthy. Terminal failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolledBack;
