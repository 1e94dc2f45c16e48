// ABOUTME: Deployment lifecycle orchestration using the type state pattern.
// ABOUTME: Exports state markers, the Attempt struct, controller, and deploy lock.

mod attempt;
mod controller;
mod error;
mod lock;
mod state;
mod transitions;

pub use attempt::Attempt;
pub use controller::{DeployOutcome, LifecycleController, RollbackTarget, StatusReport};
pub use error::LifecycleError;
pub use lock::{DeployLock, LockInfo};
pub use state::{Committed, RolledBack, RollingBack, Staging, Verified, Verifying};
pub use transitions::TransitionResult;
