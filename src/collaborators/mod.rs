// ABOUTME: External-collaborator interfaces consumed by the release engine.
// ABOUTME: Trait seams plus thin local adapters; real transports live elsewhere.

mod error;
mod local;
mod traits;

pub use error::CollaboratorError;
pub use local::{CommandHealthCheck, CommandSupervisor, FsTransfer, NullSupervisor};
pub use traits::{ArtifactTransfer, HealthCheck, ProcessSupervisor};
