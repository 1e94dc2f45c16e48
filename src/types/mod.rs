// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod artifact;
mod id;
mod project_name;

pub use artifact::{ArtifactLocation, ParseArtifactError};
pub use id::{AttemptId, ReleaseId};
pub use project_name::{ProjectName, ProjectNameError};
