// ABOUTME: Error types for the external-collaborator boundary.
// ABOUTME: Uses snafu for context-carrying errors at the process/network edge.

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CollaboratorError {
    #[snafu(display("artifact transfer failed: {source}"))]
    TransferFailed { source: std::io::Error },

    #[snafu(display("artifact removal failed: {source}"))]
    RemoveFailed { source: std::io::Error },

    #[snafu(display("health-check collaborator unreachable: {reason}"))]
    ProbeUnreachable { reason: String },

    #[snafu(display("health-check command could not be started: {source}"))]
    ProbeSpawn { source: std::io::Error },

    #[snafu(display("supervisor restart failed: {reason}"))]
    RestartFailed { reason: String },
}

impl CollaboratorError {
    /// Whether this failure means the collaborator itself could not be
    /// reached (as opposed to reporting a negative result). Drives the
    /// Healthy/Unhealthy/Inconclusive distinction in the probe gate.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            CollaboratorError::ProbeUnreachable { .. } | CollaboratorError::ProbeSpawn { .. }
        )
    }
}
