// ABOUTME: Health probe gate interpreting collaborator results as pass/fail.
// ABOUTME: Polls with retries and distinguishes Unhealthy from Inconclusive.

use std::time::Duration;

use crate::collaborators::HealthCheck;
use crate::config::ProbeConfig;
use crate::store::Release;

/// Verdict of one verification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// The service responded and reported healthy.
    Healthy,
    /// The service responded and reported failure (or the overall budget
    /// ran out). Triggers automatic rollback.
    Unhealthy,
    /// The probe collaborator itself could not be reached. Also blocks
    /// commit, but is surfaced to the operator as needing manual
    /// inspection rather than a silent service failure.
    Inconclusive,
}

impl ProbeStatus {
    pub fn is_healthy(self) -> bool {
        matches!(self, ProbeStatus::Healthy)
    }
}

/// Drives the health-check collaborator with the configured polling
/// parameters and reduces the attempts to a single verdict.
pub struct ProbeGate<'a> {
    health: &'a dyn HealthCheck,
    config: &'a ProbeConfig,
}

impl<'a> ProbeGate<'a> {
    pub fn new(health: &'a dyn HealthCheck, config: &'a ProbeConfig) -> Self {
        Self { health, config }
    }

    /// Probe until healthy, retries are exhausted, or the overall timeout
    /// expires.
    ///
    /// A run whose final failure was the collaborator being unreachable
    /// reports `Inconclusive`; exhausting the overall budget reports
    /// `Unhealthy`, same as a negative response.
    pub async fn check(&self, release: &Release, timeout: Duration) -> ProbeStatus {
        if self.config.start_period > Duration::ZERO {
            tokio::time::sleep(self.config.start_period).await;
        }

        let start = std::time::Instant::now();
        let mut retries_remaining = self.config.retries;

        loop {
            if start.elapsed() >= timeout {
                return ProbeStatus::Unhealthy;
            }

            let verdict = match self.health.probe(release, self.config.timeout).await {
                Ok(true) => return ProbeStatus::Healthy,
                Ok(false) => ProbeStatus::Unhealthy,
                Err(e) if e.is_unreachable() => {
                    tracing::warn!("probe collaborator unreachable: {e}");
                    ProbeStatus::Inconclusive
                }
                Err(e) => {
                    tracing::warn!("probe failed: {e}");
                    ProbeStatus::Unhealthy
                }
            };

            if retries_remaining == 0 {
                return verdict;
            }
            retries_remaining -= 1;

            tokio::time::sleep(self.config.interval).await;
        }
    }
}
