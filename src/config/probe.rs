// ABOUTME: Health probe configuration.
// ABOUTME: Defines probe command and polling parameters with sensible defaults.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Shell command the local health-check adapter runs. Exit 0 = healthy.
    pub cmd: String,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_start_period", with = "humantime_serde")]
    pub start_period: Duration,

    /// Overall budget for one verification phase.
    #[serde(default = "default_verify_timeout", with = "humantime_serde")]
    pub verify_timeout: Duration,
}

fn default_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_retries() -> u32 {
    3
}

fn default_start_period() -> Duration {
    Duration::ZERO
}

fn default_verify_timeout() -> Duration {
    Duration::from_secs(120)
}

impl ProbeConfig {
    /// Probe settings suitable for tests: no waiting, single attempt.
    pub fn immediate(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            interval: Duration::from_millis(10),
            timeout: Duration::from_secs(5),
            retries: 0,
            start_period: Duration::ZERO,
            verify_timeout: Duration::from_secs(5),
        }
    }
}
