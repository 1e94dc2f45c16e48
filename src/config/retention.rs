// ABOUTME: Retention configuration for superseded-release pruning.
// ABOUTME: Controls how many replaced releases stay available for rollback.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// How many superseded releases to keep beyond the live one and the
    /// most recent rolled-back release.
    #[serde(default = "default_keep_count")]
    pub keep_count: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            keep_count: default_keep_count(),
        }
    }
}

fn default_keep_count() -> usize {
    3
}
