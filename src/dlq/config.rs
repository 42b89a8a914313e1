// Dead Letter Queue processor configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqConfig {
    pub enabled: bool,
    pub max_retries: u32,
    pub initial_retry_delay_secs: u64,
    pub backoff_multiplier: f64,
    pub max_retry_delay_secs: u64,
    pub batch_size: usize,
    pub max_concurrent_processing: usize,
    pub default_item_ttl_hours: u64,
}

impl Default for DlqConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 5,
            initial_retry_delay_secs: 10,
            backoff_multiplier: 2.0,
            max_retry_delay_secs: 3600,
            batch_size: 50,
            max_concurrent_processing: 8,
            default_item_ttl_hours: 72,
        }
    }
}

impl DlqConfig {
    /// A small, fast-retrying configuration suited to local development and
    /// tests.
    pub fn development() -> Self {
        Self {
            max_retries: 3,
            initial_retry_delay_secs: 1,
            max_retry_delay_secs: 30,
            batch_size: 10,
            max_concurrent_processing: 4,
            ..Self::default()
        }
    }
}
