use serde_derive::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    /// delay after the first failed attempt, doubled on each later one
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// upper bound (exclusive) of the random delay added to each backoff
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 5_000,
            jitter_ms: 200,
        }
    }
}

impl RetryConfig {
    /// Sleep after failed `attempt` (1-based) given an already drawn jitter,
    /// capped at `max_delay_ms`.
    pub fn delay(&self, attempt: u32, jitter_ms: u64) -> Duration {
        let exp = attempt.saturating_sub(1).min(63);
        let delay = self
            .base_delay_ms
            .saturating_mul(1u64 << exp)
            .saturating_add(jitter_ms);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}
