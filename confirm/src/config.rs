use ledger_exec_ledger::WaitOptions;
use serde_derive::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmConfig {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ConfirmConfig {
    fn default() -> Self {
        ConfirmConfig {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConfirmOptions {
    /// hard deadline for the primary wait
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        ConfirmOptions::from_config(&ConfirmConfig::default())
    }
}

impl ConfirmOptions {
    pub fn from_config(config: &ConfirmConfig) -> Self {
        ConfirmOptions {
            timeout: Duration::from_millis(config.timeout_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub(crate) fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout: self.timeout,
            poll_interval: self.poll_interval,
        }
    }
}
