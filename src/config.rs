use ledger_exec_confirm::ConfirmConfig;
use ledger_exec_fee_policy::{FeePolicyConfig, DEFAULT_MEMORY_CAPACITY};
use ledger_exec_retry::RetryConfig;
use serde_derive::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fee_policy: FeePolicyConfig,
    pub confirm: ConfirmConfig,
    pub retry: RetryConfig,
    /// how many recent confirmations drive fee bids
    pub memory_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            fee_policy: FeePolicyConfig::default(),
            confirm: ConfirmConfig::default(),
            retry: RetryConfig::default(),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}
