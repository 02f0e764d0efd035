//! Fee bidding, retrying submission and confirmation tracking for
//! fee-market ledgers.
//!
//! The pieces live in their own crates and are re-exported here. [`Engine`]
//! ties them together around one shared observation memory: every
//! confirmation it awaits feeds the statistics its next fee bid is built from.

mod config;
mod engine;

pub use crate::config::EngineConfig;
pub use crate::engine::Engine;

pub use ledger_exec_confirm::{
    await_confirmation, ConfirmConfig, ConfirmError, ConfirmOptions, SubmissionMetrics,
};
pub use ledger_exec_fee_policy::{
    build_fee_override, build_ultra_fast_fee_override, Estimator, FeeOverride, FeePolicyConfig,
    GasSample, MemoryStats, ObservationMemory,
};
pub use ledger_exec_ledger::{
    FeeMarketRates, FeeRate, LedgerClient, LedgerError, TxHash, TxHashError, WaitOptions,
};
pub use ledger_exec_retry::{
    run_with_retry, run_with_retry_cancellable, Classify, RetryConfig, RetryError, RetryExecutor,
    RetryPolicy,
};
pub use tokio_util::sync::CancellationToken;
