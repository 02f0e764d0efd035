use crate::config::EngineConfig;
use ledger_exec_confirm::{await_confirmation, ConfirmError, ConfirmOptions, SubmissionMetrics};
use ledger_exec_fee_policy::{
    Estimator, FeeOverride, FeePolicyConfig, GasSample, MemoryStats, ObservationMemory,
};
use ledger_exec_ledger::{LedgerClient, TxHash};
use ledger_exec_retry::{Classify, RetryError, RetryExecutor, RetryPolicy};
use log::info;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Handle to one execution engine.
///
/// Clones share the same observation memory, so a bid built from any clone
/// sees confirmations awaited through every other clone.
#[derive(Clone)]
pub struct Engine {
    memory: Arc<Mutex<ObservationMemory>>,
    estimator: Arc<Estimator>,
    ultra_fast: Arc<Estimator>,
    retry: RetryExecutor,
    confirm: ConfirmOptions,
    max_retries: u32,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let ultra_fast = FeePolicyConfig {
            default_max_fee: config.fee_policy.default_max_fee,
            ..FeePolicyConfig::ultra_fast()
        };
        Engine {
            memory: Arc::new(Mutex::new(ObservationMemory::with_capacity(
                config.memory_capacity,
            ))),
            estimator: Arc::new(Estimator::new(config.fee_policy)),
            ultra_fast: Arc::new(Estimator::new(ultra_fast)),
            confirm: ConfirmOptions::from_config(&config.confirm),
            max_retries: config.retry.max_retries,
            retry: RetryExecutor::new(config.retry),
        }
    }

    /// The shared memory, for hosts composing the free functions themselves.
    pub fn memory(&self) -> &Arc<Mutex<ObservationMemory>> {
        &self.memory
    }

    pub fn confirm_options(&self) -> ConfirmOptions {
        self.confirm
    }

    pub async fn build_fee_override<C: LedgerClient>(&self, client: &C) -> FeeOverride {
        self.estimator.estimate(client, &self.memory).await
    }

    pub async fn build_ultra_fast_fee_override<C: LedgerClient>(&self, client: &C) -> FeeOverride {
        self.ultra_fast.estimate(client, &self.memory).await
    }

    /// Retry `operation` up to the configured number of attempts.
    pub async fn run_with_retry<T, E, F, Fut>(
        &self,
        context: &str,
        operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        self.run_with_retry_cancellable(context, &CancellationToken::new(), operation)
            .await
    }

    pub async fn run_with_retry_cancellable<T, E, F, Fut>(
        &self,
        context: &str,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        let policy = RetryPolicy::new(context, self.max_retries);
        self.retry.run(&policy, cancel, operation).await
    }

    /// Await confirmation with the configured timeout and poll interval.
    pub async fn await_confirmation<C: LedgerClient>(
        &self,
        client: &C,
        tx_hash: &TxHash,
        context: &str,
        metrics: Option<&SubmissionMetrics>,
    ) -> Result<C::Receipt, ConfirmError> {
        self.await_confirmation_with(client, tx_hash, context, self.confirm, metrics)
            .await
    }

    pub async fn await_confirmation_with<C: LedgerClient>(
        &self,
        client: &C,
        tx_hash: &TxHash,
        context: &str,
        options: ConfirmOptions,
        metrics: Option<&SubmissionMetrics>,
    ) -> Result<C::Receipt, ConfirmError> {
        await_confirmation(client, &self.memory, tx_hash, context, options, metrics).await
    }

    pub fn record_observation(&self, sample: GasSample) {
        self.memory.lock().add(sample);
    }

    pub fn memory_stats(&self) -> MemoryStats {
        self.memory.lock().stats()
    }

    pub fn sample_count(&self) -> usize {
        self.memory.lock().sample_count()
    }

    /// Forget every observation. Meant for tests and operator resets.
    pub fn reset_memory(&self) {
        let mut memory = self.memory.lock();
        info!(
            target: "engine",
            "reset observation memory, dropping {} samples",
            memory.sample_count()
        );
        memory.reset();
    }
}
