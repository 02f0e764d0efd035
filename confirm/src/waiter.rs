use crate::config::ConfirmOptions;
use crate::error::ConfirmError;
use ledger_exec_fee_policy::{FeeOverride, GasSample, ObservationMemory};
use ledger_exec_ledger::{FeeRate, LedgerClient, LedgerError, TxHash};
use log::{debug, info, warn};
use parking_lot::Mutex;

/// What the submitter knows about a transaction it is waiting on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionMetrics {
    /// unix millis at submission; without it no sample is recorded
    pub submitted_at_ms: Option<u64>,
    pub priority_fee: Option<FeeRate>,
    pub max_fee: Option<FeeRate>,
    pub context: Option<String>,
}

impl SubmissionMetrics {
    /// Metrics stamped with the current time.
    pub fn submitted_now() -> Self {
        SubmissionMetrics {
            submitted_at_ms: Some(faketime::unix_time_as_millis()),
            ..Default::default()
        }
    }

    pub fn fee_override(mut self, fee_override: &FeeOverride) -> Self {
        self.priority_fee = Some(fee_override.max_priority_fee_per_gas);
        self.max_fee = Some(fee_override.max_fee_per_gas);
        self
    }

    pub fn context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    fn to_sample(&self, confirmed_at_ms: u64, context: &str) -> Option<GasSample> {
        let submitted_at_ms = self.submitted_at_ms?;
        Some(GasSample {
            priority_fee: self.priority_fee,
            max_fee: self.max_fee,
            confirmation_latency_ms: confirmed_at_ms.saturating_sub(submitted_at_ms),
            timestamp: confirmed_at_ms,
            context: Some(self.context.clone().unwrap_or_else(|| context.to_owned())),
        })
    }
}

/// Wait for `tx_hash` to be included.
///
/// The client's own receipt wait runs under a hard deadline of
/// `options.timeout`. If it fails for any reason, one direct receipt lookup
/// is made before giving up. A receipt from either path records exactly one
/// sample into `memory` (when `metrics` carries a submission time); failures
/// record nothing.
///
/// When both paths come up empty, a timeout on the primary wait becomes
/// [`ConfirmError::TimedOut`] and any other primary error is returned as is.
pub async fn await_confirmation<C: LedgerClient>(
    client: &C,
    memory: &Mutex<ObservationMemory>,
    tx_hash: &TxHash,
    context: &str,
    options: ConfirmOptions,
    metrics: Option<&SubmissionMetrics>,
) -> Result<C::Receipt, ConfirmError> {
    await_confirmation_with_clock(
        client,
        memory,
        tx_hash,
        context,
        options,
        metrics,
        faketime::unix_time_as_millis,
    )
    .await
}

// `now_ms` is read once, when a receipt turns up
async fn await_confirmation_with_clock<C, F>(
    client: &C,
    memory: &Mutex<ObservationMemory>,
    tx_hash: &TxHash,
    context: &str,
    options: ConfirmOptions,
    metrics: Option<&SubmissionMetrics>,
    now_ms: F,
) -> Result<C::Receipt, ConfirmError>
where
    C: LedgerClient,
    F: Fn() -> u64,
{
    let primary = tokio::time::timeout(
        options.timeout,
        client.await_receipt(tx_hash, options.wait_options()),
    )
    .await
    .unwrap_or_else(|_| {
        Err(LedgerError::Timeout(format!(
            "no receipt for {} within {}ms",
            tx_hash,
            options.timeout.as_millis()
        )))
    });

    let primary_err = match primary {
        Ok(receipt) => {
            debug!(target: "confirm", "{} {} confirmed", context, tx_hash);
            record(memory, metrics, context, now_ms());
            return Ok(receipt);
        }
        Err(err) => err,
    };

    warn!(
        target: "confirm",
        "{} waiting for {} failed: {}, trying direct receipt query", context, tx_hash, primary_err
    );
    match client.query_receipt(tx_hash).await {
        Ok(receipt) => {
            info!(target: "confirm", "{} {} confirmed by direct query", context, tx_hash);
            record(memory, metrics, context, now_ms());
            return Ok(receipt);
        }
        Err(err) if err.is_not_found() => {
            debug!(target: "confirm", "{} {} has no receipt: {}", context, tx_hash, err);
        }
        Err(err) => {
            warn!(
                target: "confirm",
                "{} direct receipt query for {} failed: {}", context, tx_hash, err
            );
        }
    }

    if primary_err.is_timeout() {
        Err(ConfirmError::TimedOut {
            context: context.to_owned(),
            timeout: options.timeout,
        })
    } else {
        Err(ConfirmError::Ledger(primary_err))
    }
}

fn record(
    memory: &Mutex<ObservationMemory>,
    metrics: Option<&SubmissionMetrics>,
    context: &str,
    now_ms: u64,
) {
    if let Some(sample) = metrics.and_then(|m| m.to_sample(now_ms, context)) {
        memory.lock().add(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_exec_ledger::{FeeMarketRates, WaitOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    const RECEIPT: &str = "receipt";

    struct ScriptedClient {
        primary: Result<String, LedgerError>,
        primary_delay: Duration,
        fallback: Result<String, LedgerError>,
        queries: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(
            primary: Result<String, LedgerError>,
            fallback: Result<String, LedgerError>,
        ) -> Self {
            ScriptedClient {
                primary,
                primary_delay: Duration::from_millis(0),
                fallback,
                queries: AtomicUsize::new(0),
            }
        }

        fn queries(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }
    }

    impl LedgerClient for ScriptedClient {
        type Receipt = String;

        async fn estimate_fee_market_rates(&self) -> Result<FeeMarketRates, LedgerError> {
            Ok(FeeMarketRates::default())
        }

        async fn await_receipt(
            &self,
            _tx_hash: &TxHash,
            _options: WaitOptions,
        ) -> Result<String, LedgerError> {
            tokio::time::sleep(self.primary_delay).await;
            self.primary.clone()
        }

        async fn query_receipt(&self, _tx_hash: &TxHash) -> Result<String, LedgerError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.fallback.clone()
        }
    }

    fn ok() -> Result<String, LedgerError> {
        Ok(RECEIPT.to_owned())
    }

    fn not_found() -> Result<String, LedgerError> {
        Err(LedgerError::from_message("transaction receipt not found"))
    }

    fn metrics(submitted_at_ms: u64) -> SubmissionMetrics {
        SubmissionMetrics {
            submitted_at_ms: Some(submitted_at_ms),
            priority_fee: Some(FeeRate::new(7)),
            max_fee: Some(FeeRate::new(60)),
            context: None,
        }
    }

    fn tx_hash() -> TxHash {
        TxHash::new([7u8; 32])
    }

    #[tokio::test]
    async fn primary_receipt_records_one_sample() {
        let client = ScriptedClient::new(ok(), not_found());
        let memory = Mutex::new(ObservationMemory::new());

        let receipt = await_confirmation_with_clock(
            &client,
            &memory,
            &tx_hash(),
            "pay",
            ConfirmOptions::default(),
            Some(&metrics(97_500)),
            || 100_000,
        )
        .await
        .expect("confirmed");

        assert_eq!(receipt, RECEIPT);
        assert_eq!(client.queries(), 0);
        let memory = memory.lock();
        assert_eq!(memory.sample_count(), 1);
        let sample = memory.samples().next().expect("one sample");
        assert_eq!(sample.confirmation_latency_ms, 2_500);
        assert_eq!(sample.timestamp, 100_000);
        assert_eq!(sample.priority_fee, Some(FeeRate::new(7)));
        assert_eq!(sample.max_fee, Some(FeeRate::new(60)));
        assert_eq!(sample.context.as_deref(), Some("pay"));
    }

    #[tokio::test]
    async fn no_submission_time_records_nothing() {
        let client = ScriptedClient::new(ok(), not_found());
        let memory = Mutex::new(ObservationMemory::new());
        await_confirmation(
            &client,
            &memory,
            &tx_hash(),
            "pay",
            ConfirmOptions::default(),
            Some(&SubmissionMetrics::default()),
        )
        .await
        .expect("confirmed");
        await_confirmation(&client, &memory, &tx_hash(), "pay", ConfirmOptions::default(), None)
            .await
            .expect("confirmed");
        assert_eq!(memory.lock().sample_count(), 0);
    }

    #[tokio::test]
    async fn timeout_then_not_found_is_timed_out() {
        let _ = env_logger::builder().is_test(true).try_init();
        let client = ScriptedClient::new(
            Err(LedgerError::from_message("Timed out while waiting for transaction")),
            not_found(),
        );
        let memory = Mutex::new(ObservationMemory::new());

        let err = await_confirmation(
            &client,
            &memory,
            &tx_hash(),
            "study payment",
            ConfirmOptions::default().timeout(Duration::from_secs(45)),
            Some(&metrics(0)),
        )
        .await
        .expect_err("timed out");

        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "study payment confirmation timed out after 45s");
        assert_eq!(client.queries(), 1);
        assert_eq!(memory.lock().sample_count(), 0);
    }

    #[tokio::test]
    async fn failed_primary_falls_back_to_direct_query() {
        let client = ScriptedClient::new(
            Err(LedgerError::Transient("socket hang up".into())),
            ok(),
        );
        let memory = Mutex::new(ObservationMemory::new());

        let receipt = await_confirmation_with_clock(
            &client,
            &memory,
            &tx_hash(),
            "pay",
            ConfirmOptions::default(),
            Some(&metrics(41_000).context("refund")),
            || 50_000,
        )
        .await
        .expect("found by fallback");

        assert_eq!(receipt, RECEIPT);
        let memory = memory.lock();
        assert_eq!(memory.sample_count(), 1);
        let sample = memory.samples().next().expect("one sample");
        assert_eq!(sample.confirmation_latency_ms, 9_000);
        assert_eq!(sample.context.as_deref(), Some("refund"));
    }

    #[tokio::test]
    async fn not_found_keeps_primary_error() {
        let client = ScriptedClient::new(
            Err(LedgerError::Transient("socket hang up".into())),
            not_found(),
        );
        let memory = Mutex::new(ObservationMemory::new());

        let err = await_confirmation(
            &client,
            &memory,
            &tx_hash(),
            "pay",
            ConfirmOptions::default(),
            Some(&metrics(0)),
        )
        .await
        .expect_err("no receipt");

        assert!(!err.is_timeout());
        assert_eq!(
            err,
            ConfirmError::Ledger(LedgerError::Transient("socket hang up".into()))
        );
        assert_eq!(memory.lock().sample_count(), 0);
    }

    #[tokio::test]
    async fn primary_not_found_is_distinguishable() {
        let client = ScriptedClient::new(not_found(), not_found());
        let memory = Mutex::new(ObservationMemory::new());
        let err = await_confirmation(
            &client,
            &memory,
            &tx_hash(),
            "pay",
            ConfirmOptions::default(),
            None,
        )
        .await
        .expect_err("no receipt");
        assert!(err.is_not_found());
        assert!(!err.is_timeout());
    }

    #[tokio::test]
    async fn failed_fallback_does_not_mask_timeout() {
        let client = ScriptedClient::new(
            Err(LedgerError::Timeout("timeout".into())),
            Err(LedgerError::Transient("connection refused".into())),
        );
        let memory = Mutex::new(ObservationMemory::new());
        let err = await_confirmation(
            &client,
            &memory,
            &tx_hash(),
            "pay",
            ConfirmOptions::default().timeout(Duration::from_millis(1_500)),
            None,
        )
        .await
        .expect_err("timed out");
        assert_eq!(err.to_string(), "pay confirmation timed out after 1.5s");
    }

    #[tokio::test]
    async fn clock_read_only_when_receipt_arrives() {
        let reads = AtomicUsize::new(0);
        let clock = || {
            reads.fetch_add(1, Ordering::SeqCst);
            7_000
        };
        let memory = Mutex::new(ObservationMemory::new());

        let missing = ScriptedClient::new(not_found(), not_found());
        await_confirmation_with_clock(
            &missing,
            &memory,
            &tx_hash(),
            "pay",
            ConfirmOptions::default(),
            Some(&metrics(1_000)),
            clock,
        )
        .await
        .expect_err("no receipt");
        assert_eq!(reads.load(Ordering::SeqCst), 0);

        let found = ScriptedClient::new(ok(), not_found());
        await_confirmation_with_clock(
            &found,
            &memory,
            &tx_hash(),
            "pay",
            ConfirmOptions::default(),
            Some(&metrics(1_000)),
            clock,
        )
        .await
        .expect("confirmed");
        assert_eq!(reads.load(Ordering::SeqCst), 1);
        let memory = memory.lock();
        let sample = memory.samples().next().expect("one sample");
        assert_eq!(sample.confirmation_latency_ms, 6_000);
        assert_eq!(sample.timestamp, 7_000);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cuts_off_slow_client() {
        let mut client = ScriptedClient::new(ok(), not_found());
        client.primary_delay = Duration::from_secs(600);
        let memory = Mutex::new(ObservationMemory::new());

        let start = Instant::now();
        let err = await_confirmation(
            &client,
            &memory,
            &tx_hash(),
            "pay",
            ConfirmOptions::default()
                .timeout(Duration::from_secs(2))
                .poll_interval(Duration::from_millis(100)),
            Some(&metrics(0)),
        )
        .await
        .expect_err("deadline");

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(3), "{:?}", elapsed);
        assert_eq!(err.to_string(), "pay confirmation timed out after 2s");
        assert_eq!(client.queries(), 1);
        assert_eq!(memory.lock().sample_count(), 0);
    }
}
