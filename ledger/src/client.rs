use crate::{FeeRate, LedgerError, TxHash};
use serde_derive::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Best-effort fee market snapshot. Any field may be missing on networks or
/// clients that cannot report it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeMarketRates {
    pub base_fee: Option<FeeRate>,
    pub max_fee: Option<FeeRate>,
    pub max_priority_fee: Option<FeeRate>,
}

/// How long a client may poll for a receipt, and how often.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

/// Capabilities the engine needs from a ledger network client.
///
/// Adapters are expected to map client failures into [`LedgerError`]
/// variants; see [`LedgerError::from_message`] for text-only clients.
pub trait LedgerClient {
    type Receipt;

    fn estimate_fee_market_rates(
        &self,
    ) -> impl Future<Output = Result<FeeMarketRates, LedgerError>> + Send;

    /// Poll until the receipt for `tx_hash` shows up or `options.timeout` runs out.
    fn await_receipt(
        &self,
        tx_hash: &TxHash,
        options: WaitOptions,
    ) -> impl Future<Output = Result<Self::Receipt, LedgerError>> + Send;

    /// One direct receipt lookup.
    fn query_receipt(
        &self,
        tx_hash: &TxHash,
    ) -> impl Future<Output = Result<Self::Receipt, LedgerError>> + Send;
}
