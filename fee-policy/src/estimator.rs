use crate::config::FeePolicyConfig;
use crate::observation::{MemoryStats, ObservationMemory};
use ledger_exec_ledger::{FeeMarketRates, FeeRate, LedgerClient};
use log::{debug, warn};
use parking_lot::Mutex;
use serde_derive::Serialize;
use std::fmt;

const SLOW_MEDIAN_CONFIRMATION_MS: u64 = 60_000;
const VERY_SLOW_MEDIAN_CONFIRMATION_MS: u64 = 90_000;
const SLOW_ESCALATION_PERCENT: u64 = 15;
const VERY_SLOW_ESCALATION_PERCENT: u64 = 30;
/// max fee headroom over the priority fee when the base fee is unknown
const FALLBACK_SAFETY_BUFFER: FeeRate = FeeRate::new(1);

/// Fee fields to put on the next submission.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FeeOverride {
    pub max_fee_per_gas: FeeRate,
    pub max_priority_fee_per_gas: FeeRate,
}

impl fmt::Display for FeeOverride {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "max_fee_per_gas={} max_priority_fee_per_gas={}",
            self.max_fee_per_gas, self.max_priority_fee_per_gas
        )
    }
}

/// Fee Estimator
///
/// Bids from the live fee market, but never below what recently confirmed
/// transactions paid. The observation memory feeds back in two ways: its
/// median fees raise the base bid, and a slow median confirmation time raises
/// the bump multiplier.
///
/// A failed fee market query degrades to configured defaults and is only
/// logged, so estimation itself never fails.
pub struct Estimator {
    config: FeePolicyConfig,
}

impl Default for Estimator {
    fn default() -> Self {
        Estimator::new(FeePolicyConfig::default())
    }
}

impl Estimator {
    pub fn new(config: FeePolicyConfig) -> Self {
        Estimator { config }
    }

    pub fn ultra_fast() -> Self {
        Estimator::new(FeePolicyConfig::ultra_fast())
    }

    pub fn config(&self) -> &FeePolicyConfig {
        &self.config
    }

    pub async fn estimate<C: LedgerClient>(
        &self,
        client: &C,
        memory: &Mutex<ObservationMemory>,
    ) -> FeeOverride {
        let rates = match client.estimate_fee_market_rates().await {
            Ok(rates) => Some(rates),
            Err(err) => {
                warn!(
                    target: "fee_policy",
                    "fee market estimate failed, falling back to defaults: {}", err
                );
                None
            }
        };
        // lock after the query returns, never across it
        let stats = memory.lock().stats();
        let fee_override = self.estimate_with(rates.as_ref(), &stats);
        debug!(
            target: "fee_policy",
            "fee override {} (rates: {:?}, stats: {:?})", fee_override, rates, stats
        );
        fee_override
    }

    /// The bid for a given market snapshot and memory projection.
    /// `rates` is `None` when the fee market could not be queried.
    pub fn estimate_with(
        &self,
        rates: Option<&FeeMarketRates>,
        stats: &MemoryStats,
    ) -> FeeOverride {
        let multiplier = self.multiplier(stats);
        let floor = self.config.min_priority_fee_floor;

        let live_priority = rates.and_then(|r| r.max_priority_fee).unwrap_or(floor);
        let base_priority = live_priority
            .max(floor)
            .max(stats.median_priority_fee.unwrap_or_else(FeeRate::zero));

        let live_max_fee = rates
            .and_then(|r| r.max_fee)
            .unwrap_or(self.config.default_max_fee);
        let base_max_fee = live_max_fee.max(stats.median_max_fee.unwrap_or_else(FeeRate::zero));

        let priority_fee = base_priority.apply_percent(multiplier);
        let mut max_fee = base_max_fee.apply_percent(multiplier);

        let buffer = rates
            .and_then(|r| r.base_fee)
            .filter(|base_fee| !base_fee.is_zero())
            .map(|base_fee| base_fee.saturating_mul(2))
            .unwrap_or(FALLBACK_SAFETY_BUFFER);
        let min_max_fee = priority_fee.saturating_add(buffer);
        if max_fee <= min_max_fee {
            max_fee = min_max_fee;
        }

        FeeOverride {
            max_fee_per_gas: max_fee,
            max_priority_fee_per_gas: priority_fee,
        }
    }

    // percent applied to both base fees
    fn multiplier(&self, stats: &MemoryStats) -> u64 {
        let multiplier = 100u64.saturating_add(self.config.bump_percent);
        let escalation = match stats.median_confirmation_ms {
            Some(ms) if ms > VERY_SLOW_MEDIAN_CONFIRMATION_MS => VERY_SLOW_ESCALATION_PERCENT,
            Some(ms) if ms > SLOW_MEDIAN_CONFIRMATION_MS => SLOW_ESCALATION_PERCENT,
            _ => 0,
        };
        multiplier.saturating_add(escalation)
    }
}

pub async fn build_fee_override<C: LedgerClient>(
    client: &C,
    memory: &Mutex<ObservationMemory>,
    config: &FeePolicyConfig,
) -> FeeOverride {
    Estimator::new(config.clone()).estimate(client, memory).await
}

pub async fn build_ultra_fast_fee_override<C: LedgerClient>(
    client: &C,
    memory: &Mutex<ObservationMemory>,
) -> FeeOverride {
    Estimator::ultra_fast().estimate(client, memory).await
}
