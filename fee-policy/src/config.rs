use ledger_exec_ledger::FeeRate;
use serde_derive::{Deserialize, Serialize};

pub const DEFAULT_BUMP_PERCENT: u64 = 50;
pub const DEFAULT_MIN_PRIORITY_FEE_FLOOR: FeeRate = FeeRate::new(5);
/// max fee used when the fee market cannot tell us one
pub const DEFAULT_MAX_FEE: FeeRate = FeeRate::new(40);

const ULTRA_FAST_BUMP_PERCENT: u64 = 100;
const ULTRA_FAST_MIN_PRIORITY_FEE_FLOOR: FeeRate = FeeRate::new(10);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeePolicyConfig {
    /// percent added on top of the base bid
    pub bump_percent: u64,
    pub min_priority_fee_floor: FeeRate,
    pub default_max_fee: FeeRate,
}

impl Default for FeePolicyConfig {
    fn default() -> Self {
        FeePolicyConfig {
            bump_percent: DEFAULT_BUMP_PERCENT,
            min_priority_fee_floor: DEFAULT_MIN_PRIORITY_FEE_FLOOR,
            default_max_fee: DEFAULT_MAX_FEE,
        }
    }
}

impl FeePolicyConfig {
    /// Aggressive preset for transactions that must land quickly.
    pub fn ultra_fast() -> Self {
        FeePolicyConfig {
            bump_percent: ULTRA_FAST_BUMP_PERCENT,
            min_priority_fee_floor: ULTRA_FAST_MIN_PRIORITY_FEE_FLOOR,
            ..Default::default()
        }
    }
}
