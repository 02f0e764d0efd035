use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Fee per unit of gas, in the smallest denomination the ledger client speaks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeRate(u64);

impl FeeRate {
    pub const fn new(value: u64) -> FeeRate {
        FeeRate(value)
    }

    pub const fn zero() -> FeeRate {
        FeeRate(0)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, other: FeeRate) -> FeeRate {
        FeeRate(self.0.saturating_add(other.0))
    }

    pub fn saturating_mul(self, factor: u64) -> FeeRate {
        FeeRate(self.0.saturating_mul(factor))
    }

    /// Scale by `percent / 100`, truncating toward zero.
    /// The product is taken in 128 bits so large rates never wrap.
    pub fn apply_percent(self, percent: u64) -> FeeRate {
        let scaled = u128::from(self.0) * u128::from(percent) / 100;
        FeeRate(if scaled > u128::from(u64::MAX) {
            u64::MAX
        } else {
            scaled as u64
        })
    }

    /// Midpoint of two rates, rounded toward zero.
    pub fn midpoint(self, other: FeeRate) -> FeeRate {
        let (lo, hi) = if self.0 <= other.0 {
            (self.0, other.0)
        } else {
            (other.0, self.0)
        };
        FeeRate(lo + (hi - lo) / 2)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for FeeRate {
    fn from(value: u64) -> FeeRate {
        FeeRate(value)
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
