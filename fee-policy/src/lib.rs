mod config;
mod estimator;
mod observation;

pub use crate::config::{
    FeePolicyConfig, DEFAULT_BUMP_PERCENT, DEFAULT_MAX_FEE, DEFAULT_MIN_PRIORITY_FEE_FLOOR,
};
pub use crate::estimator::{
    build_fee_override, build_ultra_fast_fee_override, Estimator, FeeOverride,
};
pub use crate::observation::{GasSample, MemoryStats, ObservationMemory, DEFAULT_MEMORY_CAPACITY};
