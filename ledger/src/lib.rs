mod client;
mod error;
mod fee_rate;
mod hash;

pub use crate::client::{FeeMarketRates, LedgerClient, WaitOptions};
pub use crate::error::LedgerError;
pub use crate::fee_rate::FeeRate;
pub use crate::hash::{TxHash, TxHashError, TX_HASH_LEN};
