mod config;
mod error;
mod executor;

pub use crate::config::RetryConfig;
pub use crate::error::{Classify, RetryError};
pub use crate::executor::{run_with_retry, run_with_retry_cancellable, RetryExecutor, RetryPolicy};
