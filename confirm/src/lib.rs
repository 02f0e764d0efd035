mod config;
mod error;
mod waiter;

pub use crate::config::{ConfirmConfig, ConfirmOptions};
pub use crate::error::ConfirmError;
pub use crate::waiter::{await_confirmation, SubmissionMetrics};
