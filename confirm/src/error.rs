use ledger_exec_ledger::LedgerError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfirmError {
    /// Submitted, but no receipt showed up before the deadline.
    #[error("{context} confirmation timed out after {}s", format_secs(.timeout))]
    TimedOut { context: String, timeout: Duration },
    /// The primary wait failed for a reason other than the deadline and
    /// the direct lookup found nothing either.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ConfirmError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConfirmError::TimedOut { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfirmError::Ledger(err) if err.is_not_found())
    }
}

// whole seconds print without a fraction: 60s, 1.5s
fn format_secs(timeout: &Duration) -> String {
    let millis = timeout.as_millis();
    if millis % 1000 == 0 {
        (millis / 1000).to_string()
    } else {
        (millis as f64 / 1000f64).to_string()
    }
}
