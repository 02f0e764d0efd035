use ledger_exec_ledger::LedgerError;
use thiserror::Error;

/// Whether an operation error is worth another attempt.
pub trait Classify {
    fn is_fatal(&self) -> bool;
}

impl Classify for LedgerError {
    fn is_fatal(&self) -> bool {
        LedgerError::is_fatal(self)
    }
}

#[derive(Error, Debug)]
pub enum RetryError<E> {
    /// The operation failed in a way retrying cannot fix; returned as is.
    #[error("{0}")]
    Fatal(E),
    #[error("{context} failed after {max_retries} attempts: {last_error}")]
    Exhausted {
        context: String,
        max_retries: u32,
        last_error: E,
    },
    #[error("{context} cancelled after {attempts} attempts")]
    Cancelled { context: String, attempts: u32 },
}

impl<E> RetryError<E> {
    pub fn is_fatal(&self) -> bool {
        matches!(self, RetryError::Fatal(_))
    }

    /// The last error the operation returned, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::Fatal(err) => Some(err),
            RetryError::Exhausted { last_error, .. } => Some(last_error),
            RetryError::Cancelled { .. } => None,
        }
    }
}
