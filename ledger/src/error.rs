use thiserror::Error;

const INSUFFICIENT_FUNDS_PATTERNS: &[&str] = &["insufficient funds"];
const GAS_LIMIT_PATTERNS: &[&str] = &["gas limit", "gas required exceeds"];
const NONCE_PATTERNS: &[&str] = &["nonce too low", "nonce has already been used"];
const TIMEOUT_PATTERNS: &[&str] = &["timeout", "timed out"];
// Receipt lookups on most clients only say this in prose, see `from_message`.
const NOT_FOUND_PATTERNS: &[&str] = &["not found", "missing", "unknown transaction"];

/// Failure reported by a ledger client.
///
/// Client adapters build this at their boundary, either directly or through
/// [`LedgerError::from_message`] when the underlying client only hands back
/// text. The engine never inspects message strings past this point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("nonce too low: {0}")]
    NonceTooLow(String),
    #[error("gas limit exceeded: {0}")]
    GasLimitExceeded(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Transient(String),
}

impl LedgerError {
    /// Classify a raw client error message.
    ///
    /// Matching is case-insensitive. Fatal classes win over timeout, and
    /// timeout wins over not-found; anything unrecognized is transient.
    pub fn from_message<S: Into<String>>(message: S) -> LedgerError {
        let message = message.into();
        let lower = message.to_lowercase();
        let matches = |patterns: &[&str]| patterns.iter().any(|p| lower.contains(p));

        if matches(INSUFFICIENT_FUNDS_PATTERNS) {
            LedgerError::InsufficientFunds(message)
        } else if matches(NONCE_PATTERNS) {
            LedgerError::NonceTooLow(message)
        } else if matches(GAS_LIMIT_PATTERNS) {
            LedgerError::GasLimitExceeded(message)
        } else if matches(TIMEOUT_PATTERNS) {
            LedgerError::Timeout(message)
        } else if matches(NOT_FOUND_PATTERNS) {
            LedgerError::NotFound(message)
        } else {
            LedgerError::Transient(message)
        }
    }

    /// Retrying cannot help: the same submission will fail the same way.
    pub fn is_fatal(&self) -> bool {
        match self {
            LedgerError::InsufficientFunds(_)
            | LedgerError::NonceTooLow(_)
            | LedgerError::GasLimitExceeded(_) => true,
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, LedgerError::Timeout(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }

    /// The message as the client reported it.
    pub fn message(&self) -> &str {
        match self {
            LedgerError::InsufficientFunds(m)
            | LedgerError::NonceTooLow(m)
            | LedgerError::GasLimitExceeded(m)
            | LedgerError::Timeout(m)
            | LedgerError::NotFound(m)
            | LedgerError::Transient(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LedgerError;

    #[test]
    fn classifies_fatal_messages() {
        assert_eq!(
            LedgerError::from_message("insufficient funds for gas * price + value"),
            LedgerError::InsufficientFunds("insufficient funds for gas * price + value".into())
        );
        assert!(LedgerError::from_message("Nonce too low").is_fatal());
        assert!(LedgerError::from_message("nonce has already been used").is_fatal());
        assert!(LedgerError::from_message("exceeds block gas limit").is_fatal());
    }

    #[test]
    fn classifies_confirmation_messages() {
        assert!(LedgerError::from_message("Timed out while waiting for receipt").is_timeout());
        assert!(LedgerError::from_message("request timeout").is_timeout());
        assert!(LedgerError::from_message("Transaction receipt not found").is_not_found());
        assert!(LedgerError::from_message("receipt missing").is_not_found());
        assert!(LedgerError::from_message("unknown transaction 0xab").is_not_found());
    }

    #[test]
    fn unrecognized_is_transient() {
        let err = LedgerError::from_message("connection reset by peer");
        assert_eq!(err, LedgerError::Transient("connection reset by peer".into()));
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "connection reset by peer");
        assert_eq!(err.message(), "connection reset by peer");
    }
}
