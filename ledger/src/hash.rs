use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const TX_HASH_LEN: usize = 32;

/// Hash identifying a submitted transaction.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct TxHash([u8; TX_HASH_LEN]);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxHashError {
    #[error("expected {expected} hex chars, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("invalid hex character")]
    InvalidHex,
}

impl TxHash {
    pub const fn new(bytes: [u8; TX_HASH_LEN]) -> TxHash {
        TxHash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TX_HASH_LEN] {
        &self.0
    }
}

impl From<[u8; TX_HASH_LEN]> for TxHash {
    fn from(bytes: [u8; TX_HASH_LEN]) -> TxHash {
        TxHash(bytes)
    }
}

impl FromStr for TxHash {
    type Err = TxHashError;

    fn from_str(s: &str) -> Result<TxHash, TxHashError> {
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if hex.len() != TX_HASH_LEN * 2 {
            return Err(TxHashError::InvalidLength {
                expected: TX_HASH_LEN * 2,
                actual: hex.len(),
            });
        }
        let mut bytes = [0u8; TX_HASH_LEN];
        faster_hex::hex_decode(hex.as_bytes(), &mut bytes).map_err(|_| TxHashError::InvalidHex)?;
        Ok(TxHash(bytes))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut buf = [0u8; TX_HASH_LEN * 2];
        let hex = faster_hex::hex_encode(&self.0, &mut buf).map_err(|_| fmt::Error)?;
        write!(f, "0x{}", hex)
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TxHash({})", self)
    }
}
