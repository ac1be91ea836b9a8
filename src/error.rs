//! Error types for the volume bot core

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a wallet's buy/sell pair an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Buy,
    Sell,
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Leg::Buy => write!(f, "buy"),
            Leg::Sell => write!(f, "sell"),
        }
    }
}

/// Main error type for the volume bot
#[derive(Error, Debug)]
pub enum Error {
    // Key manager errors
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    // Orchestrator errors
    #[error("A trading run is already in progress")]
    NotIdle,

    #[error("No funded wallets available for trading")]
    NoEligibleWallets,

    #[error("{leg} failed for {address}: {reason}")]
    Transaction {
        leg: Leg,
        address: String,
        reason: String,
    },

    // Collaborator errors
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Wallet storage error: {0}")]
    Storage(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Build a per-leg transaction error
    pub fn transaction(leg: Leg, address: &str, reason: impl Into<String>) -> Self {
        Error::Transaction {
            leg,
            address: address.to_string(),
            reason: reason.into(),
        }
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

// Conversion from reqwest errors
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Rpc(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_error_display() {
        let err = Error::transaction(Leg::Sell, "0xabc", "nonce too low");
        assert_eq!(err.to_string(), "sell failed for 0xabc: nonce too low");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing batch");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(ref msg) if msg.contains("missing batch")));
    }
}
