//! Core types for wallet management
//!
//! Defines generated wallet records, their trading status, and the
//! amount range used when assigning per-wallet trade sizes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fractional digits kept on assigned trade amounts
pub const AMOUNT_DECIMALS: i32 = 6;

/// One generated or imported trading identity
///
/// `Debug` is implemented by hand so the secret fields never reach logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    /// EIP-55 checksummed address
    pub address: String,

    /// `0x`-prefixed secp256k1 secret scalar
    pub private_key: String,

    /// BIP-39 phrase deriving `private_key` on the first Ethereum account path
    #[serde(default)]
    pub mnemonic: Option<String>,

    /// Trade size drawn at generation time
    assigned_amount: f64,

    /// Balance observed on chain; zero until funded
    #[serde(default)]
    pub funded_amount: f64,

    #[serde(default)]
    pub status: WalletStatus,

    pub created_at: DateTime<Utc>,
}

impl WalletRecord {
    /// Create a record for freshly generated key material
    pub fn new(
        address: String,
        private_key: String,
        mnemonic: Option<String>,
        assigned_amount: f64,
    ) -> Self {
        Self {
            address,
            private_key,
            mnemonic,
            assigned_amount,
            funded_amount: 0.0,
            status: WalletStatus::Idle,
            created_at: Utc::now(),
        }
    }

    /// Trade size assigned at generation
    pub fn assigned_amount(&self) -> f64 {
        self.assigned_amount
    }

    /// A wallet takes part in a run only when it holds funds
    pub fn is_eligible(&self) -> bool {
        self.funded_amount > 0.0
    }

    /// Abbreviated address for log lines: `0x1234abcd…`
    pub fn short_address(&self) -> String {
        short_address(&self.address)
    }
}

impl std::fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRecord")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "<redacted>"))
            .field("assigned_amount", &self.assigned_amount)
            .field("funded_amount", &self.funded_amount)
            .field("status", &self.status)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Abbreviate an address to its first ten characters
pub fn short_address(address: &str) -> String {
    match address.get(..10) {
        Some(prefix) if address.len() > 10 => format!("{}…", prefix),
        _ => address.to_string(),
    }
}

/// Lifecycle status of a wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    #[default]
    Idle,
    Funding,
    Trading,
    Gathering,
    Error,
}

impl std::fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletStatus::Idle => write!(f, "idle"),
            WalletStatus::Funding => write!(f, "funding"),
            WalletStatus::Trading => write!(f, "trading"),
            WalletStatus::Gathering => write!(f, "gathering"),
            WalletStatus::Error => write!(f, "error"),
        }
    }
}

/// Inclusive range trade amounts are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: f64,
    pub max: f64,
}

impl AmountRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Both bounds positive and finite, `min <= max`
    pub fn validate(&self) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "amount range bounds must be finite, got [{}, {}]",
                self.min, self.max
            )));
        }
        if self.min <= 0.0 || self.max <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "amount range bounds must be positive, got [{}, {}]",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(Error::InvalidParameter(format!(
                "amount range min {} exceeds max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// Round to the fixed amount precision
pub fn round_amount(amount: f64) -> f64 {
    let scale = 10f64.powi(AMOUNT_DECIMALS);
    (amount * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WalletRecord {
        WalletRecord::new(
            "0x52908400098527886E0F7030069857D2E4169EE7".to_string(),
            format!("0x{}", "11".repeat(32)),
            Some("test test test".to_string()),
            0.0015,
        )
    }

    #[test]
    fn test_new_record_defaults() {
        let wallet = sample();
        assert_eq!(wallet.funded_amount, 0.0);
        assert_eq!(wallet.status, WalletStatus::Idle);
        assert!(!wallet.is_eligible());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let wallet = sample();
        let debug = format!("{:?}", wallet);
        assert!(!debug.contains(&wallet.private_key));
        assert!(!debug.contains("test test test"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_short_address() {
        assert_eq!(
            short_address("0x52908400098527886E0F7030069857D2E4169EE7"),
            "0x52908400…"
        );
        assert_eq!(short_address("0x1234"), "0x1234");
    }

    #[test]
    fn test_amount_range_validation() {
        assert!(AmountRange::new(0.001, 0.003).validate().is_ok());
        assert!(AmountRange::new(0.002, 0.002).validate().is_ok());
        assert!(AmountRange::new(0.003, 0.001).validate().is_err());
        assert!(AmountRange::new(0.0, 0.001).validate().is_err());
        assert!(AmountRange::new(-1.0, 0.001).validate().is_err());
        assert!(AmountRange::new(0.001, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_round_amount() {
        assert_eq!(round_amount(0.001_234_567_8), 0.001235);
        assert_eq!(round_amount(0.002), 0.002);
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&WalletStatus::Gathering).unwrap();
        assert_eq!(json, r#""gathering""#);
    }
}
