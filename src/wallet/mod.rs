//! Wallet management module
//!
//! Key material lifecycle for the trading wallets:
//! - Key generation and string validation (pure, no I/O)
//! - Batch persistence to JSON files
//! - Balance lookups used to mark wallets as funded
//!
//! # Security
//!
//! Private keys and mnemonics live only inside [`WalletRecord`]. They are
//! redacted from `Debug` output, never logged, and only handed to the
//! execution client and the wallet store.

pub mod balance;
pub mod keys;
pub mod store;
pub mod types;

pub use balance::{refresh_funding, BalanceOracle, RpcBalanceOracle};
pub use keys::{generate, generate_with, validate_address, validate_private_key};
pub use store::{JsonFileStore, WalletStore};
pub use types::{AmountRange, WalletRecord, WalletStatus};
