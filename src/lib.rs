//! Volume Bot Library
//!
//! EVM wallet key management and a sequential, cancellable buy/sell
//! orchestrator that generates trading volume across those wallets.

pub mod cli;
pub mod config;
pub mod error;
pub mod trading;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
