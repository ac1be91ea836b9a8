//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::wallet::keys::{validate_address, MAX_WALLETS_PER_BATCH};
use crate::wallet::AmountRange;

/// Shortest pause the pacing policy allows between legs or wallets
pub const MIN_INTERVAL_FLOOR_MS: u64 = 1000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub wallets: WalletsConfig,
    #[serde(default)]
    pub chain: ChainConfig,
}

/// Run pacing and dry-run executor settings
#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Lower bound of the random pause, in milliseconds
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Upper bound of the random pause, in milliseconds
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
    /// Latency of each simulated transaction
    #[serde(default = "default_simulated_latency_ms")]
    pub simulated_latency_ms: u64,
    /// Share of simulated legs that fail (0.0 - 1.0)
    #[serde(default)]
    pub simulated_failure_rate: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            simulated_latency_ms: default_simulated_latency_ms(),
            simulated_failure_rate: 0.0,
        }
    }
}

/// Sub-wallet generation settings
#[derive(Debug, Clone, Deserialize)]
pub struct WalletsConfig {
    /// Number of sub-wallets to generate
    #[serde(default = "default_wallet_count")]
    pub count: usize,
    #[serde(default = "default_amount_min")]
    pub amount_min: f64,
    #[serde(default = "default_amount_max")]
    pub amount_max: f64,
    /// Native balance that must stay in each wallet for gas
    #[serde(default = "default_fee")]
    pub fee: f64,
    /// Directory holding saved wallet batches
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
}

impl WalletsConfig {
    pub fn amount_range(&self) -> AmountRange {
        AmountRange::new(self.amount_min, self.amount_max)
    }
}

impl Default for WalletsConfig {
    fn default() -> Self {
        Self {
            count: default_wallet_count(),
            amount_min: default_amount_min(),
            amount_max: default_amount_max(),
            fee: default_fee(),
            storage_dir: default_storage_dir(),
        }
    }
}

/// Supported networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Bsc,
    Sepolia,
}

impl Chain {
    pub fn chain_id(&self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::Bsc => 56,
            Chain::Sepolia => 11_155_111,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Chain::Ethereum | Chain::Sepolia => "ETH",
            Chain::Bsc => "BNB",
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chain::Ethereum => write!(f, "ethereum"),
            Chain::Bsc => write!(f, "bsc"),
            Chain::Sepolia => write!(f, "sepolia"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcEndpoints {
    #[serde(default = "default_eth_rpc")]
    pub eth: String,
    #[serde(default = "default_bsc_rpc")]
    pub bsc: String,
    #[serde(default = "default_sepolia_rpc")]
    pub sepolia: String,
}

impl Default for RpcEndpoints {
    fn default() -> Self {
        Self {
            eth: default_eth_rpc(),
            bsc: default_bsc_rpc(),
            sepolia: default_sepolia_rpc(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_chain")]
    pub network: Chain,
    #[serde(default)]
    pub rpc_endpoints: RpcEndpoints,
    /// Token the volume is generated on
    #[serde(default)]
    pub target_token_address: Option<String>,
}

impl ChainConfig {
    /// RPC endpoint for the selected network
    pub fn rpc_endpoint(&self) -> &str {
        match self.network {
            Chain::Ethereum => &self.rpc_endpoints.eth,
            Chain::Bsc => &self.rpc_endpoints.bsc,
            Chain::Sepolia => &self.rpc_endpoints.sepolia,
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            network: default_chain(),
            rpc_endpoints: RpcEndpoints::default(),
            target_token_address: None,
        }
    }
}

// Default value functions
fn default_min_interval_ms() -> u64 { 5_000 }
fn default_max_interval_ms() -> u64 { 15_000 }
fn default_simulated_latency_ms() -> u64 { 2_000 }
fn default_wallet_count() -> usize { 10 }
fn default_amount_min() -> f64 { 0.001 }
fn default_amount_max() -> f64 { 0.003 }
fn default_fee() -> f64 { 0.001 }
fn default_storage_dir() -> String { "wallets".to_string() }
fn default_chain() -> Chain { Chain::Sepolia }
fn default_eth_rpc() -> String { "https://eth.llamarpc.com".to_string() }
fn default_bsc_rpc() -> String { "https://bsc-dataseed.binance.org".to_string() }
fn default_sepolia_rpc() -> String { "https://rpc.sepolia.org".to_string() }

impl Config {
    /// Load configuration from file and environment
    ///
    /// The file is optional. Environment variables use the `VOLUME_BOT`
    /// prefix with `__` between sections, e.g.
    /// `VOLUME_BOT__TRADING__MIN_INTERVAL_MS=8000`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix VOLUME_BOT__)
            .add_source(
                config::Environment::with_prefix("VOLUME_BOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate wallet generation
        if self.wallets.amount_min <= 0.0 {
            anyhow::bail!("amount_min must be positive");
        }

        if self.wallets.amount_max <= self.wallets.amount_min {
            anyhow::bail!("amount_max must be greater than amount_min");
        }

        if self.wallets.fee <= 0.0 {
            anyhow::bail!("fee must be positive");
        }

        if self.wallets.count == 0 || self.wallets.count > MAX_WALLETS_PER_BATCH {
            anyhow::bail!(
                "wallet count must be between 1 and {}, got {}",
                MAX_WALLETS_PER_BATCH,
                self.wallets.count
            );
        }

        // Validate pacing
        if self.trading.min_interval_ms < MIN_INTERVAL_FLOOR_MS {
            anyhow::bail!(
                "min_interval_ms must be at least {}ms",
                MIN_INTERVAL_FLOOR_MS
            );
        }

        if self.trading.min_interval_ms >= self.trading.max_interval_ms {
            anyhow::bail!("min_interval_ms must be less than max_interval_ms");
        }

        if !(0.0..=1.0).contains(&self.trading.simulated_failure_rate) {
            anyhow::bail!("simulated_failure_rate must be between 0 and 1");
        }

        // Validate chain
        if self.chain.rpc_endpoint().is_empty() {
            anyhow::bail!("RPC endpoint for {} is required", self.chain.network);
        }

        if let Some(token) = &self.chain.target_token_address {
            if !validate_address(token) {
                anyhow::bail!("Invalid target_token_address: {}", token);
            }
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Chain:
    network: {} (chain id {})
    rpc: {}
    target_token: {}
  Wallets:
    count: {}
    amount: {} - {} {}
    fee: {} {}
    storage_dir: {}
  Trading:
    interval: {}ms - {}ms
    simulated_latency: {}ms
    simulated_failure_rate: {}
"#,
            self.chain.network,
            self.chain.network.chain_id(),
            mask_url(self.chain.rpc_endpoint()),
            self.chain
                .target_token_address
                .as_deref()
                .unwrap_or("(not set)"),
            self.wallets.count,
            self.wallets.amount_min,
            self.wallets.amount_max,
            self.chain.network.symbol(),
            self.wallets.fee,
            self.chain.network.symbol(),
            self.wallets.storage_dir,
            self.trading.min_interval_ms,
            self.trading.max_interval_ms,
            self.trading.simulated_latency_ms,
            self.trading.simulated_failure_rate,
        )
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chain.network, Chain::Sepolia);
        assert_eq!(config.chain.network.chain_id(), 11_155_111);
        assert_eq!(config.wallets.count, 10);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("volume-bot.toml");
        std::fs::write(
            &path,
            r#"
[trading]
min_interval_ms = 2000
max_interval_ms = 4000

[wallets]
count = 3
amount_min = 0.01
amount_max = 0.02

[chain]
network = "bsc"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.trading.min_interval_ms, 2000);
        assert_eq!(config.wallets.count, 3);
        assert_eq!(config.chain.network, Chain::Bsc);
        assert_eq!(config.chain.rpc_endpoint(), default_bsc_rpc());
        assert_eq!(config.wallets.amount_range(), AmountRange::new(0.01, 0.02));
    }

    #[test]
    fn test_rejects_inverted_interval() {
        let mut config = Config::default();
        config.trading.min_interval_ms = 6000;
        config.trading.max_interval_ms = 6000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_short_interval() {
        let mut config = Config::default();
        config.trading.min_interval_ms = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_wallet_count_out_of_range() {
        let mut config = Config::default();
        config.wallets.count = 0;
        assert!(config.validate().is_err());
        config.wallets.count = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_amounts() {
        let mut config = Config::default();
        config.wallets.amount_max = config.wallets.amount_min;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.wallets.fee = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_missing_rpc_and_bad_token() {
        let mut config = Config::default();
        config.chain.rpc_endpoints.sepolia.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chain.target_token_address = Some("0x1234".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mask_url() {
        assert_eq!(
            mask_url("https://api.example.com?key=secret"),
            "https://api.example.com?***"
        );
        assert_eq!(
            mask_url("https://api.example.com"),
            "https://api.example.com"
        );
    }
}
