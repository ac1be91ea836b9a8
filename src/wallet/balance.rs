//! Balance lookups
//!
//! The orchestrator never queries balances itself. Callers use a
//! [`BalanceOracle`] to populate `funded_amount` before starting a run.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::types::WalletRecord;

const WEI_PER_ETHER: f64 = 1e18;

/// Source of native-token balances, in whole ether units
#[async_trait]
pub trait BalanceOracle: Send + Sync {
    async fn get_balance(&self, address: &str) -> Result<f64>;
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: [&'a str; 2],
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// `eth_getBalance` over JSON-RPC
pub struct RpcBalanceOracle {
    client: Client,
    endpoint: String,
}

impl RpcBalanceOracle {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl BalanceOracle for RpcBalanceOracle {
    async fn get_balance(&self, address: &str) -> Result<f64> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_getBalance",
            params: [address, "latest"],
        };

        let response: RpcResponse = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Rpc(format!("HTTP request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| Error::Rpc(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = response.error {
            return Err(Error::Rpc(format!("{} (code {})", error.message, error.code)));
        }

        let quantity = response
            .result
            .ok_or_else(|| Error::Rpc("No result in response".to_string()))?;
        wei_hex_to_ether(&quantity)
    }
}

/// Convert a JSON-RPC hex quantity in wei to ether
fn wei_hex_to_ether(quantity: &str) -> Result<f64> {
    let digits = quantity
        .strip_prefix("0x")
        .ok_or_else(|| Error::Rpc(format!("Malformed quantity: {}", quantity)))?;
    if digits.is_empty() {
        return Err(Error::Rpc(format!("Malformed quantity: {}", quantity)));
    }
    let wei = u128::from_str_radix(digits, 16)
        .map_err(|e| Error::Rpc(format!("Malformed quantity {}: {}", quantity, e)))?;
    Ok(wei as f64 / WEI_PER_ETHER)
}

/// Refresh `funded_amount` for every wallet
///
/// A failed lookup is logged and leaves that wallet's balance unchanged.
/// Returns how many wallets ended up funded.
pub async fn refresh_funding(oracle: &dyn BalanceOracle, wallets: &mut [WalletRecord]) -> usize {
    for wallet in wallets.iter_mut() {
        match oracle.get_balance(&wallet.address).await {
            Ok(balance) => {
                debug!("Balance of {}: {}", wallet.short_address(), balance);
                wallet.funded_amount = balance;
            }
            Err(e) => {
                warn!("Balance lookup failed for {}: {}", wallet.short_address(), e);
            }
        }
    }

    let funded = wallets.iter().filter(|w| w.is_eligible()).count();
    info!("{} of {} wallets funded", funded, wallets.len());
    funded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedOracle {
        balances: HashMap<String, f64>,
    }

    #[async_trait]
    impl BalanceOracle for FixedOracle {
        async fn get_balance(&self, address: &str) -> Result<f64> {
            self.balances
                .get(address)
                .copied()
                .ok_or_else(|| Error::Rpc("unknown address".to_string()))
        }
    }

    fn wallet(address: &str) -> WalletRecord {
        WalletRecord::new(address.to_string(), String::new(), None, 0.001)
    }

    #[test]
    fn test_wei_conversion() {
        assert_eq!(wei_hex_to_ether("0x0").unwrap(), 0.0);
        assert_eq!(wei_hex_to_ether("0xde0b6b3a7640000").unwrap(), 1.0);
        assert!(wei_hex_to_ether("123").is_err());
        assert!(wei_hex_to_ether("0x").is_err());
        assert!(wei_hex_to_ether("0xzz").is_err());
    }

    #[tokio::test]
    async fn test_refresh_funding() {
        let oracle = FixedOracle {
            balances: HashMap::from([("0xa".to_string(), 0.2), ("0xb".to_string(), 0.0)]),
        };
        let mut wallets = vec![wallet("0xa"), wallet("0xb"), wallet("0xc")];
        wallets[2].funded_amount = 0.7;

        let funded = refresh_funding(&oracle, &mut wallets).await;

        assert_eq!(funded, 2);
        assert_eq!(wallets[0].funded_amount, 0.2);
        assert_eq!(wallets[1].funded_amount, 0.0);
        // lookup failed, previous value kept
        assert_eq!(wallets[2].funded_amount, 0.7);
    }
}
