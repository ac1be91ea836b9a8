//! Execution clients
//!
//! The orchestrator submits each leg through an [`ExecutionClient`]. The core
//! calls each method at most once per attempted leg and never retries.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Leg, Result};
use crate::wallet::WalletRecord;

use super::randomization::Randomizer;
use super::types::TransactionId;

/// Submits buy and sell transactions for a wallet
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    async fn submit_buy(&self, wallet: &WalletRecord) -> Result<TransactionId>;

    async fn submit_sell(&self, wallet: &WalletRecord) -> Result<TransactionId>;
}

/// Dry-run client: waits a fixed latency and returns a random hash
///
/// `failure_rate` makes a share of legs fail so error paths can be exercised
/// without a chain.
pub struct SimulatedExecutor {
    latency: Duration,
    failure_rate: f64,
    randomizer: Mutex<Randomizer>,
}

impl SimulatedExecutor {
    pub fn new(latency: Duration, failure_rate: f64, seed: Option<u64>) -> Self {
        Self {
            latency,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            randomizer: Mutex::new(Randomizer::new(seed)),
        }
    }

    async fn submit(&self, leg: Leg, wallet: &WalletRecord) -> Result<TransactionId> {
        let (fails, hash) = {
            let mut randomizer = self.randomizer.lock().await;
            (
                randomizer.should_act(self.failure_rate),
                randomizer.random_hash(),
            )
        };

        tokio::time::sleep(self.latency).await;

        if fails {
            return Err(Error::transaction(
                leg,
                &wallet.address,
                "simulated rejection",
            ));
        }

        debug!("Simulated {} for {}: {}", leg, wallet.short_address(), hash);
        Ok(hash)
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000), 0.0, None)
    }
}

#[async_trait]
impl ExecutionClient for SimulatedExecutor {
    async fn submit_buy(&self, wallet: &WalletRecord) -> Result<TransactionId> {
        self.submit(Leg::Buy, wallet).await
    }

    async fn submit_sell(&self, wallet: &WalletRecord) -> Result<TransactionId> {
        self.submit(Leg::Sell, wallet).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> WalletRecord {
        WalletRecord::new("0xabc".to_string(), String::new(), None, 0.001)
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_success() {
        let executor = SimulatedExecutor::new(Duration::from_millis(2000), 0.0, Some(1));
        let started = tokio::time::Instant::now();

        let tx = executor.submit_buy(&wallet()).await.unwrap();

        assert_eq!(tx.len(), 66);
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_failure() {
        let executor = SimulatedExecutor::new(Duration::from_millis(10), 1.0, Some(1));

        let err = executor.submit_sell(&wallet()).await.unwrap_err();
        assert!(matches!(err, Error::Transaction { leg: Leg::Sell, .. }));
    }
}
