//! Trading orchestrator
//!
//! Drives one run at a time over the funded wallets: buy, random pause,
//! sell, random pause, next wallet. Wallets are visited strictly in order
//! and legs never overlap: the execution client may share one nonce
//! sequencer or rate limit across all wallets.
//!
//! # State machine
//!
//! ```text
//! Idle ──start()──▶ Running ──▶ Completed | Stopped | Failed
//!   ▲                                     │
//!   └──────────── next start() / reset() ─┘
//! ```
//!
//! `start()` claims the Running state with an atomic compare-exchange, so a
//! second concurrent `start()` fails with [`Error::NotIdle`]. Cancellation is
//! cooperative: `stop()` cancels the run's token, which is checked before each
//! wallet and raced against every pause. A transaction already handed to the
//! execution client is always allowed to finish.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::TradingConfig;
use crate::error::{Error, Result};
use crate::wallet::{WalletRecord, WalletStatus};

use super::events::EventSink;
use super::execution::ExecutionClient;
use super::randomization::Randomizer;
use super::types::{RunReport, RunState, RunStats, TradeEvent};

/// Sequential, cancellable buy/sell scheduler
pub struct Orchestrator {
    executor: Arc<dyn ExecutionClient>,
    sink: Arc<dyn EventSink>,
    randomizer: tokio::sync::Mutex<Randomizer>,
    state: AtomicU8,
    /// Token of the active run; guarded together with state transitions
    cancel: Mutex<Option<CancellationToken>>,
    current_wallet: AtomicUsize,
}

impl Orchestrator {
    pub fn new(executor: Arc<dyn ExecutionClient>, sink: Arc<dyn EventSink>) -> Self {
        Self::with_randomizer(executor, sink, Randomizer::from_entropy())
    }

    /// Use a specific random source for pacing (seeded in tests)
    pub fn with_randomizer(
        executor: Arc<dyn ExecutionClient>,
        sink: Arc<dyn EventSink>,
        randomizer: Randomizer,
    ) -> Self {
        Self {
            executor,
            sink,
            randomizer: tokio::sync::Mutex::new(randomizer),
            state: AtomicU8::new(RunState::Idle as u8),
            cancel: Mutex::new(None),
            current_wallet: AtomicUsize::new(0),
        }
    }

    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    /// Position of the wallet being traded within the run's eligible set
    pub fn current_wallet_index(&self) -> usize {
        self.current_wallet.load(Ordering::SeqCst)
    }

    /// Return a finished orchestrator to Idle
    ///
    /// Returns false while a run is active.
    pub fn reset(&self) -> bool {
        let _slot = self.cancel_slot();
        let current = self.state();
        if !current.is_terminal() {
            return current == RunState::Idle;
        }
        self.state.store(RunState::Idle as u8, Ordering::SeqCst);
        true
    }

    /// Request cancellation of the active run
    ///
    /// No-op when nothing is running. The run reaches Stopped at its next
    /// suspension point.
    pub fn stop(&self) {
        let slot = self.cancel_slot();
        if self.state() != RunState::Running {
            debug!("stop() ignored, orchestrator is {}", self.state());
            return;
        }
        if let Some(token) = slot.as_ref() {
            info!("Stop requested");
            token.cancel();
        }
    }

    /// Run one trading cycle over the funded wallets
    ///
    /// Eligibility (`funded_amount > 0`) is evaluated once here; the eligible
    /// set and its order are fixed for the whole run. Wallet statuses are
    /// updated in place. Each finished leg is reported to the sink as a
    /// one-leg stats delta.
    pub async fn start(
        &self,
        wallets: &mut [WalletRecord],
        config: &TradingConfig,
    ) -> Result<RunReport> {
        // Running is claimed before the eligibility check, so an empty set
        // moves straight on to Failed and only that outcome is reported.
        let token = self.begin()?;
        let mut guard = ActiveRun {
            orchestrator: self,
            finished: false,
        };

        let eligible: Vec<usize> = wallets
            .iter()
            .enumerate()
            .filter(|(_, w)| w.is_eligible())
            .map(|(i, _)| i)
            .collect();

        if eligible.is_empty() {
            guard.finish(RunState::Failed);
            self.sink.emit(TradeEvent::error(
                "Trading run failed: no funded wallets available",
            ));
            return Err(Error::NoEligibleWallets);
        }

        info!(
            "Starting trading run over {} of {} wallets",
            eligible.len(),
            wallets.len()
        );
        self.sink.emit(TradeEvent::info(format!(
            "Trading run started with {} funded wallets",
            eligible.len()
        )));

        let mut stats = RunStats::default();
        let mut processed = 0;
        let mut cancelled = false;

        for (position, &index) in eligible.iter().enumerate() {
            if token.is_cancelled() {
                cancelled = true;
                break;
            }
            self.current_wallet.store(position, Ordering::SeqCst);

            let interrupted = self
                .trade_wallet(&mut wallets[index], config, &token, &mut stats)
                .await;
            processed += 1;

            if interrupted {
                cancelled = true;
                break;
            }

            if position + 1 < eligible.len() {
                let delay = self.next_delay(config).await;
                self.sink.emit(TradeEvent::info(format!(
                    "Waiting {:.1}s before the next wallet",
                    delay.as_secs_f64()
                )));
                if !pause(delay, &token).await {
                    cancelled = true;
                    break;
                }
            }
        }

        let state = if cancelled {
            RunState::Stopped
        } else {
            RunState::Completed
        };
        guard.finish(state);

        if cancelled {
            warn!("Trading run stopped after {} of {} wallets", processed, eligible.len());
            self.sink.emit(TradeEvent::warning(format!(
                "Trading run stopped after {} of {} wallets",
                processed,
                eligible.len()
            )));
        } else {
            info!(
                "Trading run completed: {} trades, {} successful, volume {}",
                stats.total_trades, stats.successful_trades, stats.total_volume
            );
            self.sink.emit(TradeEvent::success(format!(
                "Trading cycle completed: {} of {} trades successful",
                stats.successful_trades, stats.total_trades
            )));
        }

        Ok(RunReport {
            state,
            stats,
            wallets_processed: processed,
            eligible_wallets: eligible.len(),
        })
    }

    /// Buy, pause, sell for one wallet
    ///
    /// Returns true when the run was cancelled while holding the position.
    async fn trade_wallet(
        &self,
        wallet: &mut WalletRecord,
        config: &TradingConfig,
        token: &CancellationToken,
        stats: &mut RunStats,
    ) -> bool {
        let mut in_flight = WalletInFlight::new(wallet);
        let wallet = &mut *in_flight.wallet;
        let amount = wallet.assigned_amount();
        let short = wallet.short_address();

        self.sink.emit(
            TradeEvent::info(format!("Buying with wallet {}", short))
                .with_wallet(&wallet.address)
                .with_amount(amount),
        );

        match self.executor.submit_buy(wallet).await {
            Ok(tx) => {
                self.report_leg(stats, true, amount);
                self.sink.emit(
                    TradeEvent::success("Buy confirmed")
                        .with_wallet(&wallet.address)
                        .with_transaction(tx)
                        .with_amount(amount),
                );
            }
            Err(e) => {
                self.report_leg(stats, false, amount);
                wallet.status = WalletStatus::Error;
                warn!("Buy failed for {}: {}", short, e);
                self.sink.emit(
                    TradeEvent::error(format!("Buy failed for wallet {}: {}", short, e))
                        .with_wallet(&wallet.address),
                );
                return false;
            }
        }

        let delay = self.next_delay(config).await;
        self.sink.emit(
            TradeEvent::info(format!("Waiting {:.1}s before selling", delay.as_secs_f64()))
                .with_wallet(&wallet.address),
        );
        if !pause(delay, token).await {
            wallet.status = WalletStatus::Idle;
            self.sink.emit(
                TradeEvent::warning(format!(
                    "Sell skipped for wallet {}: run stopped while holding the position",
                    short
                ))
                .with_wallet(&wallet.address),
            );
            return true;
        }

        self.sink.emit(
            TradeEvent::info(format!("Selling with wallet {}", short)).with_wallet(&wallet.address),
        );

        match self.executor.submit_sell(wallet).await {
            Ok(tx) => {
                self.report_leg(stats, true, amount);
                wallet.status = WalletStatus::Idle;
                self.sink.emit(
                    TradeEvent::success("Sell confirmed")
                        .with_wallet(&wallet.address)
                        .with_transaction(tx)
                        .with_amount(amount),
                );
            }
            Err(e) => {
                self.report_leg(stats, false, amount);
                wallet.status = WalletStatus::Error;
                warn!("Sell failed for {}: {}", short, e);
                self.sink.emit(
                    TradeEvent::error(format!("Sell failed for wallet {}: {}", short, e))
                        .with_wallet(&wallet.address),
                );
            }
        }

        false
    }

    /// Count one finished leg and hand its delta to the sink right away
    fn report_leg(&self, stats: &mut RunStats, succeeded: bool, amount: f64) {
        let mut delta = RunStats::default();
        delta.record_leg(succeeded, amount);
        stats.merge(&delta);
        self.sink.record_stats(delta);
    }

    async fn next_delay(&self, config: &TradingConfig) -> Duration {
        self.randomizer
            .lock()
            .await
            .random_delay(config.min_interval_ms, config.max_interval_ms)
    }

    /// Claim the Running state and install a fresh cancellation token
    fn begin(&self) -> Result<CancellationToken> {
        let mut slot = self.cancel_slot();
        let current = self.state.load(Ordering::SeqCst);
        if current == RunState::Running as u8 {
            return Err(Error::NotIdle);
        }
        self.state
            .compare_exchange(
                current,
                RunState::Running as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map_err(|_| Error::NotIdle)?;

        self.current_wallet.store(0, Ordering::SeqCst);
        let token = CancellationToken::new();
        *slot = Some(token.clone());
        Ok(token)
    }

    fn end(&self, state: RunState) {
        let mut slot = self.cancel_slot();
        self.state.store(state as u8, Ordering::SeqCst);
        *slot = None;
    }

    fn cancel_slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.cancel.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Releases the Running state even if the run future is dropped mid-way
struct ActiveRun<'a> {
    orchestrator: &'a Orchestrator,
    finished: bool,
}

impl ActiveRun<'_> {
    fn finish(&mut self, state: RunState) {
        self.orchestrator.end(state);
        self.finished = true;
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Trading run abandoned, marking as stopped");
            self.orchestrator.end(RunState::Stopped);
            self.orchestrator.sink.emit(TradeEvent::warning(
                "Trading run stopped: run abandoned before completion",
            ));
        }
    }
}

/// Marks a wallet as trading; puts it back to Idle if dropped mid-trade
struct WalletInFlight<'w> {
    wallet: &'w mut WalletRecord,
}

impl<'w> WalletInFlight<'w> {
    fn new(wallet: &'w mut WalletRecord) -> Self {
        wallet.status = WalletStatus::Trading;
        Self { wallet }
    }
}

impl Drop for WalletInFlight<'_> {
    fn drop(&mut self) {
        if self.wallet.status == WalletStatus::Trading {
            self.wallet.status = WalletStatus::Idle;
        }
    }
}

/// Sleep unless cancelled first; returns false when cancelled
async fn pause(delay: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
