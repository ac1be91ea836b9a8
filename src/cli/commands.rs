//! CLI command implementations

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dialoguer::Confirm;
use tracing::{info, warn};

use crate::config::Config;
use crate::trading::{
    ChannelSink, EventSink, Orchestrator, Randomizer, RunMessage, RunStats, SimulatedExecutor,
    TracingSink,
};
use crate::wallet::{
    self, refresh_funding, JsonFileStore, RpcBalanceOracle, WalletRecord, WalletStore,
};

fn store(config: &Config) -> JsonFileStore {
    JsonFileStore::new(&config.wallets.storage_dir)
}

fn load_batch(config: &Config, file: Option<&str>) -> Result<Vec<WalletRecord>> {
    let wallets = store(config)
        .load(file)
        .context("Failed to load wallet batch")?;
    if wallets.is_empty() {
        anyhow::bail!(
            "No saved wallets in {}. Run 'wallet generate --save' first",
            config.wallets.storage_dir
        );
    }
    Ok(wallets)
}

/// Generate a batch of sub-wallets
pub async fn wallet_generate(config: &Config, count: Option<usize>, save: bool) -> Result<()> {
    let count = count.unwrap_or(config.wallets.count);
    let wallets = wallet::generate(count, config.wallets.amount_range())
        .context("Wallet generation failed")?;

    println!("\n=== GENERATED WALLETS ===\n");
    println!("{:<4} {:<44} {}", "#", "ADDRESS", "AMOUNT");
    println!("{}", "-".repeat(64));
    for (i, w) in wallets.iter().enumerate() {
        println!(
            "{:<4} {:<44} {:.6} {}",
            i + 1,
            w.address,
            w.assigned_amount(),
            config.chain.network.symbol()
        );
    }
    println!();

    if save {
        let id = store(config).save(&wallets).context("Failed to save wallets")?;
        println!("Saved batch: {}/{}", config.wallets.storage_dir, id);
    } else {
        warn!("Wallets were not saved; their keys are lost when this process exits");
    }

    Ok(())
}

/// List wallets from a saved batch
pub async fn wallet_list(config: &Config, file: Option<String>, reveal: bool) -> Result<()> {
    let wallets = load_batch(config, file.as_deref())?;

    let reveal = reveal
        && Confirm::new()
            .with_prompt("Print private keys and mnemonics to the terminal?")
            .default(false)
            .interact()?;

    println!("\n=== SAVED WALLETS ===\n");
    println!("{:<44} {:<12} {:<12} {}", "ADDRESS", "AMOUNT", "FUNDED", "STATUS");
    println!("{}", "-".repeat(80));
    for w in &wallets {
        println!(
            "{:<44} {:<12.6} {:<12.6} {}",
            w.address,
            w.assigned_amount(),
            w.funded_amount,
            w.status
        );
        if reveal {
            println!("  Private key: {}", w.private_key);
            if let Some(phrase) = &w.mnemonic {
                println!("  Mnemonic:    {}", phrase);
            }
        }
    }
    println!();

    Ok(())
}

/// Validate an address string
pub fn wallet_validate_address(address: &str) -> Result<()> {
    if wallet::validate_address(address) {
        println!("Valid address");
        Ok(())
    } else {
        anyhow::bail!("Invalid address: {}", address)
    }
}

/// Validate a private key string
pub fn wallet_validate_key(private_key: &str) -> Result<()> {
    if wallet::validate_private_key(private_key) {
        println!("Valid private key");
        Ok(())
    } else {
        // the candidate itself is never echoed
        anyhow::bail!("Invalid private key")
    }
}

/// Refresh funded balances over RPC and save them as a new batch
pub async fn wallet_balances(config: &Config, file: Option<String>) -> Result<()> {
    let mut wallets = load_batch(config, file.as_deref())?;
    let oracle = RpcBalanceOracle::new(config.chain.rpc_endpoint());

    info!(
        "Checking {} balances on {}",
        wallets.len(),
        config.chain.network
    );
    let funded = refresh_funding(&oracle, &mut wallets).await;

    for w in &wallets {
        println!(
            "{:<44} {:.6} {}",
            w.address,
            w.funded_amount,
            config.chain.network.symbol()
        );
    }
    println!("\n{} of {} wallets funded", funded, wallets.len());

    let id = store(config).save(&wallets).context("Failed to save wallets")?;
    println!("Saved batch: {}/{}", config.wallets.storage_dir, id);
    Ok(())
}

/// Run one dry-run trading cycle over a saved batch
pub async fn run(
    config: &Config,
    file: Option<String>,
    fund_all: bool,
    seed: Option<u64>,
) -> Result<()> {
    let mut wallets = load_batch(config, file.as_deref())?;
    if fund_all {
        for w in wallets.iter_mut() {
            w.funded_amount = w.assigned_amount();
        }
    }

    warn!("Running with the simulated executor - no real transactions are sent");

    let executor = Arc::new(SimulatedExecutor::new(
        Duration::from_millis(config.trading.simulated_latency_ms),
        config.trading.simulated_failure_rate,
        seed,
    ));
    let (sink, mut rx) = ChannelSink::new();
    let orchestrator = Arc::new(Orchestrator::with_randomizer(
        executor,
        Arc::new(sink),
        Randomizer::new(seed),
    ));

    // Forward events to the log and keep long-lived totals
    let collector = tokio::spawn(async move {
        let log = TracingSink;
        let mut totals = RunStats::default();
        while let Some(msg) = rx.recv().await {
            match msg {
                RunMessage::Event(event) => log.emit(event),
                RunMessage::Stats(delta) => totals.merge(&delta),
            }
        }
        totals
    });

    let stopper = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received, stopping after the current step");
                orchestrator.stop();
            }
        })
    };

    let result = orchestrator.start(&mut wallets, &config.trading).await;
    stopper.abort();
    let _ = stopper.await;
    // last sender goes away with the orchestrator
    drop(orchestrator);
    let totals = collector.await.context("Event collector failed")?;

    let report = result.context("Trading run failed")?;

    println!("\n=== RUN SUMMARY ===\n");
    println!("State:            {}", report.state);
    println!(
        "Wallets:          {} of {} processed",
        report.wallets_processed, report.eligible_wallets
    );
    println!("Total trades:     {}", totals.total_trades);
    println!("Successful:       {}", totals.successful_trades);
    println!(
        "Volume:           {:.6} {}",
        totals.total_volume,
        config.chain.network.symbol()
    );
    println!("Success rate:     {:.1}%", totals.success_rate() * 100.0);

    Ok(())
}

/// Show configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}
