//! Event sinks for run notifications and stat deltas

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::wallet::types::short_address;

use super::types::{RunStats, Severity, TradeEvent};

/// Receiver of everything a run reports
///
/// The orchestrator only writes to a sink; it never reads back.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: TradeEvent);

    /// Stats accumulated for one wallet, to be merged by the caller
    fn record_stats(&self, delta: RunStats);
}

/// Message carried by [`ChannelSink`]
#[derive(Debug, Clone)]
pub enum RunMessage {
    Event(TradeEvent),
    Stats(RunStats),
}

/// Forwards events and stat deltas over an unbounded channel
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<RunMessage>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RunMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: TradeEvent) {
        if self.tx.send(RunMessage::Event(event)).is_err() {
            debug!("Event receiver dropped");
        }
    }

    fn record_stats(&self, delta: RunStats) {
        if self.tx.send(RunMessage::Stats(delta)).is_err() {
            debug!("Stats receiver dropped");
        }
    }
}

/// Writes events to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: TradeEvent) {
        let wallet = event
            .wallet_address
            .as_deref()
            .map(short_address)
            .unwrap_or_else(|| "-".to_string());
        let tx = event.transaction_id.as_deref().unwrap_or("-");
        match event.severity {
            Severity::Info => info!(wallet = %wallet, tx = %tx, "{}", event.message),
            Severity::Success => info!(wallet = %wallet, tx = %tx, success = true, "{}", event.message),
            Severity::Warning => warn!(wallet = %wallet, tx = %tx, "{}", event.message),
            Severity::Error => error!(wallet = %wallet, tx = %tx, "{}", event.message),
        }
    }

    fn record_stats(&self, delta: RunStats) {
        debug!(
            "Stats delta: trades={} successful={} volume={}",
            delta.total_trades, delta.successful_trades, delta.total_volume
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_forwards_in_order() {
        let (sink, mut rx) = ChannelSink::new();
        sink.emit(TradeEvent::info("first"));
        sink.record_stats(RunStats {
            total_trades: 2,
            successful_trades: 2,
            total_volume: 0.004,
        });
        drop(sink);

        match rx.recv().await {
            Some(RunMessage::Event(e)) => assert_eq!(e.message, "first"),
            other => panic!("unexpected message: {:?}", other),
        }
        match rx.recv().await {
            Some(RunMessage::Stats(s)) => assert_eq!(s.total_trades, 2),
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.emit(TradeEvent::warning("nobody listening"));
    }
}
