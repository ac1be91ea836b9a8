//! Core types for trading runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transaction hash returned by the execution client
pub type TransactionId = String;

/// Orchestrator machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RunState {
    Idle = 0,
    Running = 1,
    Stopped = 2,
    Completed = 3,
    Failed = 4,
}

impl RunState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => RunState::Running,
            2 => RunState::Stopped,
            3 => RunState::Completed,
            4 => RunState::Failed,
            _ => RunState::Idle,
        }
    }

    /// Stopped, Completed or Failed
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Stopped | RunState::Completed | RunState::Failed
        )
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Running => write!(f, "running"),
            RunState::Stopped => write!(f, "stopped"),
            RunState::Completed => write!(f, "completed"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

/// Trade counters, used both as run totals and as per-wallet deltas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_trades: u64,
    pub successful_trades: u64,
    pub total_volume: f64,
}

impl RunStats {
    /// Account one attempted leg
    pub fn record_leg(&mut self, succeeded: bool, amount: f64) {
        self.total_trades += 1;
        if succeeded {
            self.successful_trades += 1;
            self.total_volume += amount;
        }
    }

    /// Fold a delta into these totals
    pub fn merge(&mut self, delta: &RunStats) {
        self.total_trades += delta.total_trades;
        self.successful_trades += delta.successful_trades;
        self.total_volume += delta.total_volume;
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_trades == 0 {
            0.0
        } else {
            self.successful_trades as f64 / self.total_trades as f64
        }
    }
}

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Structured notification emitted during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl TradeEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            severity,
            message: message.into(),
            wallet_address: None,
            transaction_id: None,
            amount: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn with_wallet(mut self, address: &str) -> Self {
        self.wallet_address = Some(address.to_string());
        self
    }

    pub fn with_transaction(mut self, tx: TransactionId) -> Self {
        self.transaction_id = Some(tx);
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }
}

/// Summary returned when a run ends in Completed or Stopped
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub state: RunState,
    pub stats: RunStats,
    /// Eligible wallets whose legs were attempted
    pub wallets_processed: usize,
    pub eligible_wallets: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrip_u8() {
        for state in [
            RunState::Idle,
            RunState::Running,
            RunState::Stopped,
            RunState::Completed,
            RunState::Failed,
        ] {
            assert_eq!(RunState::from_u8(state as u8), state);
        }
        assert!(RunState::Failed.is_terminal());
        assert!(!RunState::Running.is_terminal());
    }

    #[test]
    fn test_record_leg() {
        let mut stats = RunStats::default();
        stats.record_leg(true, 0.002);
        stats.record_leg(false, 0.002);

        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.successful_trades, 1);
        assert_eq!(stats.total_volume, 0.002);
        assert_eq!(stats.success_rate(), 0.5);
    }

    #[test]
    fn test_merge() {
        let mut totals = RunStats {
            total_trades: 4,
            successful_trades: 3,
            total_volume: 0.01,
        };
        totals.merge(&RunStats {
            total_trades: 2,
            successful_trades: 2,
            total_volume: 0.004,
        });
        assert_eq!(totals.total_trades, 6);
        assert_eq!(totals.successful_trades, 5);
        assert!((totals.total_volume - 0.014).abs() < 1e-12);
    }

    #[test]
    fn test_event_builder() {
        let event = TradeEvent::success("Buy confirmed")
            .with_wallet("0xabc")
            .with_transaction("0xdead".to_string())
            .with_amount(0.001);

        assert_eq!(event.severity, Severity::Success);
        assert_eq!(event.wallet_address.as_deref(), Some("0xabc"));
        assert_eq!(event.transaction_id.as_deref(), Some("0xdead"));
        assert_eq!(event.amount, Some(0.001));
    }
}
