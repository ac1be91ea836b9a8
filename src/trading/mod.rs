//! Trading module - paced buy/sell runs over funded wallets
//!
//! - [`Orchestrator`]: one sequential, cancellable run at a time
//! - [`ExecutionClient`]: where legs are submitted (simulated or real)
//! - [`EventSink`]: where run notifications and stat deltas go

pub mod events;
pub mod execution;
pub mod orchestrator;
pub mod randomization;
pub mod types;

pub use events::{ChannelSink, EventSink, RunMessage, TracingSink};
pub use execution::{ExecutionClient, SimulatedExecutor};
pub use orchestrator::Orchestrator;
pub use randomization::Randomizer;
pub use types::{RunReport, RunState, RunStats, Severity, TradeEvent, TransactionId};
