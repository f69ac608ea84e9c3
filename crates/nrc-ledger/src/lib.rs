//! # nrc-ledger: staking ledger for Number Runner Club.
//!
//! - [`share_ledger::ShareLedger`]: per-type, per-epoch reward accumulator
//! - [`registry`]: token ownership and stake records
//! - [`rewards`]: reward-debt accounting and claims
//! - [`king_hand`]: two-phase king-hand reveal
//! - [`state::LedgerState`]: the state machine tying them together
//! - [`ledger::Ledger`]: thread-safe façade over the state
//! - [`config::LedgerConfig`]: prices, limits and auction parameters

pub mod config;
pub mod king_hand;
pub mod ledger;
pub mod registry;
pub mod rewards;
pub mod share_ledger;
pub mod state;

pub use config::LedgerConfig;
pub use ledger::Ledger;
pub use share_ledger::ShareLedger;
pub use state::{LedgerState, LedgerSummary};
