//! # nrc-core
//! Foundation types and traits for the Number Runner Club ledger.

pub mod constants;
pub mod error;
pub mod events;
pub mod fixed;
pub mod pool;
pub mod traits;
pub mod types;
