//! # nrc-auction: Dutch auction pricing for the king sale.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! - **Decay table**: `decay^n` in Q64.64 for whole periods, built once per
//!   curve by repeated checked multiplication so every entry is exactly the
//!   previous entry times the decay factor, rounded down.
//! - **Interpolation**: inside a period the curve is linear between two
//!   table entries, which keeps the price monotone and continuous.
//! - **Floor**: the price approaches a floor and never drops below it.

pub mod curve;
pub mod schedule;

pub use curve::PriceCurve;
pub use schedule::AuctionSchedule;
