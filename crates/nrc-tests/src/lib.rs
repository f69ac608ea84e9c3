//! Cross-crate test suite for the Number Runner Club ledger.
//!
//! Integration tests live in `tests/`: end-to-end player flows and
//! adversarial property tests against ledger invariants.

pub mod helpers;
