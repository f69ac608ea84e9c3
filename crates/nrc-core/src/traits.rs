//! Trait interfaces between the ledger and its collaborators.
//!
//! - [`PriceCalculator`]: descending auction price curve (nrc-auction implements)
//! - [`RewardPool`]: external balance that funds reward and prize payouts

use crate::error::{CurveError, PoolError};
use crate::types::Address;

/// Pure computation of a time-decaying price.
///
/// All math is integer fixed point (Q64.64, see [`crate::fixed`]).
pub trait PriceCalculator: Send + Sync {
    /// Raw curve value after `elapsed_secs`, in Q64.64.
    ///
    /// `1.0` at zero elapsed time, non-increasing afterwards.
    fn factor(&self, elapsed_secs: u64) -> Result<u128, CurveError>;

    /// Price in wei after `elapsed_secs`. Never below [`floor_price`](Self::floor_price).
    fn price(&self, elapsed_secs: u64) -> Result<u128, CurveError>;

    /// Opening price in wei.
    fn base_price(&self) -> u128;

    /// Lowest price the curve converges to, in wei.
    fn floor_price(&self) -> u128;
}

/// The balance that backs reward and king-hand payouts.
///
/// The ledger never holds funds itself: it credits the staker share of
/// each payment here, reads the balance to bound payouts, and debits
/// successful claims. Implementations perform the actual value transfer.
pub trait RewardPool: Send + Sync {
    /// Current balance in wei.
    fn balance(&self) -> u128;

    /// Add an inflow to the pool.
    fn credit(&self, amount: u128) -> Result<(), PoolError>;

    /// Pay `amount` out of the pool to `to`.
    fn debit(&self, to: &Address, amount: u128) -> Result<(), PoolError>;

    /// Check whether a payout of `amount` can be covered.
    ///
    /// Default implementation compares against [`balance`](Self::balance).
    fn ensure_covers(&self, amount: u128) -> Result<(), PoolError> {
        let have = self.balance();
        if have < amount {
            return Err(PoolError::Insufficient { have, need: amount });
        }
        Ok(())
    }
}
