//! Reward-debt accounting on top of the share accumulator.
//!
//! A staked token's claimable reward is the growth of its type's
//! accumulator since the token's debt snapshot, plus anything settled into
//! pending by an earlier unstake:
//!
//! ```text
//! unclaimed = pending + (staked ? tail(type) - debt : 0)
//! ```

use nrc_core::error::LedgerError;
use nrc_core::fixed;
use nrc_core::types::{PieceType, TokenId};

use crate::registry::StakeRegistry;
use crate::share_ledger::ShareLedger;

/// Reward accrued between a debt snapshot and the current tail.
///
/// # Errors
///
/// - [`LedgerError::RewardDebtExceedsAccumulator`] if `debt > tail`, which
///   would mean the accumulator went backwards
pub fn accrued(token: TokenId, tail: u128, debt: u128) -> Result<u128, LedgerError> {
    tail.checked_sub(debt)
        .ok_or(LedgerError::RewardDebtExceedsAccumulator { token, debt, tail })
}

/// Claimable reward of `token` right now.
pub fn unclaimed(registry: &StakeRegistry, shares: &ShareLedger, token: TokenId) -> Result<u128, LedgerError> {
    let pending = registry.pending(token);
    if !registry.is_staked(token) {
        return Ok(pending);
    }
    let tail = shares.tail(PieceType::from_token_id(token));
    let live = accrued(token, tail, registry.reward_debt(token))?;
    Ok(fixed::checked_add(pending, live)?)
}

/// Claim planned against the current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimPlan {
    pub token: TokenId,
    pub amount: u128,
    /// Unstaked token still holding NftShares that the claim releases.
    pub releases_shares: bool,
}

impl ClaimPlan {
    pub fn new(registry: &StakeRegistry, shares: &ShareLedger, token: TokenId) -> Result<Self, LedgerError> {
        Ok(Self {
            token,
            amount: unclaimed(registry, shares, token)?,
            releases_shares: !registry.is_staked(token) && registry.nft_shares(token) > 0,
        })
    }

    /// Whether committing would write anything.
    pub fn changes_state(&self) -> bool {
        self.amount > 0 || self.releases_shares
    }

    /// Write the claim back: debt moves to the tail and pending is cleared.
    pub fn commit(&self, registry: &mut StakeRegistry, shares: &ShareLedger) {
        registry.settle_claim(shares, self.token);
    }
}
