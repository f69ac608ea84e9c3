//! Per-piece-type, per-epoch cumulative share accounting.
//!
//! Two tables share the same shape `[piece type][epoch]`:
//!
//! - the **reward accumulator**: cumulative reward paid per staked token of
//!   each type. Non-decreasing along the epoch axis; a token's reward is the
//!   difference between two cells, so reward queries are O(1).
//! - the **share history**: the running total of staked share weight per
//!   type. The last column is live; earlier columns are frozen values
//!   carried forward by [`ShareLedger::advance_epoch`].
//!
//! Every new column is seeded with the previous column's value.

use nrc_core::constants::PIECE_TYPE_COUNT;
use nrc_core::error::{LedgerError, MathError};
use nrc_core::fixed;
use nrc_core::types::{Epoch, PieceType};

/// Result of spreading one epoch's inflow over the staked tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Distribution {
    /// Per-token accumulator increment, by piece type.
    pub increments: [u128; PIECE_TYPE_COUNT],
    /// Amount actually assigned to stakers.
    pub distributed: u128,
    /// Rounding remainder (or everything, if nothing is staked).
    pub dust: u128,
}

/// The share accumulator ledger.
#[derive(Clone, Debug)]
pub struct ShareLedger {
    epoch: Epoch,
    accumulator: [Vec<u128>; PIECE_TYPE_COUNT],
    share_history: [Vec<u64>; PIECE_TYPE_COUNT],
}

impl Default for ShareLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ShareLedger {
    /// Ledger at epoch 0 with one zeroed column.
    pub fn new() -> Self {
        Self {
            epoch: 0,
            accumulator: std::array::from_fn(|_| vec![0]),
            share_history: std::array::from_fn(|_| vec![0]),
        }
    }

    /// Current epoch.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// `(rows, cols)`: six piece types by `epoch + 1` columns.
    pub fn size(&self) -> (usize, usize) {
        (PIECE_TYPE_COUNT, self.accumulator[0].len())
    }

    /// Live staked share weight of one type.
    pub fn type_shares(&self, piece: PieceType) -> u64 {
        last(&self.share_history[piece.index()])
    }

    /// Live staked share weight across all types.
    pub fn total_shares(&self) -> u128 {
        PieceType::ALL
            .iter()
            .map(|&p| self.type_shares(p) as u128)
            .sum()
    }

    /// Number of staked tokens of one type. All tokens of a type share one weight.
    pub fn staked_count(&self, piece: PieceType) -> u64 {
        self.type_shares(piece) / piece.share_weight()
    }

    /// Most recent accumulator value of one type.
    pub fn tail(&self, piece: PieceType) -> u128 {
        last(&self.accumulator[piece.index()])
    }

    /// Accumulator cell `[piece][epoch]`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EpochOutOfRange`] if `epoch` is past the current epoch
    pub fn snapshot(&self, piece: PieceType, epoch: Epoch) -> Result<u128, LedgerError> {
        let col = self.column(epoch)?;
        Ok(self.accumulator[piece.index()][col])
    }

    /// Share weight of one type as it stood at `epoch` (live value for the current epoch).
    pub fn shares_at(&self, piece: PieceType, epoch: Epoch) -> Result<u64, LedgerError> {
        let col = self.column(epoch)?;
        Ok(self.share_history[piece.index()][col])
    }

    /// One full accumulator row.
    pub fn row(&self, piece: PieceType) -> &[u128] {
        &self.accumulator[piece.index()]
    }

    /// One full share-total row.
    pub fn share_row(&self, piece: PieceType) -> &[u64] {
        &self.share_history[piece.index()]
    }

    /// Add a staked token's weight to its type's running total.
    pub fn record_stake(&mut self, piece: PieceType, weight: u64) -> Result<(), LedgerError> {
        let cell = live_cell(&mut self.share_history[piece.index()]);
        *cell = cell
            .checked_add(weight)
            .ok_or(MathError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Remove an unstaked token's weight from its type's running total.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ShareUnderflow`] if the total would go negative
    pub fn record_unstake(&mut self, piece: PieceType, weight: u64) -> Result<(), LedgerError> {
        let cell = live_cell(&mut self.share_history[piece.index()]);
        *cell = cell.checked_sub(weight).ok_or(LedgerError::ShareUnderflow {
            piece,
            total: *cell,
            weight,
        })?;
        Ok(())
    }

    /// Open a new epoch: append a column to every row seeded with the previous one.
    pub fn advance_epoch(&mut self) -> Epoch {
        for row in &mut self.accumulator {
            let seed = last(row);
            row.push(seed);
        }
        for row in &mut self.share_history {
            let seed = last(row);
            row.push(seed);
        }
        self.epoch += 1;
        self.epoch
    }

    /// Compute how `amount` would be spread over the currently staked tokens.
    ///
    /// Each staked token of type `T` receives `amount * weight(T) / total_shares`,
    /// rounded down. Nothing is written; the result can be applied with
    /// [`apply_distribution`](Self::apply_distribution).
    pub fn plan_distribution(&self, amount: u128) -> Result<Distribution, MathError> {
        let total = self.total_shares();
        if total == 0 || amount == 0 {
            return Ok(Distribution {
                dust: amount,
                ..Distribution::default()
            });
        }

        let mut plan = Distribution::default();
        for piece in PieceType::ALL {
            let count = self.staked_count(piece) as u128;
            if count == 0 {
                continue;
            }
            let increment = fixed::mul_div(amount, piece.share_weight() as u128, total)?;
            // Reject a plan whose tail would overflow before anything is written.
            fixed::checked_add(self.tail(piece), increment)?;
            let paid = count
                .checked_mul(increment)
                .ok_or(MathError::ArithmeticOverflow)?;
            plan.increments[piece.index()] = increment;
            plan.distributed = fixed::checked_add(plan.distributed, paid)?;
        }
        plan.dust = fixed::checked_sub(amount, plan.distributed)?;
        Ok(plan)
    }

    /// Add a planned distribution to the live accumulator column.
    pub fn apply_distribution(&mut self, plan: &Distribution) -> Result<(), MathError> {
        for piece in PieceType::ALL {
            let inc = plan.increments[piece.index()];
            let cell = live_cell(&mut self.accumulator[piece.index()]);
            *cell = fixed::checked_add(*cell, inc)?;
        }
        Ok(())
    }

    /// Open a new epoch and distribute `amount` into its column.
    ///
    /// The distribution is planned against the pre-advance state and the
    /// ledger is left untouched if planning fails.
    pub fn advance_and_distribute(&mut self, amount: u128) -> Result<Distribution, MathError> {
        let plan = self.plan_distribution(amount)?;
        self.advance_epoch();
        self.apply_distribution(&plan)?;
        Ok(plan)
    }

    fn column(&self, epoch: Epoch) -> Result<usize, LedgerError> {
        if epoch > self.epoch {
            return Err(LedgerError::EpochOutOfRange {
                requested: epoch,
                current: self.epoch,
            });
        }
        Ok(epoch as usize)
    }
}

fn last<T: Copy + Default>(row: &[T]) -> T {
    row.last().copied().unwrap_or_default()
}

fn live_cell<T>(row: &mut [T]) -> &mut T {
    let idx = row.len() - 1;
    &mut row[idx]
}
