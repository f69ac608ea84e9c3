//! In-memory [`RewardPool`] for tests and simulation.
//!
//! Keeps the balance and a payout log behind a mutex. Not a custody
//! implementation: nothing is persisted.

use parking_lot::Mutex;

use crate::error::PoolError;
use crate::traits::RewardPool;
use crate::types::Address;

#[derive(Debug, Default)]
struct PoolInner {
    balance: u128,
    payouts: Vec<(Address, u128)>,
}

/// Reward pool held in process memory.
#[derive(Debug, Default)]
pub struct MemoryRewardPool {
    inner: Mutex<PoolInner>,
}

impl MemoryRewardPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool with an initial balance.
    pub fn with_balance(balance: u128) -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                balance,
                payouts: Vec::new(),
            }),
        }
    }

    /// All payouts made so far, in order.
    pub fn payouts(&self) -> Vec<(Address, u128)> {
        self.inner.lock().payouts.clone()
    }

    /// Sum of payouts made to `to`.
    pub fn paid_to(&self, to: &Address) -> u128 {
        self.inner
            .lock()
            .payouts
            .iter()
            .filter(|(addr, _)| addr == to)
            .map(|(_, amount)| amount)
            .sum()
    }
}

impl RewardPool for MemoryRewardPool {
    fn balance(&self) -> u128 {
        self.inner.lock().balance
    }

    fn credit(&self, amount: u128) -> Result<(), PoolError> {
        let mut inner = self.inner.lock();
        inner.balance = inner
            .balance
            .checked_add(amount)
            .ok_or(PoolError::Overflow)?;
        Ok(())
    }

    fn debit(&self, to: &Address, amount: u128) -> Result<(), PoolError> {
        let mut inner = self.inner.lock();
        if inner.balance < amount {
            return Err(PoolError::Insufficient {
                have: inner.balance,
                need: amount,
            });
        }
        inner.balance -= amount;
        inner.payouts.push((*to, amount));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(seed: u8) -> Address {
        Address([seed; 20])
    }

    #[test]
    fn credit_and_debit() {
        let pool = MemoryRewardPool::new();
        pool.credit(100).unwrap();
        pool.debit(&addr(1), 40).unwrap();
        assert_eq!(pool.balance(), 60);
        assert_eq!(pool.payouts(), vec![(addr(1), 40)]);
    }

    #[test]
    fn debit_insufficient_leaves_balance() {
        let pool = MemoryRewardPool::with_balance(10);
        let err = pool.debit(&addr(1), 11).unwrap_err();
        assert_eq!(err, PoolError::Insufficient { have: 10, need: 11 });
        assert_eq!(pool.balance(), 10);
        assert!(pool.payouts().is_empty());
    }

    #[test]
    fn credit_overflow() {
        let pool = MemoryRewardPool::with_balance(u128::MAX);
        assert_eq!(pool.credit(1), Err(PoolError::Overflow));
    }

    #[test]
    fn ensure_covers_default() {
        let pool = MemoryRewardPool::with_balance(5);
        assert!(pool.ensure_covers(5).is_ok());
        assert!(pool.ensure_covers(6).is_err());
    }

    #[test]
    fn paid_to_sums_per_address() {
        let pool = MemoryRewardPool::with_balance(100);
        pool.debit(&addr(1), 10).unwrap();
        pool.debit(&addr(2), 20).unwrap();
        pool.debit(&addr(1), 5).unwrap();
        assert_eq!(pool.paid_to(&addr(1)), 15);
        assert_eq!(pool.paid_to(&addr(3)), 0);
    }

    #[test]
    fn pool_is_object_safe() {
        let pool = MemoryRewardPool::with_balance(1);
        let dyn_pool: &dyn RewardPool = &pool;
        assert_eq!(dyn_pool.balance(), 1);
    }
}
