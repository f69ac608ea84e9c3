//! Shared test helpers for E2E and adversarial tests.

use std::sync::Arc;

use nrc_core::pool::MemoryRewardPool;
use nrc_core::types::{Address, Color, Hash256, Identifier, TokenId};
use nrc_ledger::{Ledger, LedgerConfig};

/// Address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address([seed; 20])
}

/// Identifier whose hash is derived from `seed`. Never the zero hash.
pub fn ident(seed: u64) -> Identifier {
    let mut hash = [0u8; 32];
    hash[..8].copy_from_slice(&seed.to_le_bytes());
    hash[31] = 0xEE;
    Identifier::new(Hash256(hash), format!("{seed}.eth")).unwrap()
}

/// Config with small round prices and all revenue routed to stakers.
pub fn test_config() -> LedgerConfig {
    LedgerConfig {
        mint_price: 10,
        kill_price: 100,
        reveal_price: 50,
        staker_share_bps: 10_000,
        king_base_price: 1_000,
        king_floor_price: 100,
        king_hand_prize: 70,
        ..LedgerConfig::default()
    }
}

/// Ledger over a fresh in-memory pool; the pool handle is returned for inspection.
pub fn test_ledger(config: LedgerConfig) -> (Ledger, Arc<MemoryRewardPool>) {
    let pool = Arc::new(MemoryRewardPool::new());
    let ledger = Ledger::new(config, pool.clone()).unwrap();
    (ledger, pool)
}

/// Mint batches of five to `owner` until `target` exists.
///
/// Every id minted along the way also goes to `owner`.
pub fn mint_through(ledger: &Ledger, owner: Address, target: TokenId) -> Vec<TokenId> {
    let price = ledger.with_state(|s| s.config().mint_price as u128);
    let mut minted = Vec::new();
    while ledger.owner_of(target).is_err() {
        minted.extend(ledger.mint(owner, 5, Color::White, price * 5).unwrap());
    }
    minted
}

/// Every token id the ledger has issued so far, kings included.
pub fn issued_ids(ledger: &Ledger) -> std::ops::Range<TokenId> {
    0..ledger.with_state(|s| s.next_token_id())
}

/// Funds the pool must hold: every unclaimed reward, the undistributed
/// inflow and the king-hand pot.
pub fn owed_by_pool(ledger: &Ledger) -> u128 {
    let unclaimed: u128 = issued_ids(ledger)
        .filter_map(|t| ledger.unclaimed_rewards(t).ok())
        .sum();
    ledger.with_state(|s| unclaimed + s.undistributed() + s.king_hand_pot())
}
