//! Token ownership and stake bookkeeping.
//!
//! [`TokenBook`] tracks which tokens exist and who holds them.
//! [`StakeRegistry`] tracks which of those tokens are staked, against which
//! identifier, and the per-token reward-debt state. The registry drives the
//! [`ShareLedger`] running totals on every stake and unstake.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use nrc_core::constants::KING_ID_END;
use nrc_core::error::{LedgerError, MathError};
use nrc_core::fixed;
use nrc_core::types::{Address, Color, Epoch, Hash256, Identifier, PieceType, TokenId};

use crate::rewards;
use crate::share_ledger::ShareLedger;

/// A live token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TokenRecord {
    pub owner: Address,
    pub color: Color,
    pub minted_epoch: Epoch,
}

/// Existing tokens, their owners, and the ids of destroyed tokens.
#[derive(Clone, Debug)]
pub struct TokenBook {
    tokens: HashMap<TokenId, TokenRecord>,
    /// Destroyed tokens and the reward they forfeited.
    burned: HashMap<TokenId, u128>,
    next_id: TokenId,
    max_supply: u64,
}

impl TokenBook {
    pub fn new(max_supply: u64) -> Self {
        Self {
            tokens: HashMap::new(),
            burned: HashMap::new(),
            next_id: KING_ID_END,
            max_supply,
        }
    }

    pub fn get(&self, token: TokenId) -> Option<&TokenRecord> {
        self.tokens.get(&token)
    }

    /// Owner of a live token.
    pub fn owner_of(&self, token: TokenId) -> Result<Address, LedgerError> {
        self.tokens
            .get(&token)
            .map(|r| r.owner)
            .ok_or(LedgerError::TokenNotFound(token))
    }

    /// Fails unless `owner` holds the live token `token`.
    pub fn ensure_owner(&self, token: TokenId, owner: &Address) -> Result<&TokenRecord, LedgerError> {
        let record = self
            .tokens
            .get(&token)
            .ok_or(LedgerError::TokenNotFound(token))?;
        if record.owner != *owner {
            return Err(LedgerError::NotOwner { token });
        }
        Ok(record)
    }

    /// Reward forfeited when the token was destroyed, if it was.
    pub fn burned(&self, token: TokenId) -> Option<u128> {
        self.burned.get(&token).copied()
    }

    /// Number of live tokens.
    pub fn live_count(&self) -> usize {
        self.tokens.len()
    }

    /// Next id `mint` would assign.
    pub fn next_id(&self) -> TokenId {
        self.next_id
    }

    /// Ids a mint of `quantity` would receive.
    pub fn plan_mint(&self, quantity: u64) -> Result<std::ops::Range<TokenId>, LedgerError> {
        let end = self
            .next_id
            .checked_add(quantity)
            .ok_or(MathError::ArithmeticOverflow)?;
        if end > self.max_supply {
            return Err(LedgerError::SupplyExhausted {
                max: self.max_supply,
            });
        }
        Ok(self.next_id..end)
    }

    /// Create a planned batch of tokens.
    pub fn commit_mint(
        &mut self,
        ids: std::ops::Range<TokenId>,
        owner: Address,
        color: Color,
        epoch: Epoch,
    ) -> Vec<TokenId> {
        let minted: Vec<TokenId> = ids.collect();
        for &id in &minted {
            self.tokens.insert(
                id,
                TokenRecord {
                    owner,
                    color,
                    minted_epoch: epoch,
                },
            );
        }
        if let Some(&last) = minted.last() {
            self.next_id = last + 1;
        }
        minted
    }

    /// Fails if the king of `color` has ever been issued.
    pub fn ensure_king_available(&self, color: Color) -> Result<TokenId, LedgerError> {
        let id = color.king_id();
        if self.tokens.contains_key(&id) || self.burned.contains_key(&id) {
            return Err(LedgerError::KingAlreadySold(id));
        }
        Ok(id)
    }

    pub fn insert_king(&mut self, color: Color, owner: Address, epoch: Epoch) -> TokenId {
        let id = color.king_id();
        self.tokens.insert(
            id,
            TokenRecord {
                owner,
                color,
                minted_epoch: epoch,
            },
        );
        id
    }

    pub fn set_owner(&mut self, token: TokenId, owner: Address) {
        if let Some(record) = self.tokens.get_mut(&token) {
            record.owner = owner;
        }
    }

    /// Destroy a token, remembering what it forfeited.
    pub fn remove(&mut self, token: TokenId, forfeited: u128) -> Option<TokenRecord> {
        let record = self.tokens.remove(&token)?;
        self.burned.insert(token, forfeited);
        Some(record)
    }
}

/// An active stake.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StakeRecord {
    pub token: TokenId,
    pub owner: Address,
    pub identifier: Identifier,
    pub epoch_at_stake: Epoch,
}

impl StakeRecord {
    pub fn piece(&self) -> PieceType {
        PieceType::from_token_id(self.token)
    }
}

/// Everything destroying a token would change, computed without writing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Eviction {
    pub token: TokenId,
    pub piece: PieceType,
    /// Share weight to remove from the running total, if the token is staked.
    pub staked_weight: Option<u64>,
    /// Pending plus accrued reward the token loses.
    pub forfeited: u128,
}

/// Active stakes and per-token reward state.
#[derive(Clone, Debug, Default)]
pub struct StakeRegistry {
    stakes: HashMap<TokenId, StakeRecord>,
    identifiers: HashMap<Hash256, TokenId>,
    nft_shares: HashMap<TokenId, u64>,
    reward_debt: HashMap<TokenId, u128>,
    pending: HashMap<TokenId, u128>,
}

impl StakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token: TokenId) -> Option<&StakeRecord> {
        self.stakes.get(&token)
    }

    pub fn is_staked(&self, token: TokenId) -> bool {
        self.stakes.contains_key(&token)
    }

    /// Number of active stakes.
    pub fn len(&self) -> usize {
        self.stakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stakes.is_empty()
    }

    /// Share weight last recorded for `token` (0 if none).
    pub fn nft_shares(&self, token: TokenId) -> u64 {
        self.nft_shares.get(&token).copied().unwrap_or(0)
    }

    pub fn reward_debt(&self, token: TokenId) -> u128 {
        self.reward_debt.get(&token).copied().unwrap_or(0)
    }

    pub fn pending(&self, token: TokenId) -> u128 {
        self.pending.get(&token).copied().unwrap_or(0)
    }

    /// Token backed by an identifier, if its stake is active.
    pub fn token_for_identifier(&self, hash: &Hash256) -> Option<TokenId> {
        self.identifiers.get(hash).copied()
    }

    /// Stake `token` for `owner` against `identifier`.
    ///
    /// Records the token's piece weight in the share ledger and snapshots the
    /// current accumulator tail as its reward debt.
    pub fn stake(
        &mut self,
        book: &TokenBook,
        shares: &mut ShareLedger,
        token: TokenId,
        identifier: Identifier,
        owner: Address,
    ) -> Result<StakeRecord, LedgerError> {
        book.ensure_owner(token, &owner)?;
        if self.stakes.contains_key(&token) {
            return Err(LedgerError::AlreadyStaked(token));
        }
        if let Some(existing) = self.identifiers.get(&identifier.hash) {
            return Err(LedgerError::IdentifierInUse(*existing));
        }

        let piece = PieceType::from_token_id(token);
        let weight = piece.share_weight();
        // Settle anything accrued under an earlier stake before the debt is reset.
        let carried = rewards::unclaimed(self, shares, token)?;
        shares.record_stake(piece, weight)?;

        let record = StakeRecord {
            token,
            owner,
            identifier,
            epoch_at_stake: shares.epoch(),
        };
        self.identifiers.insert(record.identifier.hash, token);
        self.stakes.insert(token, record.clone());
        self.nft_shares.insert(token, weight);
        self.reward_debt.insert(token, shares.tail(piece));
        set_or_clear(&mut self.pending, token, carried);

        debug!(token, %piece, weight, epoch = shares.epoch(), "stake recorded");
        Ok(record)
    }

    /// End the stake on `token`, moving its accrued reward into pending.
    ///
    /// Returns the amount settled. The token's NftShares stay in place until
    /// the next claim.
    pub fn unstake(
        &mut self,
        shares: &mut ShareLedger,
        token: TokenId,
        owner: &Address,
    ) -> Result<u128, LedgerError> {
        let record = self
            .stakes
            .get(&token)
            .ok_or(LedgerError::NotStaked(token))?;
        if record.owner != *owner {
            return Err(LedgerError::NotOwner { token });
        }

        let piece = record.piece();
        let tail = shares.tail(piece);
        let accrued = rewards::accrued(token, tail, self.reward_debt(token))?;
        let pending = fixed::checked_add(self.pending(token), accrued)?;
        shares.record_unstake(piece, piece.share_weight())?;

        if let Some(record) = self.stakes.remove(&token) {
            self.identifiers.remove(&record.identifier.hash);
        }
        self.reward_debt.insert(token, tail);
        set_or_clear(&mut self.pending, token, pending);

        debug!(token, %piece, accrued, "stake released");
        Ok(accrued)
    }

    /// Mark `token` as paid up to the current accumulator tail.
    pub fn settle_claim(&mut self, shares: &ShareLedger, token: TokenId) {
        let piece = PieceType::from_token_id(token);
        self.reward_debt.insert(token, shares.tail(piece));
        self.pending.remove(&token);
        if !self.stakes.contains_key(&token) {
            self.nft_shares.remove(&token);
        }
    }

    /// Work out what destroying `token` would remove.
    pub fn preview_eviction(&self, shares: &ShareLedger, token: TokenId) -> Result<Eviction, LedgerError> {
        let piece = PieceType::from_token_id(token);
        Ok(Eviction {
            token,
            piece,
            staked_weight: self.stakes.get(&token).map(|r| r.piece().share_weight()),
            forfeited: rewards::unclaimed(self, shares, token)?,
        })
    }

    /// Check that a batch of evictions fits the live share totals.
    pub fn check_evictions(shares: &ShareLedger, evictions: &[Eviction]) -> Result<u128, LedgerError> {
        let mut removed: HashMap<PieceType, u64> = HashMap::new();
        let mut forfeited = 0u128;
        let mut seen = HashSet::new();
        for ev in evictions {
            if !seen.insert(ev.token) {
                return Err(LedgerError::DuplicateToken(ev.token));
            }
            if let Some(weight) = ev.staked_weight {
                let sum = removed.entry(ev.piece).or_default();
                *sum = sum.checked_add(weight).ok_or(MathError::ArithmeticOverflow)?;
            }
            forfeited = fixed::checked_add(forfeited, ev.forfeited)?;
        }
        for (piece, weight) in removed {
            let total = shares.type_shares(piece);
            if weight > total {
                return Err(LedgerError::ShareUnderflow {
                    piece,
                    total,
                    weight,
                });
            }
        }
        Ok(forfeited)
    }

    /// Apply a previewed eviction: force-unstake and drop all reward state.
    pub fn commit_eviction(&mut self, shares: &mut ShareLedger, eviction: &Eviction) -> Result<(), LedgerError> {
        if let Some(weight) = eviction.staked_weight {
            shares.record_unstake(eviction.piece, weight)?;
        }
        if let Some(record) = self.stakes.remove(&eviction.token) {
            self.identifiers.remove(&record.identifier.hash);
        }
        self.nft_shares.remove(&eviction.token);
        self.reward_debt.remove(&eviction.token);
        self.pending.remove(&eviction.token);
        Ok(())
    }
}

fn set_or_clear(map: &mut HashMap<TokenId, u128>, token: TokenId, value: u128) {
    if value == 0 {
        map.remove(&token);
    } else {
        map.insert(token, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: Address = Address([1; 20]);
    const BOB: Address = Address([2; 20]);

    fn ident(tag: u8) -> Identifier {
        Identifier::new(Hash256([tag; 32]), format!("{tag}.eth")).unwrap()
    }

    fn book_with(owner: Address, count: u64) -> TokenBook {
        let mut book = TokenBook::new(10_000);
        let ids = book.plan_mint(count).unwrap();
        book.commit_mint(ids, owner, Color::White, 0);
        book
    }

    // --- TokenBook ---

    #[test]
    fn mint_assigns_sequential_ids_after_kings() {
        let mut book = TokenBook::new(100);
        let ids = book.plan_mint(3).unwrap();
        assert_eq!(ids, 2..5);
        let minted = book.commit_mint(ids, ALICE, Color::Black, 0);
        assert_eq!(minted, vec![2, 3, 4]);
        assert_eq!(book.next_id(), 5);
        assert_eq!(book.owner_of(3).unwrap(), ALICE);
    }

    #[test]
    fn mint_respects_max_supply() {
        let book = TokenBook::new(6);
        assert!(book.plan_mint(4).is_ok());
        assert_eq!(
            book.plan_mint(5),
            Err(LedgerError::SupplyExhausted { max: 6 })
        );
    }

    #[test]
    fn ensure_owner_errors() {
        let book = book_with(ALICE, 2);
        assert!(book.ensure_owner(2, &ALICE).is_ok());
        assert_eq!(
            book.ensure_owner(2, &BOB),
            Err(LedgerError::NotOwner { token: 2 })
        );
        assert_eq!(
            book.ensure_owner(99, &ALICE),
            Err(LedgerError::TokenNotFound(99))
        );
    }

    #[test]
    fn king_sold_once_even_after_burn() {
        let mut book = TokenBook::new(100);
        assert_eq!(book.ensure_king_available(Color::Black), Ok(1));
        book.insert_king(Color::Black, ALICE, 0);
        assert_eq!(
            book.ensure_king_available(Color::Black),
            Err(LedgerError::KingAlreadySold(1))
        );
        book.remove(1, 0);
        assert_eq!(
            book.ensure_king_available(Color::Black),
            Err(LedgerError::KingAlreadySold(1))
        );
    }

    #[test]
    fn remove_remembers_forfeit() {
        let mut book = book_with(ALICE, 1);
        assert!(book.remove(2, 77).is_some());
        assert_eq!(book.burned(2), Some(77));
        assert_eq!(book.owner_of(2), Err(LedgerError::TokenNotFound(2)));
        assert!(book.remove(2, 0).is_none());
    }

    // --- StakeRegistry ---

    #[test]
    fn stake_records_weight_and_debt() {
        let book = book_with(ALICE, 20);
        let mut shares = ShareLedger::new();
        let mut reg = StakeRegistry::new();

        // Token 12 is the first rook.
        let rec = reg.stake(&book, &mut shares, 12, ident(1), ALICE).unwrap();
        assert_eq!(rec.epoch_at_stake, 0);
        assert_eq!(reg.nft_shares(12), 5);
        assert_eq!(reg.reward_debt(12), 0);
        assert_eq!(shares.type_shares(PieceType::Rook), 5);
        assert_eq!(reg.token_for_identifier(&Hash256([1; 32])), Some(12));
    }

    #[test]
    fn stake_rejections() {
        let book = book_with(ALICE, 20);
        let mut shares = ShareLedger::new();
        let mut reg = StakeRegistry::new();

        assert_eq!(
            reg.stake(&book, &mut shares, 12, ident(1), BOB),
            Err(LedgerError::NotOwner { token: 12 })
        );
        assert_eq!(
            reg.stake(&book, &mut shares, 500, ident(1), ALICE),
            Err(LedgerError::TokenNotFound(500))
        );
        reg.stake(&book, &mut shares, 12, ident(1), ALICE).unwrap();
        assert_eq!(
            reg.stake(&book, &mut shares, 12, ident(2), ALICE),
            Err(LedgerError::AlreadyStaked(12))
        );
        assert_eq!(
            reg.stake(&book, &mut shares, 13, ident(1), ALICE),
            Err(LedgerError::IdentifierInUse(12))
        );
        assert_eq!(shares.type_shares(PieceType::Rook), 5);
    }

    #[test]
    fn unstake_settles_and_keeps_nft_shares() {
        let book = book_with(ALICE, 20);
        let mut shares = ShareLedger::new();
        let mut reg = StakeRegistry::new();
        reg.stake(&book, &mut shares, 12, ident(1), ALICE).unwrap();
        shares.advance_and_distribute(100).unwrap();

        assert_eq!(reg.unstake(&mut shares, 12, &BOB), Err(LedgerError::NotOwner { token: 12 }));
        let settled = reg.unstake(&mut shares, 12, &ALICE).unwrap();
        assert_eq!(settled, 100);
        assert_eq!(reg.pending(12), 100);
        assert_eq!(reg.nft_shares(12), 5);
        assert!(!reg.is_staked(12));
        assert_eq!(shares.type_shares(PieceType::Rook), 0);
        assert_eq!(reg.token_for_identifier(&Hash256([1; 32])), None);

        assert_eq!(
            reg.unstake(&mut shares, 12, &ALICE),
            Err(LedgerError::NotStaked(12))
        );
    }

    #[test]
    fn restake_carries_pending() {
        let book = book_with(ALICE, 20);
        let mut shares = ShareLedger::new();
        let mut reg = StakeRegistry::new();
        reg.stake(&book, &mut shares, 12, ident(1), ALICE).unwrap();
        shares.advance_and_distribute(50).unwrap();
        reg.unstake(&mut shares, 12, &ALICE).unwrap();
        reg.stake(&book, &mut shares, 12, ident(1), ALICE).unwrap();
        shares.advance_and_distribute(30).unwrap();
        assert_eq!(rewards::unclaimed(&reg, &shares, 12).unwrap(), 80);
    }

    #[test]
    fn settle_claim_resets_unstaked_shares() {
        let book = book_with(ALICE, 20);
        let mut shares = ShareLedger::new();
        let mut reg = StakeRegistry::new();
        reg.stake(&book, &mut shares, 12, ident(1), ALICE).unwrap();
        reg.unstake(&mut shares, 12, &ALICE).unwrap();
        reg.settle_claim(&shares, 12);
        assert_eq!(reg.nft_shares(12), 0);
    }

    #[test]
    fn eviction_preview_and_commit() {
        let book = book_with(ALICE, 20);
        let mut shares = ShareLedger::new();
        let mut reg = StakeRegistry::new();
        reg.stake(&book, &mut shares, 12, ident(1), ALICE).unwrap();
        shares.advance_and_distribute(40).unwrap();

        let ev = reg.preview_eviction(&shares, 12).unwrap();
        assert_eq!(ev.staked_weight, Some(5));
        assert_eq!(ev.forfeited, 40);
        let unstaked = reg.preview_eviction(&shares, 13).unwrap();
        assert_eq!(unstaked.staked_weight, None);

        let total = StakeRegistry::check_evictions(&shares, &[ev.clone(), unstaked]).unwrap();
        assert_eq!(total, 40);

        reg.commit_eviction(&mut shares, &ev).unwrap();
        assert!(!reg.is_staked(12));
        assert_eq!(reg.nft_shares(12), 0);
        assert_eq!(reg.pending(12), 0);
        assert_eq!(shares.type_shares(PieceType::Rook), 0);
    }

    #[test]
    fn check_evictions_rejects_duplicates() {
        let shares = ShareLedger::new();
        let reg = StakeRegistry::new();
        let ev = reg.preview_eviction(&shares, 20).unwrap();
        assert_eq!(
            StakeRegistry::check_evictions(&shares, &[ev.clone(), ev]),
            Err(LedgerError::DuplicateToken(20))
        );
    }
}
