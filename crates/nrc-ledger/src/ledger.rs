//! Thread-safe entry point.
//!
//! [`Ledger`] puts a [`LedgerState`] behind a `parking_lot::RwLock`. Every
//! mutating call holds the write lock for the whole operation, so calls are
//! linearizable; queries share the read lock.

use std::sync::Arc;

use parking_lot::RwLock;

use nrc_core::error::{LedgerError, NrcError};
use nrc_core::events::LedgerEvent;
use nrc_core::traits::RewardPool;
use nrc_core::types::{Address, Color, Epoch, Identifier, PieceType, RequestId, TokenId};

use crate::config::LedgerConfig;
use crate::state::{LedgerState, LedgerSummary};

/// Shared handle to the ledger.
pub struct Ledger {
    state: RwLock<LedgerState>,
}

impl Ledger {
    pub fn new(config: LedgerConfig, pool: Arc<dyn RewardPool>) -> Result<Self, NrcError> {
        Ok(Self::from_state(LedgerState::new(config, pool)?))
    }

    pub fn from_state(state: LedgerState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Run several reads against one consistent view.
    pub fn with_state<R>(&self, f: impl FnOnce(&LedgerState) -> R) -> R {
        f(&self.state.read())
    }

    // --- mutations ---

    pub fn mint(&self, owner: Address, quantity: u64, color: Color, payment: u128) -> Result<Vec<TokenId>, LedgerError> {
        self.state.write().mint(owner, quantity, color, payment)
    }

    pub fn buy_king(&self, buyer: Address, color: Color, payment: u128, now: u64) -> Result<TokenId, LedgerError> {
        self.state.write().buy_king(buyer, color, payment, now)
    }

    pub fn transfer(&self, from: Address, to: Address, token: TokenId) -> Result<(), LedgerError> {
        self.state.write().transfer(from, to, token)
    }

    pub fn stake(&self, owner: Address, identifier: Identifier, token: TokenId) -> Result<(), LedgerError> {
        self.state.write().stake(owner, identifier, token)
    }

    pub fn unstake(&self, owner: Address, token: TokenId) -> Result<u128, LedgerError> {
        self.state.write().unstake(owner, token)
    }

    /// Claim the unclaimed reward of `token`.
    pub fn get_reward(&self, owner: Address, token: TokenId) -> Result<u128, LedgerError> {
        self.state.write().claim(owner, token)
    }

    pub fn advance_epoch(&self) -> Result<Epoch, LedgerError> {
        self.state.write().advance_epoch()
    }

    pub fn multi_kill(&self, killer: Address, tokens: &[TokenId], payment: u128) -> Result<u128, LedgerError> {
        self.state.write().multi_kill(killer, tokens, payment)
    }

    pub fn burn(&self, owner: Address, token: TokenId) -> Result<u128, LedgerError> {
        self.state.write().burn(owner, token)
    }

    /// Request a king-hand reveal; resolved later by [`fulfill_reveal`](Self::fulfill_reveal).
    pub fn reveal_king_hand(&self, owner: Address, token: TokenId, payment: u128) -> Result<RequestId, LedgerError> {
        self.state.write().request_reveal(owner, token, payment)
    }

    pub fn fulfill_reveal(&self, request: RequestId, random: u64) -> Result<bool, LedgerError> {
        self.state.write().fulfill_reveal(request, random)
    }

    pub fn claim_king_hand(&self, owner: Address, token: TokenId) -> Result<u128, LedgerError> {
        self.state.write().claim_king_hand(owner, token)
    }

    pub fn drain_events(&self) -> Vec<LedgerEvent> {
        self.state.write().drain_events()
    }

    // --- queries ---

    pub fn epoch(&self) -> Epoch {
        self.state.read().epoch()
    }

    pub fn share_type_accumulator_size(&self) -> (usize, usize) {
        self.state.read().share_type_accumulator_size()
    }

    pub fn share_type_accumulator(&self, piece: PieceType, epoch: Epoch) -> Result<u128, LedgerError> {
        self.state.read().share_type_accumulator(piece, epoch)
    }

    /// Staked share weight of `piece` at `epoch`.
    pub fn total_share_per_token(&self, piece: PieceType, epoch: Epoch) -> Result<u64, LedgerError> {
        self.state.read().total_share_per_token(piece, epoch)
    }

    pub fn nft_shares(&self, token: TokenId) -> u64 {
        self.state.read().nft_shares(token)
    }

    pub fn unclaimed_rewards(&self, token: TokenId) -> Result<u128, LedgerError> {
        self.state.read().unclaimed_rewards(token)
    }

    pub fn current_price(&self, now: u64) -> Result<u128, LedgerError> {
        self.state.read().current_price(now)
    }

    pub fn owner_of(&self, token: TokenId) -> Result<Address, LedgerError> {
        self.state.read().owner_of(token)
    }

    pub fn piece_type(&self, token: TokenId) -> PieceType {
        PieceType::from_token_id(token)
    }

    pub fn summary(&self) -> LedgerSummary {
        self.state.read().summary()
    }
}
