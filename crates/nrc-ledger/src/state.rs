//! The ledger state machine.
//!
//! [`LedgerState`] owns every table (tokens, stakes, the share accumulator,
//! reveals) plus the revenue counters, and implements each operation as
//! validate, compute, then write. A rejected call returns before the first
//! write, so state is never half-applied. Calls into the external
//! [`RewardPool`] are the last fallible step of an operation.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use nrc_auction::AuctionSchedule;
use nrc_core::constants::PIECE_TYPE_COUNT;
use nrc_core::error::{LedgerError, MathError, NrcError};
use nrc_core::events::LedgerEvent;
use nrc_core::fixed;
use nrc_core::traits::RewardPool;
use nrc_core::types::{Address, Color, Epoch, Identifier, PieceType, RequestId, TokenId};

use crate::config::LedgerConfig;
use crate::king_hand::{RevealBook, RevealStatus};
use crate::registry::{Eviction, StakeRecord, StakeRegistry, TokenBook};
use crate::rewards::{self, ClaimPlan};
use crate::share_ledger::ShareLedger;

/// Revenue split of one payment, computed before anything is credited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PaymentPlan {
    /// Amount credited to the reward pool.
    staker: u128,
    undistributed: u128,
    protocol_revenue: u128,
}

/// Point-in-time summary for reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub epoch: Epoch,
    pub live_tokens: usize,
    pub active_stakes: usize,
    pub pending_reveals: usize,
    pub type_shares: [u64; PIECE_TYPE_COUNT],
    pub accumulator_tails: [u128; PIECE_TYPE_COUNT],
    pub undistributed: u128,
    pub protocol_revenue: u128,
    pub king_hand_pot: u128,
    pub pool_balance: u128,
}

/// All ledger state behind the [`Ledger`](crate::Ledger) lock.
pub struct LedgerState {
    config: LedgerConfig,
    schedule: AuctionSchedule,
    pool: Arc<dyn RewardPool>,
    tokens: TokenBook,
    shares: ShareLedger,
    stakes: StakeRegistry,
    reveals: RevealBook,
    /// Staker revenue (and forfeits) waiting for the next epoch advance.
    undistributed: u128,
    protocol_revenue: u128,
    king_hand_pot: u128,
    events: Vec<LedgerEvent>,
}

impl LedgerState {
    /// Build an empty ledger from a validated config.
    pub fn new(config: LedgerConfig, pool: Arc<dyn RewardPool>) -> Result<Self, NrcError> {
        config.validate()?;
        let schedule = config.auction_schedule()?;
        Ok(Self::with_schedule(config, pool, schedule))
    }

    /// Build an empty ledger with an externally constructed auction schedule.
    pub fn with_schedule(config: LedgerConfig, pool: Arc<dyn RewardPool>, schedule: AuctionSchedule) -> Self {
        info!(
            max_supply = config.max_supply,
            staker_share_bps = config.staker_share_bps,
            auction_start = schedule.start(),
            "ledger initialized"
        );
        Self {
            tokens: TokenBook::new(config.max_supply),
            shares: ShareLedger::new(),
            stakes: StakeRegistry::new(),
            reveals: RevealBook::new(),
            undistributed: 0,
            protocol_revenue: 0,
            king_hand_pot: 0,
            events: Vec::new(),
            config,
            schedule,
            pool,
        }
    }

    // ------------------------------------------------------------------
    // Supply
    // ------------------------------------------------------------------

    /// Mint `quantity` tokens of `color` to `owner`. Returns the new ids.
    pub fn mint(
        &mut self,
        owner: Address,
        quantity: u64,
        color: Color,
        payment: u128,
    ) -> Result<Vec<TokenId>, LedgerError> {
        if quantity == 0 || quantity > self.config.max_mint_per_call {
            return Err(LedgerError::InvalidQuantity(quantity));
        }
        let need = (self.config.mint_price as u128)
            .checked_mul(quantity as u128)
            .ok_or(MathError::ArithmeticOverflow)?;
        ensure_payment(payment, need)?;
        let ids = self.tokens.plan_mint(quantity)?;
        let plan = self.plan_payment(payment, 0)?;

        self.settle_payment(plan)?;
        let epoch = self.shares.epoch();
        let minted = self.tokens.commit_mint(ids, owner, color, epoch);

        info!(%owner, %color, tokens = ?minted, "minted");
        self.events.push(LedgerEvent::Minted {
            owner,
            color,
            tokens: minted.clone(),
        });
        Ok(minted)
    }

    /// Buy the king of `color` at the auction price for `now`.
    pub fn buy_king(
        &mut self,
        buyer: Address,
        color: Color,
        payment: u128,
        now: u64,
    ) -> Result<TokenId, LedgerError> {
        if !self.schedule.is_open(now) {
            return Err(LedgerError::AuctionNotStarted {
                start: self.schedule.start(),
                now,
            });
        }
        self.tokens.ensure_king_available(color)?;
        let price = self.schedule.price_at(now)?;
        ensure_payment(payment, price)?;
        let plan = self.plan_payment(payment, 0)?;

        self.settle_payment(plan)?;
        let epoch = self.shares.epoch();
        let token = self.tokens.insert_king(color, buyer, epoch);

        info!(%buyer, %color, token, price, "king sold");
        self.events.push(LedgerEvent::KingBought {
            token,
            color,
            buyer,
            price,
        });
        Ok(token)
    }

    /// Move an unstaked token to a new owner.
    pub fn transfer(&mut self, from: Address, to: Address, token: TokenId) -> Result<(), LedgerError> {
        self.tokens.ensure_owner(token, &from)?;
        if self.stakes.is_staked(token) {
            return Err(LedgerError::TokenStaked(token));
        }
        self.tokens.set_owner(token, to);
        debug!(token, %from, %to, "transferred");
        self.events.push(LedgerEvent::Transferred { token, from, to });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Staking and rewards
    // ------------------------------------------------------------------

    /// Stake `token` against `identifier`.
    pub fn stake(&mut self, owner: Address, identifier: Identifier, token: TokenId) -> Result<(), LedgerError> {
        let record = self
            .stakes
            .stake(&self.tokens, &mut self.shares, token, identifier, owner)?;
        let weight = record.piece().share_weight();

        info!(token, %owner, identifier = %record.identifier.display_name(), epoch = record.epoch_at_stake, "staked");
        self.events.push(LedgerEvent::Staked {
            token,
            owner,
            identifier: record.identifier.display_name(),
            epoch: record.epoch_at_stake,
            weight,
        });
        Ok(())
    }

    /// Unstake `token`. Returns the reward settled into pending.
    pub fn unstake(&mut self, owner: Address, token: TokenId) -> Result<u128, LedgerError> {
        let settled = self.stakes.unstake(&mut self.shares, token, &owner)?;
        let epoch = self.shares.epoch();

        info!(token, %owner, settled, epoch, "unstaked");
        self.events.push(LedgerEvent::Unstaked {
            token,
            owner,
            epoch,
            settled,
        });
        Ok(settled)
    }

    /// Pay out the unclaimed reward of `token` to its owner.
    pub fn claim(&mut self, owner: Address, token: TokenId) -> Result<u128, LedgerError> {
        if let Some(forfeited) = self.tokens.burned(token).filter(|&f| f > 0) {
            return Err(LedgerError::TokenBurnedWithUnclaimedRewards { token, forfeited });
        }
        self.tokens.ensure_owner(token, &owner)?;
        let plan = ClaimPlan::new(&self.stakes, &self.shares, token)?;
        if !plan.changes_state() {
            return Ok(0);
        }

        if plan.amount > 0 {
            self.pool.ensure_covers(plan.amount)?;
            self.pool.debit(&owner, plan.amount)?;
        }
        plan.commit(&mut self.stakes, &self.shares);

        info!(token, %owner, amount = plan.amount, "reward claimed");
        self.events.push(LedgerEvent::RewardClaimed {
            token,
            owner,
            amount: plan.amount,
        });
        Ok(plan.amount)
    }

    /// Close the current epoch and distribute the collected inflow into the new one.
    pub fn advance_epoch(&mut self) -> Result<Epoch, LedgerError> {
        let plan = self.shares.advance_and_distribute(self.undistributed)?;
        self.undistributed = plan.dust;
        let epoch = self.shares.epoch();

        info!(epoch, distributed = plan.distributed, carried = plan.dust, "epoch advanced");
        self.events.push(LedgerEvent::EpochAdvanced {
            epoch,
            distributed: plan.distributed,
            carried: plan.dust,
        });
        Ok(epoch)
    }

    // ------------------------------------------------------------------
    // Kill and burn
    // ------------------------------------------------------------------

    /// Destroy a batch of other players' tokens, paying `kill_price` each.
    ///
    /// Every token is checked before any is removed. Returns the total
    /// reward forfeited by the victims.
    pub fn multi_kill(&mut self, killer: Address, tokens: &[TokenId], payment: u128) -> Result<u128, LedgerError> {
        if tokens.is_empty() {
            return Err(LedgerError::EmptyKillList);
        }
        let mut seen = HashSet::with_capacity(tokens.len());
        let mut victims = Vec::with_capacity(tokens.len());
        for &token in tokens {
            if !seen.insert(token) {
                return Err(LedgerError::DuplicateToken(token));
            }
            let owner = self.tokens.owner_of(token)?;
            if PieceType::from_token_id(token) == PieceType::King {
                return Err(LedgerError::KingImmune(token));
            }
            if owner == killer {
                return Err(LedgerError::SelfKill(token));
            }
            victims.push((owner, self.stakes.preview_eviction(&self.shares, token)?));
        }
        let need = (self.config.kill_price as u128)
            .checked_mul(tokens.len() as u128)
            .ok_or(MathError::ArithmeticOverflow)?;
        ensure_payment(payment, need)?;

        let evictions: Vec<Eviction> = victims.iter().map(|(_, ev)| ev.clone()).collect();
        let forfeited = StakeRegistry::check_evictions(&self.shares, &evictions)?;
        let plan = self.plan_payment(payment, forfeited)?;

        self.settle_payment(plan)?;
        for (owner, eviction) in &victims {
            self.destroy(eviction)?;
            info!(token = eviction.token, %owner, %killer, "killed");
            self.events.push(LedgerEvent::Killed {
                token: eviction.token,
                owner: *owner,
                killer,
            });
            self.record_forfeit(eviction);
        }
        Ok(forfeited)
    }

    /// Destroy one's own token. Returns the reward it forfeited.
    pub fn burn(&mut self, owner: Address, token: TokenId) -> Result<u128, LedgerError> {
        self.tokens.ensure_owner(token, &owner)?;
        let eviction = self.stakes.preview_eviction(&self.shares, token)?;
        let forfeited = StakeRegistry::check_evictions(&self.shares, std::slice::from_ref(&eviction))?;
        let plan = self.plan_payment(0, forfeited)?;

        self.settle_payment(plan)?;
        self.destroy(&eviction)?;
        info!(token, %owner, "burned");
        self.events.push(LedgerEvent::Burned { token, owner });
        self.record_forfeit(&eviction);
        Ok(forfeited)
    }

    fn destroy(&mut self, eviction: &Eviction) -> Result<(), LedgerError> {
        self.stakes.commit_eviction(&mut self.shares, eviction)?;
        self.tokens.remove(eviction.token, eviction.forfeited);
        self.reveals.forget(eviction.token);
        Ok(())
    }

    fn record_forfeit(&mut self, eviction: &Eviction) {
        if eviction.forfeited == 0 {
            return;
        }
        warn!(
            token = eviction.token,
            forfeited = eviction.forfeited,
            "token destroyed with unclaimed rewards, re-queued for distribution"
        );
        self.events.push(LedgerEvent::TokenBurnedWithUnclaimedRewards {
            token: eviction.token,
            forfeited: eviction.forfeited,
        });
    }

    // ------------------------------------------------------------------
    // King hand
    // ------------------------------------------------------------------

    /// Pay for a king-hand reveal of `token`.
    pub fn request_reveal(&mut self, owner: Address, token: TokenId, payment: u128) -> Result<RequestId, LedgerError> {
        self.tokens.ensure_owner(token, &owner)?;
        self.reveals.check_request(token)?;
        ensure_payment(payment, self.config.reveal_price as u128)?;
        let pot = fixed::checked_add(self.king_hand_pot, payment)?;

        if payment > 0 {
            self.pool.credit(payment)?;
        }
        let request = self.reveals.request(token);
        self.king_hand_pot = pot;

        info!(token, %owner, %request, "reveal requested");
        self.events.push(LedgerEvent::RevealRequested {
            token,
            owner,
            request,
        });
        Ok(request)
    }

    /// Resolve a reveal request with a random value. Returns whether it won.
    pub fn fulfill_reveal(&mut self, request: RequestId, random: u64) -> Result<bool, LedgerError> {
        let (token, success) = self
            .reveals
            .fulfill(&request, random, self.config.king_hand_odds)?;

        info!(token, %request, success, "reveal fulfilled");
        self.events.push(LedgerEvent::RevealFulfilled {
            token,
            request,
            success,
        });
        Ok(success)
    }

    /// Pay the king-hand prize (bounded by the pot) to a revealed winner.
    pub fn claim_king_hand(&mut self, owner: Address, token: TokenId) -> Result<u128, LedgerError> {
        self.tokens.ensure_owner(token, &owner)?;
        self.reveals.check_claim(token)?;
        let amount = self.king_hand_pot.min(self.config.king_hand_prize as u128);

        if amount > 0 {
            self.pool.debit(&owner, amount)?;
        }
        self.king_hand_pot -= amount;
        self.reveals.mark_claimed(token);

        info!(token, %owner, amount, "king hand claimed");
        self.events.push(LedgerEvent::KingHandClaimed {
            token,
            owner,
            amount,
        });
        Ok(amount)
    }

    // ------------------------------------------------------------------
    // Revenue
    // ------------------------------------------------------------------

    fn plan_payment(&self, payment: u128, requeued: u128) -> Result<PaymentPlan, LedgerError> {
        let staker = fixed::bps_of(payment, self.config.staker_share_bps)?;
        let protocol = fixed::checked_sub(payment, staker)?;
        let undistributed = fixed::checked_add(self.undistributed, staker)?;
        Ok(PaymentPlan {
            staker,
            undistributed: fixed::checked_add(undistributed, requeued)?,
            protocol_revenue: fixed::checked_add(self.protocol_revenue, protocol)?,
        })
    }

    fn settle_payment(&mut self, plan: PaymentPlan) -> Result<(), LedgerError> {
        if plan.staker > 0 {
            self.pool.credit(plan.staker)?;
        }
        self.undistributed = plan.undistributed;
        self.protocol_revenue = plan.protocol_revenue;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn epoch(&self) -> Epoch {
        self.shares.epoch()
    }

    /// `(6, epoch + 1)`.
    pub fn share_type_accumulator_size(&self) -> (usize, usize) {
        self.shares.size()
    }

    pub fn share_type_accumulator(&self, piece: PieceType, epoch: Epoch) -> Result<u128, LedgerError> {
        self.shares.snapshot(piece, epoch)
    }

    /// Full accumulator table, one row per piece type.
    pub fn accumulator_table(&self) -> Vec<Vec<u128>> {
        PieceType::ALL
            .iter()
            .map(|&p| self.shares.row(p).to_vec())
            .collect()
    }

    /// Total staked share weight of `piece` as it stood at `epoch`.
    pub fn total_share_per_token(&self, piece: PieceType, epoch: Epoch) -> Result<u64, LedgerError> {
        self.shares.shares_at(piece, epoch)
    }

    /// Full share-total table, one row per piece type.
    pub fn share_totals_table(&self) -> Vec<Vec<u64>> {
        PieceType::ALL
            .iter()
            .map(|&p| self.shares.share_row(p).to_vec())
            .collect()
    }

    pub fn nft_shares(&self, token: TokenId) -> u64 {
        self.stakes.nft_shares(token)
    }

    /// Claimable reward of `token`. Destroyed tokens have none.
    pub fn unclaimed_rewards(&self, token: TokenId) -> Result<u128, LedgerError> {
        if self.tokens.burned(token).is_some() {
            return Ok(0);
        }
        self.tokens.owner_of(token)?;
        rewards::unclaimed(&self.stakes, &self.shares, token)
    }

    pub fn owner_of(&self, token: TokenId) -> Result<Address, LedgerError> {
        self.tokens.owner_of(token)
    }

    /// Id the next mint will assign.
    pub fn next_token_id(&self) -> TokenId {
        self.tokens.next_id()
    }

    pub fn stake_of(&self, token: TokenId) -> Option<&StakeRecord> {
        self.stakes.get(token)
    }

    pub fn type_shares(&self, piece: PieceType) -> u64 {
        self.shares.type_shares(piece)
    }

    /// King auction price at `now`.
    pub fn current_price(&self, now: u64) -> Result<u128, LedgerError> {
        Ok(self.schedule.price_at(now)?)
    }

    pub fn reveal_status(&self, token: TokenId) -> Option<RevealStatus> {
        self.reveals.status(token)
    }

    pub fn undistributed(&self) -> u128 {
        self.undistributed
    }

    pub fn protocol_revenue(&self) -> u128 {
        self.protocol_revenue
    }

    pub fn king_hand_pot(&self) -> u128 {
        self.king_hand_pot
    }

    pub fn pool_balance(&self) -> u128 {
        self.pool.balance()
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            epoch: self.shares.epoch(),
            live_tokens: self.tokens.live_count(),
            active_stakes: self.stakes.len(),
            pending_reveals: self.reveals.pending_count(),
            type_shares: PieceType::ALL.map(|p| self.shares.type_shares(p)),
            accumulator_tails: PieceType::ALL.map(|p| self.shares.tail(p)),
            undistributed: self.undistributed,
            protocol_revenue: self.protocol_revenue,
            king_hand_pot: self.king_hand_pot,
            pool_balance: self.pool.balance(),
        }
    }
}

fn ensure_payment(got: u128, need: u128) -> Result<(), LedgerError> {
    if got < need {
        return Err(LedgerError::InsufficientPayment { got, need });
    }
    Ok(())
}
