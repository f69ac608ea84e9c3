//! Error types for the Number Runner Club ledger.
use thiserror::Error;

use crate::types::{Epoch, PieceType, TokenId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("arithmetic overflow")] ArithmeticOverflow,
    #[error("division by zero")] DivisionByZero,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    #[error("invalid curve: {0}")] InvalidCurve(String),
    #[error(transparent)] Math(#[from] MathError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("insufficient pool balance: have {have}, need {need}")] Insufficient { have: u128, need: u128 },
    #[error("pool balance overflow")] Overflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("token {token} is not owned by caller")] NotOwner { token: TokenId },
    #[error("token {0} is already staked")] AlreadyStaked(TokenId),
    #[error("token {0} is not staked")] NotStaked(TokenId),
    #[error("share underflow for {piece}: total {total}, removing {weight}")] ShareUnderflow { piece: PieceType, total: u64, weight: u64 },
    #[error("epoch {requested} out of range (current {current})")] EpochOutOfRange { requested: Epoch, current: Epoch },
    #[error("insufficient payment: got {got}, need {need}")] InsufficientPayment { got: u128, need: u128 },
    #[error("token {token} was burned with {forfeited} unclaimed rewards")] TokenBurnedWithUnclaimedRewards { token: TokenId, forfeited: u128 },
    #[error("token {0} does not exist")] TokenNotFound(TokenId),
    #[error("token {0} is staked")] TokenStaked(TokenId),
    #[error("identifier already backs token {0}")] IdentifierInUse(TokenId),
    #[error("invalid identifier: {0}")] InvalidIdentifier(String),
    #[error("reward debt {debt} exceeds accumulator tail {tail} for token {token}")] RewardDebtExceedsAccumulator { token: TokenId, debt: u128, tail: u128 },
    #[error("supply exhausted: max {max}")] SupplyExhausted { max: u64 },
    #[error("invalid mint quantity: {0}")] InvalidQuantity(u64),
    #[error("king {0} already sold")] KingAlreadySold(TokenId),
    #[error("auction opens at {start}, now {now}")] AuctionNotStarted { start: u64, now: u64 },
    #[error("cannot kill own token {0}")] SelfKill(TokenId),
    #[error("king {0} cannot be killed")] KingImmune(TokenId),
    #[error("duplicate token {0} in batch")] DuplicateToken(TokenId),
    #[error("empty kill list")] EmptyKillList,
    #[error(transparent)] PoolExhausted(#[from] PoolError),
    #[error("reveal already pending for token {0}")] RevealPending(TokenId),
    #[error("token {0} already revealed")] AlreadyRevealed(TokenId),
    #[error("unknown reveal request: {0}")] UnknownRequest(String),
    #[error("token {0} is not a king hand")] NotKingHand(TokenId),
    #[error("king hand {0} already claimed")] AlreadyClaimed(TokenId),
    #[error(transparent)] Math(#[from] MathError),
    #[error(transparent)] Curve(#[from] CurveError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load: {0}")] Load(String),
    #[error("invalid config: {0}")] Invalid(String),
}

#[derive(Error, Debug)]
pub enum NrcError {
    #[error(transparent)] Math(#[from] MathError),
    #[error(transparent)] Curve(#[from] CurveError),
    #[error(transparent)] Pool(#[from] PoolError),
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Config(#[from] ConfigError),
}
