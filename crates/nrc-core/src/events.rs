//! Ledger events, recorded for every state change and drained by the host.

use serde::{Deserialize, Serialize};

use crate::types::{Address, Color, Epoch, RequestId, TokenId};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    Minted {
        owner: Address,
        color: Color,
        tokens: Vec<TokenId>,
    },
    Transferred {
        token: TokenId,
        from: Address,
        to: Address,
    },
    Staked {
        token: TokenId,
        owner: Address,
        identifier: String,
        epoch: Epoch,
        weight: u64,
    },
    Unstaked {
        token: TokenId,
        owner: Address,
        epoch: Epoch,
        /// Reward accrued while staked, moved to pending.
        settled: u128,
    },
    RewardClaimed {
        token: TokenId,
        owner: Address,
        amount: u128,
    },
    EpochAdvanced {
        epoch: Epoch,
        distributed: u128,
        /// Undistributed remainder carried into the next epoch.
        carried: u128,
    },
    Killed {
        token: TokenId,
        owner: Address,
        killer: Address,
    },
    Burned {
        token: TokenId,
        owner: Address,
    },
    /// A destroyed token still had rewards; they are re-queued for distribution.
    TokenBurnedWithUnclaimedRewards {
        token: TokenId,
        forfeited: u128,
    },
    KingBought {
        token: TokenId,
        color: Color,
        buyer: Address,
        price: u128,
    },
    RevealRequested {
        token: TokenId,
        owner: Address,
        request: RequestId,
    },
    RevealFulfilled {
        token: TokenId,
        request: RequestId,
        success: bool,
    },
    KingHandClaimed {
        token: TokenId,
        owner: Address,
        amount: u128,
    },
}

impl LedgerEvent {
    /// Token the event concerns, if it concerns exactly one.
    pub fn token(&self) -> Option<TokenId> {
        match self {
            Self::Minted { .. } | Self::EpochAdvanced { .. } => None,
            Self::Transferred { token, .. }
            | Self::Staked { token, .. }
            | Self::Unstaked { token, .. }
            | Self::RewardClaimed { token, .. }
            | Self::Killed { token, .. }
            | Self::Burned { token, .. }
            | Self::TokenBurnedWithUnclaimedRewards { token, .. }
            | Self::KingBought { token, .. }
            | Self::RevealRequested { token, .. }
            | Self::RevealFulfilled { token, .. }
            | Self::KingHandClaimed { token, .. } => Some(*token),
        }
    }
}
