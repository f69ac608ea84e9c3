//! Two-phase king-hand reveal.
//!
//! A holder pays for a reveal and receives a [`RequestId`]. The randomness
//! source later fulfils the request; one in `odds` outcomes marks the token
//! as a king hand, which may then claim a prize once.

use std::collections::HashMap;

use serde::Serialize;

use nrc_core::error::LedgerError;
use nrc_core::types::{RequestId, TokenId};

/// Reveal state of one token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RevealStatus {
    Pending(RequestId),
    Revealed { winner: bool, claimed: bool },
}

/// Outstanding requests and revealed outcomes.
#[derive(Clone, Debug, Default)]
pub struct RevealBook {
    nonce: u64,
    requests: HashMap<RequestId, TokenId>,
    status: HashMap<TokenId, RevealStatus>,
}

impl RevealBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, token: TokenId) -> Option<RevealStatus> {
        self.status.get(&token).copied()
    }

    /// Number of requests awaiting fulfilment.
    pub fn pending_count(&self) -> usize {
        self.requests.len()
    }

    /// Fails if `token` already has a pending or completed reveal.
    pub fn check_request(&self, token: TokenId) -> Result<(), LedgerError> {
        match self.status.get(&token) {
            Some(RevealStatus::Pending(_)) => Err(LedgerError::RevealPending(token)),
            Some(RevealStatus::Revealed { .. }) => Err(LedgerError::AlreadyRevealed(token)),
            None => Ok(()),
        }
    }

    /// Open a reveal request for `token`. Callers run
    /// [`check_request`](Self::check_request) first.
    pub fn request(&mut self, token: TokenId) -> RequestId {
        let id = RequestId::derive(token, self.nonce);
        self.nonce = self.nonce.wrapping_add(1);
        self.requests.insert(id, token);
        self.status.insert(token, RevealStatus::Pending(id));
        id
    }

    /// Resolve a request with a random value; returns `(token, winner)`.
    ///
    /// The token is a king hand iff `random % odds == 0`.
    pub fn fulfill(&mut self, request: &RequestId, random: u64, odds: u64) -> Result<(TokenId, bool), LedgerError> {
        let token = self
            .requests
            .remove(request)
            .ok_or_else(|| LedgerError::UnknownRequest(request.to_string()))?;
        let winner = odds != 0 && random % odds == 0;
        self.status.insert(
            token,
            RevealStatus::Revealed {
                winner,
                claimed: false,
            },
        );
        Ok((token, winner))
    }

    /// Fails unless `token` is an unclaimed king hand.
    pub fn check_claim(&self, token: TokenId) -> Result<(), LedgerError> {
        match self.status.get(&token) {
            Some(RevealStatus::Revealed { winner: true, claimed: false }) => Ok(()),
            Some(RevealStatus::Revealed { winner: true, claimed: true }) => {
                Err(LedgerError::AlreadyClaimed(token))
            }
            _ => Err(LedgerError::NotKingHand(token)),
        }
    }

    pub fn mark_claimed(&mut self, token: TokenId) {
        if let Some(RevealStatus::Revealed { claimed, .. }) = self.status.get_mut(&token) {
            *claimed = true;
        }
    }

    /// Drop all reveal state of a destroyed token.
    pub fn forget(&mut self, token: TokenId) {
        if let Some(RevealStatus::Pending(id)) = self.status.remove(&token) {
            self.requests.remove(&id);
        }
    }
}
