//! Ledger configuration.
//!
//! [`LedgerConfig`] carries prices, supply limits, the revenue split and the
//! king auction parameters. Values come from the built-in defaults, then an
//! optional TOML file, then `NRC_*` environment variables
//! (e.g. `NRC_MINT_PRICE=5000`).

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use nrc_auction::{AuctionSchedule, PriceCurve};
use nrc_core::constants::{
    BPS_PRECISION, DEFAULT_KILL_PRICE, DEFAULT_KING_BASE_PRICE, DEFAULT_KING_DECAY_BPS,
    DEFAULT_KING_FLOOR_PRICE, DEFAULT_KING_HAND_ODDS, DEFAULT_KING_HAND_PRIZE,
    DEFAULT_MAX_MINT_PER_CALL, DEFAULT_MAX_SUPPLY, DEFAULT_MINT_PRICE, DEFAULT_REVEAL_PRICE,
    DEFAULT_STAKER_SHARE_BPS, KING_ID_END, SECONDS_PER_DAY,
};
use nrc_core::error::{ConfigError, CurveError};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "NRC";

/// Tunable ledger parameters. Monetary values are in wei.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Price per minted token.
    pub mint_price: u64,
    /// Price per token killed.
    pub kill_price: u64,
    /// Price of a king-hand reveal.
    pub reveal_price: u64,
    /// Token ids are assigned below this bound.
    pub max_supply: u64,
    pub max_mint_per_call: u64,
    /// Share of revenue routed to stakers, in bps.
    pub staker_share_bps: u64,
    pub king_base_price: u64,
    pub king_floor_price: u64,
    /// Fraction of the above-floor king price kept per decay period, in bps.
    pub king_decay_bps: u64,
    pub king_decay_period_secs: u64,
    /// Unix timestamp at which the king auction opens.
    pub auction_start: u64,
    pub king_hand_odds: u64,
    pub king_hand_prize: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            mint_price: DEFAULT_MINT_PRICE,
            kill_price: DEFAULT_KILL_PRICE,
            reveal_price: DEFAULT_REVEAL_PRICE,
            max_supply: DEFAULT_MAX_SUPPLY,
            max_mint_per_call: DEFAULT_MAX_MINT_PER_CALL,
            staker_share_bps: DEFAULT_STAKER_SHARE_BPS,
            king_base_price: DEFAULT_KING_BASE_PRICE,
            king_floor_price: DEFAULT_KING_FLOOR_PRICE,
            king_decay_bps: DEFAULT_KING_DECAY_BPS,
            king_decay_period_secs: SECONDS_PER_DAY,
            auction_start: 0,
            king_hand_odds: DEFAULT_KING_HAND_ODDS,
            king_hand_prize: DEFAULT_KING_HAND_PRIZE,
        }
    }
}

impl LedgerConfig {
    /// Load from defaults, an optional TOML file, and `NRC_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        builder = builder.add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let cfg: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject inconsistent values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.staker_share_bps > BPS_PRECISION {
            return Err(ConfigError::Invalid(format!(
                "staker_share_bps {} exceeds {BPS_PRECISION}",
                self.staker_share_bps
            )));
        }
        if self.max_supply <= KING_ID_END {
            return Err(ConfigError::Invalid(format!(
                "max_supply must exceed {KING_ID_END}"
            )));
        }
        if self.max_mint_per_call == 0 {
            return Err(ConfigError::Invalid("max_mint_per_call must be > 0".into()));
        }
        if self.king_hand_odds == 0 {
            return Err(ConfigError::Invalid("king_hand_odds must be > 0".into()));
        }
        self.price_curve()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    /// The king auction curve described by this config.
    pub fn price_curve(&self) -> Result<PriceCurve, CurveError> {
        PriceCurve::from_bps(
            self.king_base_price as u128,
            self.king_floor_price as u128,
            self.king_decay_bps,
            self.king_decay_period_secs,
        )
    }

    /// The king auction schedule described by this config.
    pub fn auction_schedule(&self) -> Result<AuctionSchedule, CurveError> {
        Ok(AuctionSchedule::new(
            self.auction_start,
            Arc::new(self.price_curve()?),
        ))
    }
}
