//! Exponential price decay implementing the [`PriceCalculator`] trait.
//!
//! `price(t) = floor + (base - floor) * decay^(t / period)`
//!
//! The decay factor for whole periods comes from a table of `decay^n` in
//! Q64.64, filled by repeated multiplication until it reaches zero (or
//! [`MAX_TABLE_PERIODS`]). Between two table entries the factor is
//! linearly interpolated, mirroring a lookup-table exponential.

use nrc_core::error::{CurveError, MathError};
use nrc_core::fixed::{self, ONE};
use nrc_core::traits::PriceCalculator;
use tracing::debug;

/// Upper bound on the decay table length.
///
/// Curves whose factor has not reached zero by then interpolate to zero
/// over one final period.
pub const MAX_TABLE_PERIODS: usize = 8_192;

/// Descending price curve for a Dutch auction.
#[derive(Debug, Clone)]
pub struct PriceCurve {
    base: u128,
    floor: u128,
    decay: u128,
    period: u64,
    /// `powers[n] = decay^n` in Q64.64, non-increasing.
    powers: Vec<u128>,
}

impl PriceCurve {
    /// Create a curve from a Q64.64 decay factor.
    ///
    /// `decay` is the fraction of the above-floor price retained after one
    /// `period` (in seconds) and must lie strictly between 0 and 1.
    pub fn new(base: u128, floor: u128, decay: u128, period: u64) -> Result<Self, CurveError> {
        if period == 0 {
            return Err(CurveError::InvalidCurve("period must be > 0".into()));
        }
        if floor > base {
            return Err(CurveError::InvalidCurve(format!(
                "floor {floor} above base {base}"
            )));
        }
        if decay == 0 || decay >= ONE {
            return Err(CurveError::InvalidCurve(
                "decay must be strictly between 0 and 1".into(),
            ));
        }

        let powers = decay_table(decay)?;
        debug!(
            base,
            floor,
            period,
            table_len = powers.len(),
            "built price curve"
        );

        Ok(Self {
            base,
            floor,
            decay,
            period,
            powers,
        })
    }

    /// Create a curve with the decay factor given in basis points.
    pub fn from_bps(base: u128, floor: u128, decay_bps: u64, period: u64) -> Result<Self, CurveError> {
        let decay = fixed::from_bps(decay_bps)?;
        Self::new(base, floor, decay, period)
    }

    /// Q64.64 decay factor per period.
    pub fn decay(&self) -> u128 {
        self.decay
    }

    /// Period length in seconds.
    pub fn period(&self) -> u64 {
        self.period
    }

    /// Elapsed seconds from which the price stays at the floor.
    pub fn saturation_secs(&self) -> u64 {
        let periods = self
            .powers
            .iter()
            .position(|&p| p == 0)
            .unwrap_or(self.powers.len());
        (periods as u64).saturating_mul(self.period)
    }
}

/// `decay^n` for `n = 0, 1, ...` until zero or the table limit.
fn decay_table(decay: u128) -> Result<Vec<u128>, MathError> {
    let mut powers = Vec::with_capacity(512);
    let mut current = ONE;
    powers.push(current);
    while current > 0 && powers.len() < MAX_TABLE_PERIODS {
        current = fixed::mul_scaled(current, decay)?;
        powers.push(current);
    }
    Ok(powers)
}

impl PriceCalculator for PriceCurve {
    fn factor(&self, elapsed_secs: u64) -> Result<u128, CurveError> {
        let n = elapsed_secs / self.period;
        let r = elapsed_secs % self.period;

        let Some(index) = usize::try_from(n).ok().filter(|&i| i < self.powers.len()) else {
            return Ok(0);
        };
        let lo = self.powers[index];
        let hi = self.powers.get(index + 1).copied().unwrap_or(0);

        // Linear interpolation: lo - (lo - hi) * r / period
        let drop = fixed::mul_div(lo - hi, r as u128, self.period as u128)?;
        Ok(lo - drop)
    }

    fn price(&self, elapsed_secs: u64) -> Result<u128, CurveError> {
        let factor = self.factor(elapsed_secs)?;
        let above_floor = fixed::apply(self.base - self.floor, factor)?;
        Ok(fixed::checked_add(self.floor, above_floor)?)
    }

    fn base_price(&self) -> u128 {
        self.base
    }

    fn floor_price(&self) -> u128 {
        self.floor
    }
}
