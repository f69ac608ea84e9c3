//! Wall-clock view of an auction: maps timestamps onto curve time.

use std::sync::Arc;

use nrc_core::error::CurveError;
use nrc_core::traits::PriceCalculator;

/// A price curve anchored at an opening timestamp (Unix seconds).
#[derive(Clone)]
pub struct AuctionSchedule {
    start: u64,
    curve: Arc<dyn PriceCalculator>,
}

impl AuctionSchedule {
    pub fn new(start: u64, curve: Arc<dyn PriceCalculator>) -> Self {
        Self { start, curve }
    }

    /// Opening timestamp.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Whether purchases are accepted at `now`.
    pub fn is_open(&self, now: u64) -> bool {
        now >= self.start
    }

    /// Seconds since opening. Timestamps before the opening clamp to zero.
    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.start)
    }

    /// Price in wei at `now`.
    pub fn price_at(&self, now: u64) -> Result<u128, CurveError> {
        self.curve.price(self.elapsed(now))
    }

    /// Raw Q64.64 curve factor at `now`.
    pub fn factor_at(&self, now: u64) -> Result<u128, CurveError> {
        self.curve.factor(self.elapsed(now))
    }

    /// The underlying curve.
    pub fn curve(&self) -> &dyn PriceCalculator {
        self.curve.as_ref()
    }
}

impl std::fmt::Debug for AuctionSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuctionSchedule")
            .field("start", &self.start)
            .field("base_price", &self.curve.base_price())
            .field("floor_price", &self.curve.floor_price())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::PriceCurve;
    use nrc_core::constants::{ETHER, SECONDS_PER_DAY};

    fn schedule(start: u64) -> AuctionSchedule {
        let curve = PriceCurve::from_bps(10 * ETHER, ETHER, 9_000, SECONDS_PER_DAY).unwrap();
        AuctionSchedule::new(start, Arc::new(curve))
    }

    #[test]
    fn before_start_is_closed_and_priced_at_base() {
        let s = schedule(1_000);
        assert!(!s.is_open(999));
        assert_eq!(s.elapsed(999), 0);
        assert_eq!(s.price_at(0).unwrap(), 10 * ETHER);
    }

    #[test]
    fn open_at_start() {
        let s = schedule(1_000);
        assert!(s.is_open(1_000));
        assert_eq!(s.price_at(1_000).unwrap(), 10 * ETHER);
    }

    #[test]
    fn price_drops_after_start() {
        let s = schedule(1_000);
        let later = s.price_at(1_000 + SECONDS_PER_DAY).unwrap();
        assert!(later < 10 * ETHER);
        assert!(later > ETHER);
    }

    #[test]
    fn factor_tracks_elapsed() {
        let s = schedule(500);
        assert_eq!(s.factor_at(500).unwrap(), s.curve().factor(0).unwrap());
        assert_eq!(
            s.factor_at(500 + SECONDS_PER_DAY).unwrap(),
            s.curve().factor(SECONDS_PER_DAY).unwrap()
        );
    }

    #[test]
    fn debug_shows_prices() {
        let dbg = format!("{:?}", schedule(7));
        assert!(dbg.contains("AuctionSchedule"));
        assert!(dbg.contains("start: 7"));
    }
}
