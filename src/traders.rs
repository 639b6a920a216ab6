//! Taker populations: uninformed noise flow and value-aware informed flow.
//!
//! Both policies mint fresh order ids from owned monotone counters and hand
//! ownership of the generated order to the book. Draw order per invocation
//! is part of the determinism contract.

use tracing::debug;

use crate::rng::SimRng;
use crate::types::{AgentClass, Order, Side};

/// Default informed-taker edge threshold (relative). The informed taker
/// stays out while `|true value - reference| / reference` is below this.
pub const DEFAULT_EDGE_THRESHOLD: f64 = 0.0005;

const NOISE_QTY_RANGE: (i64, i64) = (1, 10);
const INFORMED_QTY_RANGE: (i64, i64) = (5, 20);

/// Uninformed taker: fair-coin side, small uniform size.
#[derive(Debug)]
pub struct NoiseTrader {
    owner: String,
    seq: u64,
}

impl NoiseTrader {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            seq: 0,
        }
    }

    /// Maybe emit a market order.
    ///
    /// Draw order: arrival Bernoulli, side Bernoulli, quantity.
    pub fn generate(&mut self, rng: &mut SimRng, arrival_prob: f64, ts: u64) -> Option<Order> {
        if !rng.chance(arrival_prob) {
            return None;
        }
        let side = if rng.chance(0.5) { Side::Buy } else { Side::Sell };
        let qty = rng.int_between(NOISE_QTY_RANGE.0, NOISE_QTY_RANGE.1) as u64;
        self.seq += 1;
        let order = Order::market(
            format!("{}-{}", self.owner, self.seq),
            self.owner.clone(),
            AgentClass::Noise,
            side,
            qty,
            ts,
        );
        debug!(id = %order.id, side = ?side, qty, "noise order");
        Some(order)
    }
}

/// Informed taker: trades the sign of the latent-value edge, in size, but
/// only when the edge clears the threshold.
#[derive(Debug)]
pub struct InformedTrader {
    owner: String,
    seq: u64,
    edge_threshold: f64,
}

impl InformedTrader {
    pub fn new(owner: impl Into<String>, edge_threshold: f64) -> Self {
        Self {
            owner: owner.into(),
            seq: 0,
            edge_threshold,
        }
    }

    /// Maybe emit a market order.
    ///
    /// `reference` is the current mid when the book is two-sided, otherwise
    /// the latent value itself (the caller decides). Draw order: arrival
    /// Bernoulli, then quantity; the side comes from the edge sign and
    /// consumes no draw.
    pub fn generate(
        &mut self,
        rng: &mut SimRng,
        arrival_prob: f64,
        true_value: f64,
        reference: f64,
        ts: u64,
    ) -> Option<Order> {
        if !rng.chance(arrival_prob) {
            return None;
        }
        let edge = (true_value - reference) / reference;
        if edge.abs() < self.edge_threshold {
            return None;
        }
        let side = if edge > 0.0 { Side::Buy } else { Side::Sell };
        let qty = rng.int_between(INFORMED_QTY_RANGE.0, INFORMED_QTY_RANGE.1) as u64;
        self.seq += 1;
        let order = Order::market(
            format!("{}-{}", self.owner, self.seq),
            self.owner.clone(),
            AgentClass::Informed,
            side,
            qty,
            ts,
        );
        debug!(id = %order.id, side = ?side, qty, edge, "informed order");
        Some(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_no_arrival_consumes_one_draw() {
        let mut trader = NoiseTrader::new("noise");
        let mut rng = SimRng::new(42);
        let mut control = SimRng::new(42);
        assert!(trader.generate(&mut rng, 0.0, 0).is_none());
        control.next_f64();
        assert_eq!(rng.next_f64(), control.next_f64());
    }

    #[test]
    fn test_noise_qty_and_side_ranges() {
        let mut trader = NoiseTrader::new("noise");
        let mut rng = SimRng::new(42);
        let mut buys = 0;
        let mut sells = 0;
        for _ in 0..500 {
            let order = trader.generate(&mut rng, 1.0, 0).unwrap();
            assert!((1..=10).contains(&order.qty));
            match order.side {
                Side::Buy => buys += 1,
                Side::Sell => sells += 1,
            }
        }
        assert!(buys > 100 && sells > 100);
    }

    #[test]
    fn test_noise_ids_unique_and_monotone() {
        let mut trader = NoiseTrader::new("noise");
        let mut rng = SimRng::new(42);
        let a = trader.generate(&mut rng, 1.0, 0).unwrap();
        let b = trader.generate(&mut rng, 1.0, 100).unwrap();
        assert_eq!(a.id, "noise-1");
        assert_eq!(b.id, "noise-2");
    }

    #[test]
    fn test_informed_flat_edge_emits_nothing() {
        let mut trader = InformedTrader::new("informed", DEFAULT_EDGE_THRESHOLD);
        let mut rng = SimRng::new(42);
        // Edge exactly zero.
        assert!(trader.generate(&mut rng, 1.0, 100.0, 100.0, 0).is_none());
        // Just under the threshold.
        let reference = 100.0;
        let value = reference * (1.0 + DEFAULT_EDGE_THRESHOLD * 0.99);
        assert!(trader.generate(&mut rng, 1.0, value, reference, 0).is_none());
    }

    #[test]
    fn test_informed_no_qty_draw_below_threshold() {
        // Stream alignment: a suppressed order must consume only the
        // arrival draw.
        let mut trader = InformedTrader::new("informed", DEFAULT_EDGE_THRESHOLD);
        let mut rng = SimRng::new(42);
        let mut control = SimRng::new(42);
        trader.generate(&mut rng, 1.0, 100.0, 100.0, 0);
        control.next_f64();
        assert_eq!(rng.next_f64(), control.next_f64());
    }

    #[test]
    fn test_informed_side_follows_edge_sign() {
        let mut trader = InformedTrader::new("informed", DEFAULT_EDGE_THRESHOLD);
        let mut rng = SimRng::new(42);
        let buy = trader.generate(&mut rng, 1.0, 101.0, 100.0, 0).unwrap();
        assert_eq!(buy.side, Side::Buy);
        let sell = trader.generate(&mut rng, 1.0, 99.0, 100.0, 0).unwrap();
        assert_eq!(sell.side, Side::Sell);
        assert!((5..=20).contains(&buy.qty));
        assert!((5..=20).contains(&sell.qty));
    }

    #[test]
    fn test_informed_threshold_is_configurable() {
        let mut trader = InformedTrader::new("informed", 0.001);
        let mut rng = SimRng::new(42);
        let above = trader.generate(&mut rng, 1.0, 100.2, 100.0, 0);
        assert!(above.is_some());
        let below = trader.generate(&mut rng, 1.0, 100.05, 100.0, 0);
        assert!(below.is_none());
    }
}
