//! Adaptive market maker.
//!
//! Quotes an inventory-skewed bid/ask pair around a reference mid, tracks
//! which of its fills came from informed flow, widens its spread as the
//! adverse fraction rises, and decomposes realized P&L into a spread
//! component (fill price vs contemporaneous true value) and an inventory
//! component (mark-to-market of pre-trade inventory over the step).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{AgentClass, Order, Side, Trade};

/// Sliding window length for adverse-fill tracking.
pub const ADVERSE_WINDOW: usize = 20;
/// Minimum window occupancy before spread adaptation engages.
const MIN_ADAPT_FILLS: usize = 5;
/// How strongly the adverse fraction inflates the target spread.
const ADVERSE_SPREAD_MULT: f64 = 3.0;
/// Lower clamp on the quoted spread, as a fraction of the base spread.
const SPREAD_FLOOR_FRAC: f64 = 0.5;

/// One maker-side fill in the adverse window.
#[derive(Debug, Clone, Copy)]
struct FillTag {
    adverse: bool,
    #[allow(dead_code)]
    ts: u64,
}

/// Cumulative maker accounting, exposed through the per-tick metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MakerStats {
    pub spread_pnl: f64,
    pub inventory_pnl: f64,
    /// Sum of |spread captured| across fills.
    pub total_spread_captured: f64,
    pub fill_count: u64,
    /// Mean absolute spread captured per fill; zero before the first fill.
    pub avg_realized_spread: f64,
}

/// The market maker.
pub struct MarketMaker {
    owner: String,
    base_spread: f64,
    current_spread: f64,
    size: u64,
    adapt_rate: f64,
    inventory_skew: f64,
    /// Signed inventory, positive = long.
    inventory: i64,
    spread_pnl: f64,
    inventory_pnl: f64,
    total_spread_captured: f64,
    fill_count: u64,
    window: VecDeque<FillTag>,
    seq: u64,
}

impl MarketMaker {
    pub fn new(
        owner: impl Into<String>,
        base_spread: f64,
        size: u64,
        adapt_rate: f64,
        inventory_skew: f64,
    ) -> Self {
        Self {
            owner: owner.into(),
            base_spread,
            current_spread: base_spread,
            size,
            adapt_rate,
            inventory_skew,
            inventory: 0,
            spread_pnl: 0.0,
            inventory_pnl: 0.0,
            total_spread_captured: 0.0,
            fill_count: 0,
            window: VecDeque::with_capacity(ADVERSE_WINDOW + 1),
            seq: 0,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Build the bid/ask pair around `reference_mid`, both shifted down by
    /// `inventory * skew` (long inventory lowers quotes to encourage sells,
    /// short inventory raises them). Prices are rounded to the cent.
    ///
    /// The caller cancels the maker's resting orders before submitting the
    /// pair. Under extreme skew the rounded pair can cross; it is emitted
    /// as-is and will self-match on submission.
    pub fn quotes(&mut self, reference_mid: f64, ts: u64) -> (Order, Order) {
        let half = self.current_spread / 2.0;
        let skew = self.inventory as f64 * self.inventory_skew;
        let bid_px = round_cents(reference_mid - half - skew);
        let ask_px = round_cents(reference_mid + half - skew);
        if bid_px >= ask_px {
            warn!(bid = bid_px, ask = ask_px, inventory = self.inventory, "crossed quote pair");
        }
        self.seq += 1;
        let bid = Order::limit(
            format!("{}-{}", self.owner, self.seq),
            self.owner.clone(),
            AgentClass::Maker,
            Side::Buy,
            bid_px,
            self.size,
            ts,
        );
        self.seq += 1;
        let ask = Order::limit(
            format!("{}-{}", self.owner, self.seq),
            self.owner.clone(),
            AgentClass::Maker,
            Side::Sell,
            ask_px,
            self.size,
            ts,
        );
        (bid, ask)
    }

    /// Ingest a trade. Fills where we are not the resting maker are ignored.
    ///
    /// `value_after` is the latent value after the post-match price step.
    /// Spread capture is measured against the trade's own true value;
    /// inventory mark-to-market applies the step move to the inventory held
    /// before the fill, which makes the decomposition exact.
    pub fn on_trade(&mut self, trade: &Trade, value_after: f64) {
        if trade.maker_owner != self.owner {
            return;
        }
        let qty = trade.qty as f64;
        let captured = match trade.taker_side {
            // Taker bought: we sold above (or below) true value.
            Side::Buy => (trade.price - trade.true_value) * qty,
            // Taker sold: we bought below (or above) true value.
            Side::Sell => (trade.true_value - trade.price) * qty,
        };
        let prev_inventory = self.inventory;
        match trade.taker_side {
            Side::Buy => self.inventory -= trade.qty as i64,
            Side::Sell => self.inventory += trade.qty as i64,
        }
        let inventory_mtm = prev_inventory as f64 * (value_after - trade.true_value);

        self.spread_pnl += captured;
        self.total_spread_captured += captured.abs();
        self.fill_count += 1;
        self.inventory_pnl += inventory_mtm;

        self.window.push_back(FillTag {
            adverse: trade.taker_class == AgentClass::Informed,
            ts: trade.ts,
        });
        while self.window.len() > ADVERSE_WINDOW {
            self.window.pop_front();
        }
        debug!(
            trade = trade.id,
            captured,
            inventory = self.inventory,
            adverse_ratio = self.adverse_ratio(),
            "maker fill"
        );
        self.adapt_spread();
    }

    /// Relax the quoted spread toward `base * (1 + 3 * adverse_ratio)`,
    /// floored at half the base spread. Inert until the window holds
    /// [`MIN_ADAPT_FILLS`] entries; there is no upper cap.
    fn adapt_spread(&mut self) {
        if self.window.len() < MIN_ADAPT_FILLS {
            return;
        }
        let target = self.base_spread * (1.0 + ADVERSE_SPREAD_MULT * self.adverse_ratio());
        self.current_spread += self.adapt_rate * (target - self.current_spread);
        self.current_spread = self.current_spread.max(SPREAD_FLOOR_FRAC * self.base_spread);
    }

    /// Total realized P&L, by construction the sum of its two components.
    pub fn pnl(&self) -> f64 {
        self.spread_pnl + self.inventory_pnl
    }

    pub fn inventory(&self) -> i64 {
        self.inventory
    }

    pub fn quoted_spread(&self) -> f64 {
        self.current_spread
    }

    /// Adverse fraction of the sliding window; zero when empty.
    pub fn adverse_ratio(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let adverse = self.window.iter().filter(|tag| tag.adverse).count();
        adverse as f64 / self.window.len() as f64
    }

    pub fn stats(&self) -> MakerStats {
        MakerStats {
            spread_pnl: self.spread_pnl,
            inventory_pnl: self.inventory_pnl,
            total_spread_captured: self.total_spread_captured,
            fill_count: self.fill_count,
            avg_realized_spread: if self.fill_count == 0 {
                0.0
            } else {
                self.total_spread_captured / self.fill_count as f64
            },
        }
    }
}

fn round_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}
