//! Order and trade types shared by the book, traders, and maker.

use serde::{Deserialize, Serialize};

/// Side of an order (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order kind: a limit order may rest; a market order never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Limit,
    Market,
}

/// Which population an order's owner belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentClass {
    Maker,
    Informed,
    Noise,
}

/// A single order.
///
/// Created by an agent, owned by the book once accepted, removed when fully
/// filled or cancelled. `filled <= qty` always; a resting order always has
/// `filled < qty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique id, `"<owner>-<seq>"` with a per-owner monotone counter.
    pub id: String,
    pub owner: String,
    pub owner_class: AgentClass,
    pub side: Side,
    pub kind: OrderKind,
    /// Limit price; zero for market orders.
    pub price: f64,
    /// Total quantity, positive.
    pub qty: u64,
    /// Filled quantity so far.
    pub filled: u64,
    /// Submission timestamp, simulated milliseconds.
    pub ts: u64,
}

impl Order {
    pub fn limit(
        id: String,
        owner: String,
        owner_class: AgentClass,
        side: Side,
        price: f64,
        qty: u64,
        ts: u64,
    ) -> Self {
        Self {
            id,
            owner,
            owner_class,
            side,
            kind: OrderKind::Limit,
            price,
            qty,
            filled: 0,
            ts,
        }
    }

    pub fn market(
        id: String,
        owner: String,
        owner_class: AgentClass,
        side: Side,
        qty: u64,
        ts: u64,
    ) -> Self {
        Self {
            id,
            owner,
            owner_class,
            side,
            kind: OrderKind::Market,
            price: 0.0,
            qty,
            filled: 0,
            ts,
        }
    }

    /// Unfilled quantity.
    pub fn remaining(&self) -> u64 {
        self.qty - self.filled
    }

    pub fn is_filled(&self) -> bool {
        self.filled >= self.qty
    }
}

/// An executed fill.
///
/// Trades are immutable once emitted; the emitted sequence is the system's
/// primary event log. Each trade carries full attribution for both sides and
/// the latent true value observed at the instant of the fill, before the
/// post-match price step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: u64,
    /// Timestamp of the submitting taker order, simulated milliseconds.
    pub ts: u64,
    /// Execution price: always the resting maker's price.
    pub price: f64,
    pub qty: u64,
    pub taker_order: String,
    pub taker_owner: String,
    pub taker_side: Side,
    pub taker_class: AgentClass,
    pub maker_order: String,
    pub maker_owner: String,
    pub maker_class: AgentClass,
    pub true_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_and_filled() {
        let mut order = Order::limit(
            "mm-1".into(),
            "mm".into(),
            AgentClass::Maker,
            Side::Buy,
            99.95,
            100,
            0,
        );
        assert_eq!(order.remaining(), 100);
        assert!(!order.is_filled());
        order.filled = 100;
        assert_eq!(order.remaining(), 0);
        assert!(order.is_filled());
    }

    #[test]
    fn test_market_order_has_zero_price() {
        let order = Order::market("n-1".into(), "noise".into(), AgentClass::Noise, Side::Sell, 3, 0);
        assert_eq!(order.price, 0.0);
        assert_eq!(order.kind, OrderKind::Market);
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_side_serde_snake_case() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"buy\"");
        let class: AgentClass = serde_json::from_str("\"informed\"").unwrap();
        assert_eq!(class, AgentClass::Informed);
    }
}
