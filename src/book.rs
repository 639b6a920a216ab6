//! Price-time-priority limit order book.
//!
//! Bids and asks map integer-cent price levels to FIFO queues of resting
//! limit orders. Matching walks opposite levels best-price-first and each
//! level front-to-back; trades always execute at the resting order's price.
//! Empty levels are removed eagerly, and every resting order is reachable
//! from exactly one queue and from the id index.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Order, OrderKind, Side, Trade};

/// Number of levels per side included in a snapshot.
pub const SNAPSHOT_DEPTH: usize = 5;

/// Price resolution: one tick = one cent.
const TICKS_PER_UNIT: f64 = 100.0;

fn to_ticks(price: f64) -> i64 {
    (price * TICKS_PER_UNIT).round() as i64
}

fn from_ticks(ticks: i64) -> f64 {
    ticks as f64 / TICKS_PER_UNIT
}

/// Aggregated view of one price level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    /// Total remaining quantity across resting orders at this price.
    pub qty: u64,
    /// The resting orders, queue order (earliest first).
    pub orders: Vec<Order>,
}

/// Point-in-time view of the book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub ts: u64,
    /// Bid levels, best (highest price) first.
    pub bids: Vec<BookLevel>,
    /// Ask levels, best (lowest price) first.
    pub asks: Vec<BookLevel>,
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
}

/// Location of a resting order, for cancellation by id or owner.
#[derive(Debug, Clone)]
struct OrderLoc {
    side: Side,
    ticks: i64,
    owner: String,
}

/// The order book.
///
/// Holds the latent true value so that emitted trades capture the
/// contemporaneous value; the simulation updates it after each price step.
#[derive(Debug)]
pub struct OrderBook {
    bids: BTreeMap<i64, VecDeque<Order>>,
    asks: BTreeMap<i64, VecDeque<Order>>,
    index: HashMap<String, OrderLoc>,
    true_value: f64,
    trade_seq: u64,
}

impl OrderBook {
    pub fn new(true_value: f64) -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
            true_value,
            trade_seq: 0,
        }
    }

    /// Latent value stamped onto trades.
    pub fn true_value(&self) -> f64 {
        self.true_value
    }

    pub fn set_true_value(&mut self, value: f64) {
        self.true_value = value;
    }

    /// Submit an order and match it against resting liquidity.
    ///
    /// Returns the trades produced, in execution order. A limit order with
    /// residual quantity rests at its price level; market residue is
    /// discarded. Trade timestamps are the taker's submission timestamp.
    pub fn submit(&mut self, mut taker: Order) -> Vec<Trade> {
        let mut trades = Vec::new();
        let taker_ticks = to_ticks(taker.price);

        // Opposite prices in match order: ascending for a buy, descending
        // for a sell.
        let candidates: Vec<i64> = match taker.side {
            Side::Buy => self.asks.keys().copied().collect(),
            Side::Sell => self.bids.keys().rev().copied().collect(),
        };

        for ticks in candidates {
            if taker.is_filled() {
                break;
            }
            if taker.kind == OrderKind::Limit {
                let marketable = match taker.side {
                    Side::Buy => ticks <= taker_ticks,
                    Side::Sell => ticks >= taker_ticks,
                };
                if !marketable {
                    break;
                }
            }
            let opposite = match taker.side {
                Side::Buy => &mut self.asks,
                Side::Sell => &mut self.bids,
            };
            let Some(queue) = opposite.get_mut(&ticks) else {
                continue;
            };
            while let Some(maker) = queue.front_mut() {
                if taker.is_filled() {
                    break;
                }
                let fill = maker.remaining().min(taker.remaining());
                self.trade_seq += 1;
                debug!(
                    trade = self.trade_seq,
                    price = from_ticks(ticks),
                    qty = fill,
                    taker = %taker.id,
                    maker = %maker.id,
                    "fill"
                );
                trades.push(Trade {
                    id: self.trade_seq,
                    ts: taker.ts,
                    price: from_ticks(ticks),
                    qty: fill,
                    taker_order: taker.id.clone(),
                    taker_owner: taker.owner.clone(),
                    taker_side: taker.side,
                    taker_class: taker.owner_class,
                    maker_order: maker.id.clone(),
                    maker_owner: maker.owner.clone(),
                    maker_class: maker.owner_class,
                    true_value: self.true_value,
                });
                maker.filled += fill;
                taker.filled += fill;
                if maker.is_filled() {
                    let done = queue.pop_front().expect("filled maker at queue front");
                    self.index.remove(&done.id);
                }
            }
            if queue.is_empty() {
                opposite.remove(&ticks);
            }
        }

        if taker.kind == OrderKind::Limit && !taker.is_filled() {
            self.index.insert(
                taker.id.clone(),
                OrderLoc {
                    side: taker.side,
                    ticks: taker_ticks,
                    owner: taker.owner.clone(),
                },
            );
            let book = match taker.side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            book.entry(taker_ticks).or_default().push_back(taker);
        }

        trades
    }

    /// Cancel a resting order by id. Unknown ids are a no-op.
    pub fn cancel(&mut self, id: &str) -> bool {
        let Some(loc) = self.index.remove(id) else {
            return false;
        };
        let book = match loc.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let Some(queue) = book.get_mut(&loc.ticks) else {
            return false;
        };
        let before = queue.len();
        queue.retain(|order| order.id != id);
        let removed = queue.len() < before;
        if queue.is_empty() {
            book.remove(&loc.ticks);
        }
        removed
    }

    /// Cancel every resting order owned by `owner`. Returns the count.
    pub fn cancel_all(&mut self, owner: &str) -> usize {
        let ids: Vec<String> = self
            .index
            .iter()
            .filter(|(_, loc)| loc.owner == owner)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &ids {
            self.cancel(id);
        }
        ids.len()
    }

    /// Look up a resting order by id.
    pub fn order(&self, id: &str) -> Option<&Order> {
        let loc = self.index.get(id)?;
        let book = match loc.side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        book.get(&loc.ticks)?.iter().find(|order| order.id == id)
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids.keys().next_back().map(|&ticks| from_ticks(ticks))
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.keys().next().map(|&ticks| from_ticks(ticks))
    }

    /// Mean of best bid and best ask; `None` unless both sides are present.
    pub fn mid(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / 2.0),
            _ => None,
        }
    }

    pub fn spread(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Top levels per side with aggregated remaining quantity: bids
    /// descending, asks ascending, at most [`SNAPSHOT_DEPTH`] each.
    pub fn levels(&self) -> (Vec<BookLevel>, Vec<BookLevel>) {
        (
            collect_levels(self.bids.iter().rev()),
            collect_levels(self.asks.iter()),
        )
    }

    pub fn snapshot(&self, ts: u64) -> BookSnapshot {
        let (bids, asks) = self.levels();
        BookSnapshot {
            ts,
            bids,
            asks,
            best_bid: self.best_bid(),
            best_ask: self.best_ask(),
        }
    }
}

fn collect_levels<'a, I>(levels: I) -> Vec<BookLevel>
where
    I: Iterator<Item = (&'a i64, &'a VecDeque<Order>)>,
{
    levels
        .take(SNAPSHOT_DEPTH)
        .map(|(&ticks, queue)| BookLevel {
            price: from_ticks(ticks),
            qty: queue.iter().map(Order::remaining).sum(),
            orders: queue.iter().cloned().collect(),
        })
        .collect()
}
