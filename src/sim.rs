//! Simulation driver.
//!
//! Sequences the per-tick pipeline (maker quoting, taker arrival, matching,
//! latent-value step, maker bookkeeping, snapshot) and owns every piece of
//! mutable state: the RNG stream, the book, the agents, the cumulative
//! trade log, and the run lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::book::{BookSnapshot, OrderBook};
use crate::config::SimConfig;
use crate::errors::ConfigError;
use crate::maker::{MakerStats, MarketMaker};
use crate::price::PriceProcess;
use crate::rng::SimRng;
use crate::traders::{InformedTrader, NoiseTrader};
use crate::types::{AgentClass, Trade};

const MAKER_OWNER: &str = "mm";
const NOISE_OWNER: &str = "noise";
const INFORMED_OWNER: &str = "informed";

/// Per-tick metric vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickMetrics {
    /// Latent value after this tick's price step.
    pub true_value: f64,
    /// Book mid; `None` when a side is empty.
    pub mid: Option<f64>,
    pub spread: Option<f64>,
    pub mm_pnl: f64,
    pub mm_inventory: i64,
    /// Maker's current quoted spread.
    pub mm_spread: f64,
    /// Cumulative trades across the run.
    pub trade_count: u64,
    /// Cumulative trades with an informed taker.
    pub informed_count: u64,
    /// Cumulative maker fills against an informed taker.
    pub adverse_count: u64,
    pub maker: MakerStats,
}

/// What [`Simulation::step`] returns: the executed tick's index, the metric
/// vector, a book view, and the trades produced this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub metrics: TickMetrics,
    pub book: BookSnapshot,
    pub trades: Vec<Trade>,
}

/// Cloneable handle for cooperative cancellation of [`Simulation::run`].
///
/// The run loop polls the flag between ticks; the in-flight tick always
/// completes.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Request termination after the current tick.
    pub fn stop(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// The deterministic tick-driven simulator.
pub struct Simulation {
    config: SimConfig,
    rng: SimRng,
    price: PriceProcess,
    book: OrderBook,
    maker: MarketMaker,
    noise: NoiseTrader,
    informed: InformedTrader,
    tick: u64,
    trades: Vec<Trade>,
    trade_count: u64,
    informed_count: u64,
    adverse_count: u64,
    running: Arc<AtomicBool>,
    last_snapshot: Option<TickSnapshot>,
}

impl Simulation {
    /// Build a simulation, failing fast on invalid configuration.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            seed = config.seed,
            ticks = config.ticks,
            informed_ratio = config.informed_ratio,
            "simulation configured"
        );
        Ok(Self {
            rng: SimRng::new(config.seed),
            price: PriceProcess::new(
                config.initial_price,
                config.volatility,
                config.jump_prob,
                config.jump_size,
            ),
            book: OrderBook::new(config.initial_price),
            maker: MarketMaker::new(
                MAKER_OWNER,
                config.mm_base_spread,
                config.mm_size,
                config.mm_adapt_rate,
                config.inventory_skew_factor,
            ),
            noise: NoiseTrader::new(NOISE_OWNER),
            informed: InformedTrader::new(INFORMED_OWNER, config.edge_threshold),
            tick: 0,
            trades: Vec::new(),
            trade_count: 0,
            informed_count: 0,
            adverse_count: 0,
            running: Arc::new(AtomicBool::new(true)),
            last_snapshot: None,
            config,
        })
    }

    /// Rebuild all state from the stored configuration. Sequence counters
    /// restart with everything else, so a reset run reproduces the original
    /// exactly.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone()).expect("config validated at construction");
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Execute one tick.
    ///
    /// Fixed order: (1) maker re-quotes, (2) taker class draw, (3) taker
    /// generation and matching, (4) latent-value step, (5) maker
    /// bookkeeping over this tick's trades, (6) snapshot. The class draw in
    /// step 2 is consumed even when no order follows, keeping the RNG
    /// stream aligned across configurations.
    pub fn step(&mut self) -> TickSnapshot {
        let ts = self.tick * self.config.tick_ms;
        let mut trades = Vec::new();

        // The reference mid is read while the maker's stale quotes still
        // rest: the maker never observes the latent value after cold start
        // and tracks it only through inventory skew.
        let reference = self.book.mid().unwrap_or_else(|| self.book.true_value());
        self.book.cancel_all(MAKER_OWNER);
        let (bid, ask) = self.maker.quotes(reference, ts);
        trades.extend(self.book.submit(bid));
        trades.extend(self.book.submit(ask));

        let taker = if self.rng.chance(self.config.informed_ratio) {
            let taker_reference = self.book.mid().unwrap_or_else(|| self.book.true_value());
            self.informed.generate(
                &mut self.rng,
                self.config.arrival_rate,
                self.book.true_value(),
                taker_reference,
                ts,
            )
        } else {
            self.noise.generate(&mut self.rng, self.config.arrival_rate, ts)
        };
        if let Some(order) = taker {
            trades.extend(self.book.submit(order));
        }

        // Trades above captured the pre-step value; mark-to-market below
        // uses the post-step value.
        let step = self.price.step(&mut self.rng);
        self.book.set_true_value(step.value);

        for trade in &trades {
            self.maker.on_trade(trade, step.value);
            self.trade_count += 1;
            if trade.taker_class == AgentClass::Informed {
                self.informed_count += 1;
                if trade.maker_owner == MAKER_OWNER {
                    self.adverse_count += 1;
                }
            }
        }
        self.trades.extend(trades.iter().cloned());

        debug!(
            tick = self.tick,
            trades = trades.len(),
            value = step.value,
            inventory = self.maker.inventory(),
            "tick complete"
        );

        let snapshot = TickSnapshot {
            tick: self.tick,
            metrics: self.metrics(),
            book: self.book.snapshot(ts),
            trades,
        };
        self.tick += 1;
        self.last_snapshot = Some(snapshot.clone());
        snapshot
    }

    fn metrics(&self) -> TickMetrics {
        TickMetrics {
            true_value: self.book.true_value(),
            mid: self.book.mid(),
            spread: self.book.spread(),
            mm_pnl: self.maker.pnl(),
            mm_inventory: self.maker.inventory(),
            mm_spread: self.maker.quoted_spread(),
            trade_count: self.trade_count,
            informed_count: self.informed_count,
            adverse_count: self.adverse_count,
            maker: self.maker.stats(),
        }
    }

    /// Iterate up to `config.ticks`, invoking `on_tick` with each snapshot.
    ///
    /// With `realtime` set, sleeps `tick_ms` between ticks. Terminates
    /// early when [`Simulation::stop`] or a [`StopHandle`] fires; the
    /// in-flight tick always completes.
    pub fn run<F>(&mut self, realtime: bool, mut on_tick: F)
    where
        F: FnMut(&TickSnapshot),
    {
        self.running.store(true, Ordering::Relaxed);
        while self.tick < self.config.ticks && self.running.load(Ordering::Relaxed) {
            let snapshot = self.step();
            on_tick(&snapshot);
            if realtime && self.tick < self.config.ticks && self.running.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(self.config.tick_ms));
            }
        }
        info!(
            ticks = self.tick,
            trades = self.trade_count,
            pnl = self.maker.pnl(),
            "run finished"
        );
    }

    /// Request termination after the current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Handle for stopping a run from a callback or another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.running))
    }

    /// Cumulative trade log, emission order.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Latest snapshot without advancing; `None` before the first step.
    pub fn current_state(&self) -> Option<&TickSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Index of the next tick to execute.
    pub fn tick(&self) -> u64 {
        self.tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_validates_config() {
        let bad = SimConfig {
            arrival_rate: -0.1,
            ..Default::default()
        };
        assert!(Simulation::new(bad).is_err());
        assert!(Simulation::new(SimConfig::default()).is_ok());
    }

    #[test]
    fn test_current_state_tracks_last_step() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        assert!(sim.current_state().is_none());
        let snapshot = sim.step();
        assert_eq!(sim.current_state(), Some(&snapshot));
        assert_eq!(sim.tick(), 1);
    }

    #[test]
    fn test_trades_accumulate_across_ticks() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let mut per_tick_total = 0;
        for _ in 0..50 {
            per_tick_total += sim.step().trades.len();
        }
        assert_eq!(sim.trades().len(), per_tick_total);
        assert_eq!(sim.trades().len() as u64, sim.current_state().unwrap().metrics.trade_count);
    }

    #[test]
    fn test_run_stops_at_configured_ticks() {
        let config = SimConfig {
            ticks: 25,
            ..Default::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        let mut seen = 0;
        sim.run(false, |_| seen += 1);
        assert_eq!(seen, 25);
        assert_eq!(sim.tick(), 25);
        // A second run has no ticks left.
        sim.run(false, |_| seen += 1);
        assert_eq!(seen, 25);
    }

    #[test]
    fn test_stop_from_callback_completes_tick() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let handle = sim.stop_handle();
        let mut seen = 0u64;
        sim.run(false, |snapshot| {
            seen += 1;
            if snapshot.tick == 9 {
                handle.stop();
            }
        });
        assert_eq!(seen, 10);
        assert_eq!(sim.tick(), 10);
    }

    #[test]
    fn test_timestamps_advance_by_tick_ms() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let first = sim.step();
        let second = sim.step();
        assert_eq!(first.book.ts, 0);
        assert_eq!(second.book.ts, 100);
    }
}
