//! Deterministic adverse-selection market simulator.
//!
//! A single-threaded tick engine: one adaptive market maker quotes a
//! price-time-priority limit order book against noise and informed taker
//! flow while a latent jump-diffusion "true value" drives informed
//! decisions and mark-to-market accounting. Given the same configuration
//! and seed, two runs produce identical trade and metric streams.
//!
//! The crate exposes only an in-process API: construct a [`Simulation`],
//! drive it with [`Simulation::step`] or [`Simulation::run`], and read
//! [`TickSnapshot`]s. Presentation, persistence, and transport are the
//! embedder's business.

#![deny(unreachable_pub)]

mod book;
mod config;
mod errors;
mod logging;
mod maker;
mod price;
mod rng;
mod sim;
mod traders;
mod types;

#[cfg(test)]
mod tests;

pub use book::{BookLevel, BookSnapshot, OrderBook, SNAPSHOT_DEPTH};
pub use config::SimConfig;
pub use errors::ConfigError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use maker::{MakerStats, MarketMaker, ADVERSE_WINDOW};
pub use price::{PriceProcess, PriceStep, MIN_PRICE};
pub use rng::SimRng;
pub use sim::{Simulation, StopHandle, TickMetrics, TickSnapshot};
pub use traders::{InformedTrader, NoiseTrader, DEFAULT_EDGE_THRESHOLD};
pub use types::{AgentClass, Order, OrderKind, Side, Trade};
