//! Simulation configuration.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::traders::DEFAULT_EDGE_THRESHOLD;

/// Full configuration for one run.
///
/// Fields are fixed for the run's duration; reconfiguration is modelled as
/// a reset with a new config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed; truncated to its low 32 bits.
    pub seed: u64,
    pub initial_price: f64,
    /// Per-step diffusion standard deviation.
    pub volatility: f64,
    /// Probability of the jump component firing per step.
    pub jump_prob: f64,
    /// Relative jump magnitude, applied with a fair-coin sign.
    pub jump_size: f64,
    /// Maker base (and initial) quoted spread.
    pub mm_base_spread: f64,
    /// Maker quote size per side.
    pub mm_size: u64,
    /// Spread adaptation rate per maker fill.
    pub mm_adapt_rate: f64,
    /// Quote shift per unit of signed inventory.
    pub inventory_skew_factor: f64,
    /// Probability a generated taker is informed.
    pub informed_ratio: f64,
    /// Probability a taker order is generated per tick.
    pub arrival_rate: f64,
    /// Minimum relative edge before the informed taker participates.
    pub edge_threshold: f64,
    /// Simulated milliseconds per tick.
    pub tick_ms: u64,
    /// Total ticks for `run`.
    pub ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            initial_price: 100.0,
            volatility: 0.001,
            jump_prob: 0.02,
            jump_size: 0.01,
            mm_base_spread: 0.10,
            mm_size: 100,
            mm_adapt_rate: 0.1,
            inventory_skew_factor: 0.0005,
            informed_ratio: 0.2,
            arrival_rate: 0.3,
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            tick_ms: 100,
            ticks: 1000,
        }
    }
}

impl SimConfig {
    /// Check construction preconditions. Violations are programmer errors;
    /// the simulation refuses to start rather than run with them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_price > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "initial_price",
                value: self.initial_price,
            });
        }
        if !(self.mm_base_spread > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "mm_base_spread",
                value: self.mm_base_spread,
            });
        }
        if self.mm_size == 0 {
            return Err(ConfigError::ZeroMakerSize);
        }
        for (field, value) in [
            ("jump_prob", self.jump_prob),
            ("informed_ratio", self.informed_ratio),
            ("arrival_rate", self.arrival_rate),
            ("mm_adapt_rate", self.mm_adapt_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { field, value });
            }
        }
        for (field, value) in [
            ("volatility", self.volatility),
            ("jump_size", self.jump_size),
            ("inventory_skew_factor", self.inventory_skew_factor),
            ("edge_threshold", self.edge_threshold),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }
}
