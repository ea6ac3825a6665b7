//! Timing and threshold configuration for a junction
//!
//! The defaults below are the values the controller is tuned for. Every
//! value can be overridden, but `validate` must accept the result before a
//! junction is built from it.

use thiserror::Error;

use super::types::Road;

/// Enter priority mode when the priority road holds more than this many vehicles
pub const HIGH_THRESHOLD: usize = 7;

/// Leave priority mode once the priority road holds fewer than this many vehicles
pub const LOW_THRESHOLD: usize = 5;

/// Simulated seconds of green needed to clear one vehicle
pub const TIME_PER_VEHICLE: u64 = 2;

/// Shortest green phase in simulated seconds
pub const MIN_GREEN: u64 = 2;

/// Longest green phase in simulated seconds
pub const MAX_GREEN: u64 = 20;

/// All-red period between two green phases
pub const CLEARANCE: u64 = 1;

/// Simulated seconds between two scheduling decisions
pub const TICK: u64 = 1;

/// Per-road queue capacity (0 means unbounded)
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Road subject to congestion-triggered priority
pub const PRIORITY_ROAD: Road = Road::A;

/// Lane of the priority road that is monitored ("AL2")
pub const MONITORED_LANE: u8 = 2;

/// Highest lane number accepted on any road
pub const MAX_LANES: u8 = 3;

/// Startup failure: the junction cannot be built from this configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("low threshold {low} must be strictly below high threshold {high}")]
    Thresholds { low: usize, high: usize },

    #[error("minimum green {min}s exceeds maximum green {max}s")]
    GreenBounds { min: u64, max: u64 },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// All tunables of one junction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionConfig {
    pub high_threshold: usize,
    pub low_threshold: usize,
    pub time_per_vehicle: u64,
    pub min_green: u64,
    pub max_green: u64,
    pub clearance: u64,
    pub tick: u64,
    pub queue_capacity: usize,
    pub priority_road: Road,
    pub monitored_lane: u8,
}

impl Default for JunctionConfig {
    fn default() -> Self {
        Self {
            high_threshold: HIGH_THRESHOLD,
            low_threshold: LOW_THRESHOLD,
            time_per_vehicle: TIME_PER_VEHICLE,
            min_green: MIN_GREEN,
            max_green: MAX_GREEN,
            clearance: CLEARANCE,
            tick: TICK,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            priority_road: PRIORITY_ROAD,
            monitored_lane: MONITORED_LANE,
        }
    }
}

impl JunctionConfig {
    /// Check the invariants the controller relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.low_threshold >= self.high_threshold {
            return Err(ConfigError::Thresholds {
                low: self.low_threshold,
                high: self.high_threshold,
            });
        }
        if self.min_green > self.max_green {
            return Err(ConfigError::GreenBounds {
                min: self.min_green,
                max: self.max_green,
            });
        }
        if self.time_per_vehicle == 0 {
            return Err(ConfigError::Zero("time per vehicle"));
        }
        if self.tick == 0 {
            return Err(ConfigError::Zero("tick"));
        }
        if self.min_green == 0 {
            return Err(ConfigError::Zero("minimum green"));
        }
        Ok(())
    }

    /// Clamp a green duration into `[min_green, max_green]`
    pub fn clamp_green(&self, secs: u64) -> u64 {
        secs.clamp(self.min_green, self.max_green)
    }
}
