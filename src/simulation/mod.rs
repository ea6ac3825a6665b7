//! Four-way junction controller
//!
//! This module holds the queue, priority and signal logic of the junction
//! together with the loops that drive it. Rendering is not part of it;
//! displays read state through `Intersection` and `SignalBoard` only.

mod board;
mod config;
mod feed;
mod generator;
mod intersection;
mod priority;
mod road_queue;
mod runtime;
mod signal;
mod stats;
mod types;
mod world;

pub use board::{JunctionSnapshot, SignalBoard};
pub use config::{
    ConfigError, JunctionConfig, CLEARANCE, DEFAULT_QUEUE_CAPACITY, HIGH_THRESHOLD, LOW_THRESHOLD,
    MAX_GREEN, MAX_LANES, MIN_GREEN, MONITORED_LANE, PRIORITY_ROAD, TICK, TIME_PER_VEHICLE,
};
pub use feed::{ingest_line, parse_feed_line, FeedError, FeedTailer, MAX_ID_LEN};
pub use generator::{feed_line, GenerationMode, TrafficGenerator, DEFAULT_PRIORITY_WEIGHT};
pub use intersection::{InitError, Intersection};
pub use priority::{PriorityChange, PriorityTracker, RoadPriority};
pub use road_queue::{QueueError, RoadQueue};
pub use runtime::{Runtime, RuntimeOptions, StopSignal, VehicleSource};
pub use signal::{queue_sizes, GreenPhase, ServiceMode, SignalController, SignalPhase, TickReport};
pub use stats::{JunctionStats, RoadStats};
pub use types::{LightState, Road, SimTime, VehicleId, VehicleRecord};
pub use world::JunctionWorld;
