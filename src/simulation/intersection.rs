//! The junction context shared between threads
//!
//! An `Intersection` owns the four road queues and the published signal
//! board. It holds no global state, so any number of junctions can live in
//! one process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use super::board::{JunctionSnapshot, SignalBoard};
use super::config::{ConfigError, JunctionConfig};
use super::road_queue::{QueueError, RoadQueue};
use super::signal::{queue_sizes, SignalController};
use super::types::{LightState, Road, VehicleRecord};

/// Startup failure; nothing has been spawned when this is returned
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InitError {
    #[error("invalid junction configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("a signal controller is already attached to this junction")]
    ControllerAttached,
}

#[derive(Debug)]
pub struct Intersection {
    config: JunctionConfig,
    queues: [RoadQueue; Road::COUNT],
    board: Arc<SignalBoard>,
    controller_attached: AtomicBool,
}

impl Intersection {
    pub fn new(config: JunctionConfig) -> Result<Self, InitError> {
        config.validate()?;
        let queues = Road::ALL.map(|road| RoadQueue::new(road, config.queue_capacity));
        Ok(Self {
            config,
            queues,
            board: Arc::new(SignalBoard::new()),
            controller_attached: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &JunctionConfig {
        &self.config
    }

    pub fn queue(&self, road: Road) -> &RoadQueue {
        &self.queues[road.index()]
    }

    pub fn queues(&self) -> &[RoadQueue; Road::COUNT] {
        &self.queues
    }

    pub fn board(&self) -> &Arc<SignalBoard> {
        &self.board
    }

    /// Create the one controller allowed to drive this junction
    pub fn attach_controller(&self) -> Result<SignalController, InitError> {
        if self.controller_attached.swap(true, Ordering::AcqRel) {
            return Err(InitError::ControllerAttached);
        }
        Ok(SignalController::with_board(
            self.config.clone(),
            Arc::clone(&self.board),
        ))
    }

    /// Route a vehicle to its road's queue
    pub fn enqueue(&self, record: VehicleRecord) -> Result<(), QueueError> {
        self.queue(record.road()).enqueue(record)
    }

    /// Create a vehicle stamped with the current simulated time and queue it
    pub fn arrive(&self, id: &str, road: Road, lane: Option<u8>) -> Result<(), QueueError> {
        let record = VehicleRecord::new(id, road, lane, self.board.now());
        self.enqueue(record)
    }

    pub fn queue_sizes(&self) -> [usize; Road::COUNT] {
        queue_sizes(&self.queues)
    }

    pub fn current_green(&self) -> Option<Road> {
        self.board.current_green()
    }

    pub fn light(&self, road: Road) -> LightState {
        self.board.light(road)
    }

    pub fn is_priority_active(&self, road: Road) -> bool {
        self.board.is_priority_active(road)
    }

    pub fn snapshot(&self) -> JunctionSnapshot {
        JunctionSnapshot {
            now: self.board.now(),
            queue_sizes: self.queue_sizes(),
            current_green: self.board.current_green(),
            priority_active: Road::ALL.map(|road| self.board.is_priority_active(road)),
        }
    }
}
