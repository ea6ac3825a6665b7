//! Thread-safe FIFO of waiting vehicles, one per road
//!
//! Every operation takes the queue's own lock for the duration of the call
//! only, so ingestion, scheduling and presentation can share a queue freely.

use parking_lot::Mutex;
use std::collections::VecDeque;
use thiserror::Error;

use super::types::{Road, VehicleRecord};

/// Non-fatal queue conditions, handled by the caller
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("road {road} queue is full ({capacity} vehicles)")]
    Full { road: Road, capacity: usize },

    #[error("road {road} queue is empty")]
    Empty { road: Road },
}

/// FIFO of vehicles waiting on one road
#[derive(Debug)]
pub struct RoadQueue {
    road: Road,
    /// Maximum number of waiting vehicles, 0 for unbounded
    capacity: usize,
    items: Mutex<VecDeque<VehicleRecord>>,
}

impl RoadQueue {
    pub fn new(road: Road, capacity: usize) -> Self {
        let items = if capacity == 0 {
            VecDeque::new()
        } else {
            VecDeque::with_capacity(capacity)
        };
        Self {
            road,
            capacity,
            items: Mutex::new(items),
        }
    }

    pub fn unbounded(road: Road) -> Self {
        Self::new(road, 0)
    }

    pub fn road(&self) -> Road {
        self.road
    }

    pub fn capacity(&self) -> Option<usize> {
        (self.capacity > 0).then_some(self.capacity)
    }

    /// Append a vehicle to the back of the queue
    ///
    /// On a full bounded queue the record is dropped and the queue is left
    /// untouched.
    pub fn enqueue(&self, record: VehicleRecord) -> Result<(), QueueError> {
        let mut items = self.items.lock();
        if self.capacity > 0 && items.len() >= self.capacity {
            return Err(QueueError::Full {
                road: self.road,
                capacity: self.capacity,
            });
        }
        items.push_back(record);
        Ok(())
    }

    /// Remove the oldest waiting vehicle
    pub fn dequeue(&self) -> Result<VehicleRecord, QueueError> {
        self.items
            .lock()
            .pop_front()
            .ok_or(QueueError::Empty { road: self.road })
    }

    /// Remove the oldest vehicle and report how many remain, atomically
    pub fn dequeue_with_remaining(&self) -> Result<(VehicleRecord, usize), QueueError> {
        let mut items = self.items.lock();
        let record = items.pop_front().ok_or(QueueError::Empty { road: self.road })?;
        Ok((record, items.len()))
    }

    /// A copy of the oldest waiting vehicle, if any
    pub fn peek(&self) -> Result<VehicleRecord, QueueError> {
        self.items
            .lock()
            .front()
            .cloned()
            .ok_or(QueueError::Empty { road: self.road })
    }

    pub fn size(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Remove every waiting vehicle, oldest first
    pub fn drain(&self) -> Vec<VehicleRecord> {
        self.items.lock().drain(..).collect()
    }
}
