//! Read-only signal view for display
//!
//! The scheduling loop is the only writer. Readers get an eventually
//! consistent picture without taking any lock.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use super::types::{LightState, Road, SimTime};

const NO_GREEN: u8 = 0;

#[derive(Debug, Default)]
pub struct SignalBoard {
    /// 0 when all red, otherwise road index + 1
    current_green: AtomicU8,
    priority: [AtomicBool; Road::COUNT],
    green_start: AtomicU64,
    green_duration: AtomicU64,
    now: AtomicU64,
}

impl SignalBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_green(&self) -> Option<Road> {
        match self.current_green.load(Ordering::Acquire) {
            NO_GREEN => None,
            encoded => Road::from_index(usize::from(encoded) - 1),
        }
    }

    pub fn light(&self, road: Road) -> LightState {
        if self.current_green() == Some(road) {
            LightState::Green
        } else {
            LightState::Red
        }
    }

    pub fn is_priority_active(&self, road: Road) -> bool {
        self.priority[road.index()].load(Ordering::Acquire)
    }

    pub fn green_start(&self) -> SimTime {
        self.green_start.load(Ordering::Acquire)
    }

    pub fn green_duration(&self) -> u64 {
        self.green_duration.load(Ordering::Acquire)
    }

    /// Current simulated time as last published by the scheduler
    pub fn now(&self) -> SimTime {
        self.now.load(Ordering::Acquire)
    }

    pub(crate) fn publish_green(&self, green: Option<Road>, start: SimTime, duration: u64) {
        // Timing first so a reader that sees the new road also sees its phase
        self.green_start.store(start, Ordering::Release);
        self.green_duration.store(duration, Ordering::Release);
        let encoded = green.map_or(NO_GREEN, |road| road.index() as u8 + 1);
        self.current_green.store(encoded, Ordering::Release);
    }

    pub(crate) fn publish_priority(&self, road: Road, active: bool) {
        self.priority[road.index()].store(active, Ordering::Release);
    }

    pub(crate) fn publish_now(&self, now: SimTime) {
        self.now.store(now, Ordering::Release);
    }
}

/// Point-in-time view of a whole junction for the presentation loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionSnapshot {
    pub now: SimTime,
    pub queue_sizes: [usize; Road::COUNT],
    pub current_green: Option<Road>,
    pub priority_active: [bool; Road::COUNT],
}

impl JunctionSnapshot {
    pub fn total_waiting(&self) -> usize {
        self.queue_sizes.iter().sum()
    }
}

impl fmt::Display for JunctionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:>5}s |", self.now)?;
        for road in Road::ALL {
            let light = if self.current_green == Some(road) { 'G' } else { 'R' };
            write!(f, " {}:{:>3} [{}]", road, self.queue_sizes[road.index()], light)?;
        }
        if self.priority_active.iter().any(|active| *active) {
            write!(f, " | PRIORITY MODE")?;
        }
        Ok(())
    }
}
