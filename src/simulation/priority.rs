//! Congestion tracking for the priority road
//!
//! The tracker keeps the last observed vehicle count for every road and a
//! priority flag that only the designated priority road can ever raise. The
//! flag uses a hysteresis band: it is raised above the high threshold, cleared
//! below the low threshold, and left alone in between.

use log::info;

use super::config::JunctionConfig;
use super::types::Road;

/// Per-road view kept by the tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoadPriority {
    pub vehicle_count: usize,
    pub priority_active: bool,
}

/// Change of priority mode reported by `PriorityTracker::update`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityChange {
    Activated,
    Deactivated,
}

#[derive(Debug, Clone)]
pub struct PriorityTracker {
    priority_road: Road,
    high_threshold: usize,
    low_threshold: usize,
    roads: [RoadPriority; Road::COUNT],
}

impl PriorityTracker {
    pub fn new(priority_road: Road, high_threshold: usize, low_threshold: usize) -> Self {
        Self {
            priority_road,
            high_threshold,
            low_threshold,
            roads: [RoadPriority::default(); Road::COUNT],
        }
    }

    pub fn from_config(config: &JunctionConfig) -> Self {
        Self::new(
            config.priority_road,
            config.high_threshold,
            config.low_threshold,
        )
    }

    pub fn priority_road(&self) -> Road {
        self.priority_road
    }

    /// Record the current count for a road and recompute its priority flag
    ///
    /// Returns the transition if the flag changed.
    pub fn update(&mut self, road: Road, current_count: usize) -> Option<PriorityChange> {
        let entry = &mut self.roads[road.index()];
        entry.vehicle_count = current_count;

        if road != self.priority_road {
            entry.priority_active = false;
            return None;
        }

        if !entry.priority_active && current_count > self.high_threshold {
            entry.priority_active = true;
            info!(
                ">>> PRIORITY MODE ACTIVATED: road {} has {} vehicles",
                road, current_count
            );
            Some(PriorityChange::Activated)
        } else if entry.priority_active && current_count < self.low_threshold {
            entry.priority_active = false;
            info!(
                "<<< PRIORITY MODE DEACTIVATED: road {} has {} vehicles",
                road, current_count
            );
            Some(PriorityChange::Deactivated)
        } else {
            // Sticky band: keep whatever mode we are in
            None
        }
    }

    /// Refresh every road from a full set of queue sizes
    pub fn update_all(&mut self, sizes: &[usize; Road::COUNT]) {
        for road in Road::ALL {
            self.update(road, sizes[road.index()]);
        }
    }

    pub fn is_priority_active(&self, road: Road) -> bool {
        self.roads[road.index()].priority_active
    }

    pub fn vehicle_count(&self, road: Road) -> usize {
        self.roads[road.index()].vehicle_count
    }

    pub fn state(&self, road: Road) -> RoadPriority {
        self.roads[road.index()]
    }

    /// The road to serve next, scanning in the fixed order A, B, C, D
    pub fn next_road(&self, sizes: &[usize; Road::COUNT]) -> Option<Road> {
        self.next_road_from(sizes, Road::A)
    }

    /// Same decision as `next_road`, but the fair scan starts at `start`
    /// and wraps around
    pub fn next_road_from(&self, sizes: &[usize; Road::COUNT], start: Road) -> Option<Road> {
        if self.priority_pending(sizes) {
            return Some(self.priority_road);
        }

        (0..Road::COUNT)
            .map(|offset| Road::ALL[(start.index() + offset) % Road::COUNT])
            .find(|road| sizes[road.index()] > 0)
    }

    /// True when the priority road is congested and has vehicles waiting
    pub fn priority_pending(&self, sizes: &[usize; Road::COUNT]) -> bool {
        self.is_priority_active(self.priority_road) && sizes[self.priority_road.index()] > 0
    }
}
