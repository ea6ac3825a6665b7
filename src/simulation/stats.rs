//! Run statistics for a junction
//!
//! Ingestion and scheduling each keep their own `JunctionStats` and the two
//! are merged when the run ends, so no counter is shared between threads.

use log::info;

use super::signal::{ServiceMode, TickReport};
use super::types::{Road, SimTime};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoadStats {
    pub arrived: usize,
    /// Vehicles dropped because the road's queue was full
    pub rejected: usize,
    pub served: usize,
    pub total_wait: SimTime,
    pub max_wait: SimTime,
}

impl RoadStats {
    pub fn average_wait(&self) -> f64 {
        if self.served == 0 {
            0.0
        } else {
            self.total_wait as f64 / self.served as f64
        }
    }

    fn merge(&mut self, other: &RoadStats) {
        self.arrived += other.arrived;
        self.rejected += other.rejected;
        self.served += other.served;
        self.total_wait += other.total_wait;
        self.max_wait = self.max_wait.max(other.max_wait);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JunctionStats {
    pub roads: [RoadStats; Road::COUNT],
    pub ticks: u64,
    pub green_phases: usize,
    pub priority_phases: usize,
    pub malformed_lines: usize,
    /// Simulated seconds covered by the run
    pub elapsed: SimTime,
}

impl JunctionStats {
    pub fn road(&self, road: Road) -> &RoadStats {
        &self.roads[road.index()]
    }

    pub fn record_arrival(&mut self, road: Road) {
        self.roads[road.index()].arrived += 1;
    }

    pub fn record_rejected(&mut self, road: Road) {
        self.roads[road.index()].rejected += 1;
    }

    pub fn record_malformed(&mut self) {
        self.malformed_lines += 1;
    }

    /// Account for everything the controller did in one tick
    pub fn record_tick(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.elapsed = self.elapsed.max(report.now);

        if let Some(green) = report.started {
            self.green_phases += 1;
            if green.mode == ServiceMode::Priority {
                self.priority_phases += 1;
            }
        }

        for record in &report.served {
            let wait = record.wait_until(report.now);
            let road = &mut self.roads[record.road().index()];
            road.served += 1;
            road.total_wait += wait;
            road.max_wait = road.max_wait.max(wait);
        }
    }

    pub fn merge(&mut self, other: &JunctionStats) {
        for (mine, theirs) in self.roads.iter_mut().zip(other.roads.iter()) {
            mine.merge(theirs);
        }
        self.ticks += other.ticks;
        self.green_phases += other.green_phases;
        self.priority_phases += other.priority_phases;
        self.malformed_lines += other.malformed_lines;
        self.elapsed = self.elapsed.max(other.elapsed);
    }

    pub fn total_arrived(&self) -> usize {
        self.roads.iter().map(|r| r.arrived).sum()
    }

    pub fn total_served(&self) -> usize {
        self.roads.iter().map(|r| r.served).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.roads.iter().map(|r| r.rejected).sum()
    }

    /// Percentage of accepted vehicles that have been served
    pub fn service_rate(&self) -> f64 {
        let accepted = self.total_arrived().saturating_sub(self.total_rejected());
        if accepted == 0 {
            0.0
        } else {
            self.total_served() as f64 / accepted as f64 * 100.0
        }
    }

    /// Log the end-of-run report
    pub fn log_summary(&self, still_waiting: usize) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Elapsed time: {}s", self.elapsed);
        info!("Ticks: {}", self.ticks);
        info!("Total vehicles arrived: {}", self.total_arrived());
        info!("Total vehicles served: {}", self.total_served());
        info!("Rejected (queue full): {}", self.total_rejected());
        info!("Malformed feed lines: {}", self.malformed_lines);
        info!("Still waiting: {}", still_waiting);
        info!(
            "Green phases: {} ({} priority)",
            self.green_phases, self.priority_phases
        );
        for road in Road::ALL {
            let stats = self.road(road);
            info!(
                "Road {}: arrived={}, served={}, avg wait={:.1}s, max wait={}s",
                road,
                stats.arrived,
                stats.served,
                stats.average_wait(),
                stats.max_wait
            );
        }
        info!("Service rate: {:.1}%", self.service_rate());
    }
}
