//! Single-threaded junction driver
//!
//! Runs arrivals and signal decisions on one simulated clock without any
//! threads or sleeping, so a run is fully reproducible from its seed.

use log::warn;

use super::board::JunctionSnapshot;
use super::config::JunctionConfig;
use super::generator::TrafficGenerator;
use super::intersection::{InitError, Intersection};
use super::road_queue::QueueError;
use super::signal::{SignalController, TickReport};
use super::stats::JunctionStats;
use super::types::{SimTime, VehicleRecord};

pub struct JunctionWorld {
    intersection: Intersection,
    controller: SignalController,
    /// Optional arrival source; without one vehicles are added by hand
    generator: Option<TrafficGenerator>,
    stats: JunctionStats,
    now: SimTime,
}

impl JunctionWorld {
    pub fn new(config: JunctionConfig) -> Result<Self, InitError> {
        let intersection = Intersection::new(config)?;
        let controller = intersection.attach_controller()?;
        Ok(Self {
            intersection,
            controller,
            generator: None,
            stats: JunctionStats::default(),
            now: 0,
        })
    }

    pub fn with_generator(config: JunctionConfig, generator: TrafficGenerator) -> Result<Self, InitError> {
        let mut world = Self::new(config)?;
        world.generator = Some(generator);
        Ok(world)
    }

    pub fn intersection(&self) -> &Intersection {
        &self.intersection
    }

    pub fn controller(&self) -> &SignalController {
        &self.controller
    }

    pub fn stats(&self) -> &JunctionStats {
        &self.stats
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Queue a vehicle arriving now
    pub fn add_vehicle(&mut self, record: VehicleRecord) -> Result<(), QueueError> {
        let road = record.road();
        self.stats.record_arrival(road);
        let result = self.intersection.enqueue(record);
        if let Err(QueueError::Full { .. }) = &result {
            self.stats.record_rejected(road);
        }
        result
    }

    /// Main simulation tick: arrivals first, then one signal decision
    pub fn tick(&mut self) -> TickReport {
        let arrivals = match &mut self.generator {
            Some(generator) => generator.tick(self.now),
            None => Vec::new(),
        };
        for record in arrivals {
            let id = record.id().clone();
            if let Err(e) = self.add_vehicle(record) {
                warn!("Dropping vehicle {}: {}", id, e);
            }
        }

        let report = self.controller.tick(self.now, self.intersection.queues());
        self.stats.record_tick(&report);
        self.now += self.intersection.config().tick;
        report
    }

    /// Run `ticks` ticks and return how many vehicles were served
    pub fn run(&mut self, ticks: u64) -> usize {
        (0..ticks).map(|_| self.tick().served.len()).sum()
    }

    pub fn snapshot(&self) -> JunctionSnapshot {
        self.intersection.snapshot()
    }

    pub fn log_summary(&self) {
        let waiting = self.snapshot().total_waiting();
        self.stats.log_summary(waiting);
    }
}
