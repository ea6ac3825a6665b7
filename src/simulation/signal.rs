//! Signal controller for the four-way junction
//!
//! The controller is a two-state machine, `AllRed` and `Serving(road)`,
//! advanced once per scheduling tick. Each tick it refreshes the priority
//! tracker from the queues, picks the next road when the clearance interval
//! is over, and drains the served road at a fixed per-vehicle rate.
//!
//! Only the scheduling loop owns a controller, so it is the only writer of
//! the published `SignalBoard`.

use log::{debug, info};
use std::sync::Arc;

use super::board::SignalBoard;
use super::config::JunctionConfig;
use super::priority::{PriorityChange, PriorityTracker};
use super::road_queue::RoadQueue;
use super::types::{LightState, Road, SimTime, VehicleRecord};

/// Why a road was given green
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    /// Congestion override on the priority road
    Priority,
    /// Round-robin service with an average-based duration
    Fair,
}

/// One green phase, from selection until the road goes back to red
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreenPhase {
    pub road: Road,
    pub mode: ServiceMode,
    pub start: SimTime,
    pub duration: u64,
    /// Vehicles released during this phase so far
    pub served: usize,
    next_service_at: SimTime,
}

impl GreenPhase {
    fn new(road: Road, mode: ServiceMode, start: SimTime, duration: u64) -> Self {
        Self {
            road,
            mode,
            start,
            duration,
            served: 0,
            next_service_at: start,
        }
    }

    pub fn end(&self) -> SimTime {
        self.start + self.duration
    }
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalPhase {
    /// Every light red; no road is selected before `until`
    AllRed { until: SimTime },
    Serving(GreenPhase),
}

/// Everything that happened during one tick
#[derive(Debug, Default)]
pub struct TickReport {
    pub now: SimTime,
    pub started: Option<GreenPhase>,
    pub ended: Option<GreenPhase>,
    /// Vehicles released this tick, oldest first
    pub served: Vec<VehicleRecord>,
    pub priority_changes: Vec<(Road, PriorityChange)>,
}

pub struct SignalController {
    config: JunctionConfig,
    tracker: PriorityTracker,
    phase: SignalPhase,
    /// Last road that had green, used to rotate the fair scan
    last_served: Option<Road>,
    board: Arc<SignalBoard>,
}

impl SignalController {
    pub fn new(config: JunctionConfig) -> Self {
        Self::with_board(config, Arc::new(SignalBoard::new()))
    }

    /// Build a controller that publishes into an existing board
    pub fn with_board(config: JunctionConfig, board: Arc<SignalBoard>) -> Self {
        let tracker = PriorityTracker::from_config(&config);
        board.publish_green(None, 0, 0);
        Self {
            config,
            tracker,
            phase: SignalPhase::AllRed { until: 0 },
            last_served: None,
            board,
        }
    }

    pub fn config(&self) -> &JunctionConfig {
        &self.config
    }

    pub fn phase(&self) -> SignalPhase {
        self.phase
    }

    pub fn tracker(&self) -> &PriorityTracker {
        &self.tracker
    }

    pub fn board(&self) -> &Arc<SignalBoard> {
        &self.board
    }

    /// The road currently showing green, or `None` when all lights are red
    pub fn current_green(&self) -> Option<Road> {
        match self.phase {
            SignalPhase::Serving(green) => Some(green.road),
            SignalPhase::AllRed { .. } => None,
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
        self.tracker.is_priority_active(road)
    }

    /// Advance the state machine to `now`
    pub fn tick(&mut self, now: SimTime, queues: &[RoadQueue; Road::COUNT]) -> TickReport {
        let mut report = TickReport {
            now,
            ..TickReport::default()
        };

        let sizes = queue_sizes(queues);
        report.priority_changes = self.refresh_priority(&sizes);

        if let SignalPhase::AllRed { until } = self.phase {
            if now >= until {
                if let Some(green) = self.select_phase(now, &sizes) {
                    info!(
                        "Serving road {} ({:?} mode): {} waiting, green for {}s",
                        green.road,
                        green.mode,
                        sizes[green.road.index()],
                        green.duration
                    );
                    self.phase = SignalPhase::Serving(green);
                    report.started = Some(green);
                }
            }
        }

        if let SignalPhase::Serving(mut green) = self.phase {
            // Backlog drained elsewhere: the override is over before we serve again
            let priority_lifted = green.mode == ServiceMode::Priority
                && report
                    .priority_changes
                    .contains(&(green.road, PriorityChange::Deactivated));
            let finished = priority_lifted || self.serve(now, &mut green, queues, &mut report);
            if finished {
                info!(
                    "Road {} back to red after {}s, {} vehicles served",
                    green.road,
                    now.saturating_sub(green.start),
                    green.served
                );
                self.last_served = Some(green.road);
                self.phase = SignalPhase::AllRed {
                    until: now + self.config.clearance,
                };
                report.ended = Some(green);
            } else {
                self.phase = SignalPhase::Serving(green);
            }
        }

        self.publish(now);
        report
    }

    /// Feed the tracker a full set of queue sizes without moving the lights
    pub fn refresh_priority(&mut self, sizes: &[usize; Road::COUNT]) -> Vec<(Road, PriorityChange)> {
        let changes = Road::ALL
            .into_iter()
            .filter_map(|road| {
                self.tracker
                    .update(road, sizes[road.index()])
                    .map(|change| (road, change))
            })
            .collect();
        for road in Road::ALL {
            self.board
                .publish_priority(road, self.tracker.is_priority_active(road));
        }
        changes
    }

    /// Green time for the priority road given its backlog at selection
    pub fn priority_green_duration(&self, queue_size: usize) -> u64 {
        let excess = queue_size.saturating_sub(self.config.low_threshold) as u64;
        self.config
            .clamp_green(excess.saturating_mul(self.config.time_per_vehicle))
    }

    /// Green time for a fair-mode road, from the average backlog of the other three
    pub fn fair_green_duration(&self, road: Road, sizes: &[usize; Road::COUNT]) -> u64 {
        let others: usize = Road::ALL
            .iter()
            .filter(|other| **other != road)
            .map(|other| sizes[other.index()])
            .sum();
        let mut average = (others / (Road::COUNT - 1)) as u64;
        if average == 0 && others > 0 {
            average = 1;
        }
        self.config
            .clamp_green(average.saturating_mul(self.config.time_per_vehicle))
    }

    fn select_phase(&self, now: SimTime, sizes: &[usize; Road::COUNT]) -> Option<GreenPhase> {
        let start = self.last_served.map_or(Road::A, Road::next);
        let road = self.tracker.next_road_from(sizes, start)?;

        let (mode, duration) = if self.tracker.is_priority_active(road) {
            (
                ServiceMode::Priority,
                self.priority_green_duration(sizes[road.index()]),
            )
        } else {
            (ServiceMode::Fair, self.fair_green_duration(road, sizes))
        };

        Some(GreenPhase::new(road, mode, now, duration))
    }

    /// Release vehicles due by `now`; returns true once the phase is over
    fn serve(
        &mut self,
        now: SimTime,
        green: &mut GreenPhase,
        queues: &[RoadQueue; Road::COUNT],
        report: &mut TickReport,
    ) -> bool {
        let queue = &queues[green.road.index()];
        loop {
            if now >= green.end() {
                return true;
            }
            if queue.is_empty() {
                // Emptied under us: end the phase instead of holding green
                self.record_count(green.road, 0, report);
                return true;
            }
            if green.next_service_at > now || green.next_service_at >= green.end() {
                return false;
            }

            let Ok((record, remaining)) = queue.dequeue_with_remaining() else {
                self.record_count(green.road, 0, report);
                return true;
            };

            debug!(
                "Served {} from road {} (waited {}s, {} remaining)",
                record.id(),
                green.road,
                record.wait_until(now),
                remaining
            );
            green.served += 1;
            green.next_service_at += self.config.time_per_vehicle;
            report.served.push(record);

            let change = self.record_count(green.road, remaining, report);
            if change == Some(PriorityChange::Deactivated) && green.mode == ServiceMode::Priority {
                return true;
            }
            if remaining == 0 {
                return true;
            }
        }
    }

    fn record_count(
        &mut self,
        road: Road,
        count: usize,
        report: &mut TickReport,
    ) -> Option<PriorityChange> {
        let change = self.tracker.update(road, count);
        if let Some(change) = change {
            report.priority_changes.push((road, change));
        }
        change
    }

    fn publish(&self, now: SimTime) {
        self.board.publish_now(now);
        for road in Road::ALL {
            self.board
                .publish_priority(road, self.tracker.is_priority_active(road));
        }
        match self.phase {
            SignalPhase::Serving(green) => {
                self.board
                    .publish_green(Some(green.road), green.start, green.duration)
            }
            SignalPhase::AllRed { .. } => self.board.publish_green(None, now, 0),
        }
    }
}

/// Current size of every queue, indexed by `Road::index`
pub fn queue_sizes(queues: &[RoadQueue; Road::COUNT]) -> [usize; Road::COUNT] {
    let mut sizes = [0; Road::COUNT];
    for queue in queues {
        sizes[queue.road().index()] = queue.size();
    }
    sizes
}
