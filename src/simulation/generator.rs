//! Synthetic vehicle arrivals
//!
//! Produces plate numbers in the `AA0BB123` format and spreads them over the
//! four roads according to a generation mode. Pass a seed for reproducible
//! runs.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::types::{Road, SimTime, VehicleRecord};

/// Share of traffic sent to road A in priority mode, in percent
pub const DEFAULT_PRIORITY_WEIGHT: u8 = 60;

/// How arrivals are spread over time and roads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// One vehicle every 1-3 ticks, any road with equal chance
    Normal,
    /// Like `Normal`, but `weight` percent of vehicles go to road A
    Priority { weight: u8 },
    /// Batches of 2-6 vehicles separated by 5-9 quiet ticks
    Burst,
}

pub struct TrafficGenerator {
    mode: GenerationMode,
    /// Lane tag given to vehicles on road A
    monitored_lane: u8,
    /// Ticks to wait before the next arrival (or batch)
    quiet_ticks: u32,
    generated: usize,
    /// Optional seeded RNG for reproducible runs
    rng: Option<StdRng>,
}

impl TrafficGenerator {
    fn new_internal(mode: GenerationMode, monitored_lane: u8, rng: Option<StdRng>) -> Self {
        Self {
            mode,
            monitored_lane,
            quiet_ticks: 0,
            generated: 0,
            rng,
        }
    }

    pub fn new(mode: GenerationMode, monitored_lane: u8) -> Self {
        Self::new_internal(mode, monitored_lane, None)
    }

    /// Create a generator with a seeded RNG for reproducible arrivals
    pub fn new_with_seed(mode: GenerationMode, monitored_lane: u8, seed: u64) -> Self {
        Self::new_internal(mode, monitored_lane, Some(StdRng::seed_from_u64(seed)))
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    /// Number of vehicles produced so far
    pub fn generated(&self) -> usize {
        self.generated
    }

    fn random_range(&mut self, range: std::ops::RangeInclusive<u32>) -> u32 {
        match &mut self.rng {
            Some(rng) => rng.random_range(range),
            None => rand::rng().random_range(range),
        }
    }

    /// A fresh plate number, e.g. `KQ3ZD804`
    pub fn plate(&mut self) -> String {
        let mut plate = String::with_capacity(8);
        for position in 0..8 {
            let c = match position {
                2 | 5 | 6 | 7 => char::from(b'0' + self.random_range(0..=9) as u8),
                _ => char::from(b'A' + self.random_range(0..=25) as u8),
            };
            plate.push(c);
        }
        plate
    }

    fn road(&mut self) -> Road {
        match self.mode {
            GenerationMode::Priority { weight } => {
                if self.random_range(0..=99) < u32::from(weight) {
                    Road::A
                } else {
                    Road::ALL[1 + self.random_range(0..=2) as usize]
                }
            }
            GenerationMode::Normal | GenerationMode::Burst => {
                Road::ALL[self.random_range(0..=3) as usize]
            }
        }
    }

    fn vehicle(&mut self, now: SimTime) -> VehicleRecord {
        let plate = self.plate();
        let road = self.road();
        let lane = (road == Road::A).then_some(self.monitored_lane);
        self.generated += 1;
        VehicleRecord::new(plate, road, lane, now)
    }

    /// Vehicles arriving during the tick at `now`
    pub fn tick(&mut self, now: SimTime) -> Vec<VehicleRecord> {
        if self.quiet_ticks > 0 {
            self.quiet_ticks -= 1;
            return Vec::new();
        }

        match self.mode {
            GenerationMode::Normal | GenerationMode::Priority { .. } => {
                self.quiet_ticks = self.random_range(0..=2);
                vec![self.vehicle(now)]
            }
            GenerationMode::Burst => {
                let burst = self.random_range(2..=6);
                self.quiet_ticks = self.random_range(5..=9);
                (0..burst).map(|_| self.vehicle(now)).collect()
            }
        }
    }
}

/// Render a vehicle as a feed line (without the trailing newline)
pub fn feed_line(record: &VehicleRecord) -> String {
    match record.lane() {
        Some(lane) => format!("{}:{}:{}", record.id(), record.road(), lane),
        None => format!("{}:{}", record.id(), record.road()),
    }
}
