//! Core types for the junction simulation
//!
//! These are plain data types shared by the queues, the priority tracker and
//! the signal controller.

use std::fmt;

/// Simulated time in whole seconds since the junction was created
pub type SimTime = u64;

/// One of the four roads entering the junction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Road {
    A,
    B,
    C,
    D,
}

impl Road {
    /// All roads in their fixed service order
    pub const ALL: [Road; 4] = [Road::A, Road::B, Road::C, Road::D];

    /// Number of roads at the junction
    pub const COUNT: usize = 4;

    /// Position of the road in `Road::ALL`
    pub fn index(self) -> usize {
        match self {
            Road::A => 0,
            Road::B => 1,
            Road::C => 2,
            Road::D => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Road> {
        Road::ALL.get(index).copied()
    }

    /// Parse the single-letter road tag used by the feed
    pub fn from_char(c: char) -> Option<Road> {
        match c {
            'A' => Some(Road::A),
            'B' => Some(Road::B),
            'C' => Some(Road::C),
            'D' => Some(Road::D),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Road::A => 'A',
            Road::B => 'B',
            Road::C => 'C',
            Road::D => 'D',
        }
    }

    /// The road that follows this one in round-robin order
    pub fn next(self) -> Road {
        Road::ALL[(self.index() + 1) % Road::COUNT]
    }
}

impl fmt::Display for Road {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// State of a single road's signal head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    Red,
    Green,
}

/// Opaque vehicle identity (usually a plate number)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VehicleId(pub String);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A vehicle waiting at the junction
///
/// Records are immutable once created. A record is owned by exactly one
/// `RoadQueue` until it is dequeued, after which the caller owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleRecord {
    id: VehicleId,
    road: Road,
    lane: Option<u8>,
    arrival_time: SimTime,
}

impl VehicleRecord {
    pub fn new(id: impl Into<String>, road: Road, lane: Option<u8>, arrival_time: SimTime) -> Self {
        Self {
            id: VehicleId(id.into()),
            road,
            lane,
            arrival_time,
        }
    }

    pub fn id(&self) -> &VehicleId {
        &self.id
    }

    pub fn road(&self) -> Road {
        self.road
    }

    pub fn lane(&self) -> Option<u8> {
        self.lane
    }

    pub fn arrival_time(&self) -> SimTime {
        self.arrival_time
    }

    /// Seconds this vehicle waited if it is served at `now`
    pub fn wait_until(&self, now: SimTime) -> SimTime {
        now.saturating_sub(self.arrival_time)
    }
}
