//! Junction Simulation Library
//!
//! A four-way traffic junction controller: per-road vehicle queues, a
//! congestion-aware priority tracker and a signal state machine that turns
//! queue occupancy into green/red timing.

pub mod simulation;
