//! Threaded junction runtime
//!
//! Three loops share one `Intersection`: ingestion fills the queues, the
//! scheduler runs the signal controller once per tick, and the presenter
//! logs a status line. They only meet through the queues' own locks and the
//! lock-free signal board. Every sleep goes through `StopSignal`, so a stop
//! request wakes all loops at once.

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use parking_lot::{Condvar, Mutex};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::feed::{ingest_line, FeedTailer};
use super::generator::TrafficGenerator;
use super::intersection::Intersection;
use super::signal::SignalController;
use super::stats::JunctionStats;

/// Shared stop flag that doubles as an interruptible sleep
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock() = true;
        cvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Sleep for `timeout` or until stopped; returns true if stopped
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut stopped = lock.lock();
        while !*stopped {
            if cvar.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

/// Where arriving vehicles come from
pub enum VehicleSource {
    /// Tail a feed file written by an external generator
    Feed { path: PathBuf, from_start: bool },
    /// Generate arrivals in-process
    Generator(TrafficGenerator),
}

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Wall time per simulated tick
    pub tick_interval: Duration,
    /// Wall time between two presentation status lines
    pub report_interval: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            report_interval: Duration::from_secs(2),
        }
    }
}

/// Running junction; dropping it without `join` leaves the threads detached
pub struct Runtime {
    intersection: Arc<Intersection>,
    stop: StopSignal,
    handles: Vec<(&'static str, JoinHandle<JunctionStats>)>,
}

impl Runtime {
    /// Attach the controller and spawn the ingestion, scheduling and presentation loops
    pub fn start(
        intersection: Arc<Intersection>,
        source: VehicleSource,
        options: RuntimeOptions,
    ) -> Result<Self> {
        let ingest = match source {
            VehicleSource::Feed { path, from_start } => {
                let tailer = if from_start {
                    FeedTailer::from_start(&path)
                } else {
                    FeedTailer::from_end(&path)?
                };
                Ingest::Feed(tailer)
            }
            VehicleSource::Generator(generator) => Ingest::Generator(generator),
        };
        let controller = intersection
            .attach_controller()
            .context("Failed to attach signal controller")?;

        let mut runtime = Self {
            intersection,
            stop: StopSignal::new(),
            handles: Vec::new(),
        };

        info!("=== Junction runtime started ===");
        {
            let intersection = Arc::clone(&runtime.intersection);
            let stop = runtime.stop.clone();
            let tick = options.tick_interval;
            runtime.spawn("scheduler", move || {
                scheduler_loop(&intersection, controller, &stop, tick)
            })?;
        }
        {
            let intersection = Arc::clone(&runtime.intersection);
            let stop = runtime.stop.clone();
            let tick = options.tick_interval;
            runtime.spawn("ingest", move || {
                ingest_loop(&intersection, ingest, &stop, tick)
            })?;
        }
        {
            let intersection = Arc::clone(&runtime.intersection);
            let stop = runtime.stop.clone();
            let interval = options.report_interval;
            runtime.spawn("presenter", move || {
                presenter_loop(&intersection, &stop, interval)
            })?;
        }

        Ok(runtime)
    }

    fn spawn<F>(&mut self, name: &'static str, body: F) -> Result<()>
    where
        F: FnOnce() -> JunctionStats + Send + 'static,
    {
        let spawned = thread::Builder::new().name(name.to_string()).spawn(body);
        match spawned {
            Ok(handle) => {
                self.handles.push((name, handle));
                Ok(())
            }
            Err(e) => {
                // Bring down whatever already started before reporting
                self.stop.stop();
                Err(e).with_context(|| format!("Failed to spawn {} thread", name))
            }
        }
    }

    pub fn intersection(&self) -> &Arc<Intersection> {
        &self.intersection
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Stop every loop, wait for it to exit and merge the statistics
    pub fn join(self) -> Result<JunctionStats> {
        self.stop.stop();
        let mut stats = JunctionStats::default();
        let mut failed = Vec::new();
        for (name, handle) in self.handles {
            match handle.join() {
                Ok(thread_stats) => stats.merge(&thread_stats),
                Err(_) => {
                    error!("{} thread panicked", name);
                    failed.push(name);
                }
            }
        }
        if !failed.is_empty() {
            return Err(anyhow!("Junction threads panicked: {}", failed.join(", ")));
        }
        info!("=== Junction runtime stopped ===");
        Ok(stats)
    }
}

enum Ingest {
    Feed(FeedTailer),
    Generator(TrafficGenerator),
}

fn scheduler_loop(
    intersection: &Intersection,
    mut controller: SignalController,
    stop: &StopSignal,
    tick_interval: Duration,
) -> JunctionStats {
    info!("Traffic processing thread started");
    let mut stats = JunctionStats::default();
    let mut now = 0;

    while !stop.is_stopped() {
        let report = controller.tick(now, intersection.queues());
        stats.record_tick(&report);
        now += intersection.config().tick;

        if stop.wait_for(tick_interval) {
            break;
        }
    }

    info!("Traffic processing thread stopped");
    stats
}

fn ingest_loop(
    intersection: &Intersection,
    mut ingest: Ingest,
    stop: &StopSignal,
    poll_interval: Duration,
) -> JunctionStats {
    let mut stats = JunctionStats::default();
    if let Ingest::Feed(tailer) = &ingest {
        info!("Monitoring feed file: {}", tailer.path().display());
    }

    while !stop.is_stopped() {
        match &mut ingest {
            Ingest::Feed(tailer) => match tailer.poll() {
                Ok(lines) => {
                    for line in lines {
                        ingest_line(intersection, &line, &mut stats);
                    }
                }
                // Transient read failures are retried on the next poll
                Err(e) => warn!("Feed poll failed: {:#}", e),
            },
            Ingest::Generator(generator) => {
                for record in generator.tick(intersection.board().now()) {
                    let road = record.road();
                    let id = record.id().clone();
                    stats.record_arrival(road);
                    if let Err(e) = intersection.enqueue(record) {
                        warn!("Dropping vehicle {}: {}", id, e);
                        stats.record_rejected(road);
                    }
                }
            }
        }

        if stop.wait_for(poll_interval) {
            break;
        }
    }

    stats
}

fn presenter_loop(intersection: &Intersection, stop: &StopSignal, interval: Duration) -> JunctionStats {
    while !stop.is_stopped() {
        info!("{}", intersection.snapshot());
        if stop.wait_for(interval) {
            break;
        }
    }
    JunctionStats::default()
}
