use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use junction_sim::simulation::{
    GenerationMode, Intersection, JunctionConfig, JunctionWorld, Runtime, RuntimeOptions,
    TrafficGenerator, VehicleSource, DEFAULT_PRIORITY_WEIGHT,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Equal traffic on every road
    Normal,
    /// Most traffic on road A
    Priority,
    /// Arrivals in batches
    Burst,
}

#[derive(Parser)]
#[command(name = "junction_sim")]
#[command(about = "Four-way junction signal controller simulation")]
struct Cli {
    /// Run the threaded controller against the wall clock
    #[arg(long)]
    realtime: bool,

    /// Number of simulation ticks to run in headless mode
    #[arg(long, default_value = "600")]
    ticks: u64,

    /// Wall seconds to run in realtime mode
    #[arg(long, default_value = "30")]
    duration: u64,

    /// Wall milliseconds per simulated tick in realtime mode
    #[arg(long, default_value = "1000")]
    tick_ms: u64,

    /// Tail this feed file instead of generating vehicles (realtime mode)
    #[arg(long)]
    feed: Option<PathBuf>,

    /// Read the feed file from its first line instead of its current end
    #[arg(long)]
    from_start: bool,

    /// Arrival pattern of the built-in generator
    #[arg(long, value_enum, default_value = "normal")]
    mode: Mode,

    /// Seed for reproducible arrivals
    #[arg(long)]
    seed: Option<u64>,

    /// Vehicles above which road A gets priority
    #[arg(long)]
    high: Option<usize>,

    /// Vehicles below which road A loses priority
    #[arg(long)]
    low: Option<usize>,

    /// Per-road queue capacity (0 for unbounded)
    #[arg(long)]
    capacity: Option<usize>,

    /// Seconds of green per vehicle
    #[arg(long)]
    time_per_vehicle: Option<u64>,

    /// Shortest green phase in seconds
    #[arg(long)]
    min_green: Option<u64>,

    /// Longest green phase in seconds
    #[arg(long)]
    max_green: Option<u64>,

    /// All-red seconds between phases
    #[arg(long)]
    clearance: Option<u64>,
}

impl Cli {
    fn config(&self) -> JunctionConfig {
        let mut config = JunctionConfig::default();
        if let Some(high) = self.high {
            config.high_threshold = high;
        }
        if let Some(low) = self.low {
            config.low_threshold = low;
        }
        if let Some(capacity) = self.capacity {
            config.queue_capacity = capacity;
        }
        if let Some(secs) = self.time_per_vehicle {
            config.time_per_vehicle = secs;
        }
        if let Some(secs) = self.min_green {
            config.min_green = secs;
        }
        if let Some(secs) = self.max_green {
            config.max_green = secs;
        }
        if let Some(secs) = self.clearance {
            config.clearance = secs;
        }
        config
    }

    fn generator(&self, monitored_lane: u8) -> TrafficGenerator {
        let mode = match self.mode {
            Mode::Normal => GenerationMode::Normal,
            Mode::Priority => GenerationMode::Priority {
                weight: DEFAULT_PRIORITY_WEIGHT,
            },
            Mode::Burst => GenerationMode::Burst,
        };
        match self.seed {
            Some(seed) => TrafficGenerator::new_with_seed(mode, monitored_lane, seed),
            None => TrafficGenerator::new(mode, monitored_lane),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,junction_sim=info"),
    )
    .init();

    let cli = Cli::parse();
    let config = cli.config();

    if cli.realtime {
        run_realtime(&cli, config)
    } else {
        run_headless(&cli, config)
    }
}

/// Run the simulation on a simulated clock with no threads
fn run_headless(cli: &Cli, config: JunctionConfig) -> Result<()> {
    info!("Running junction simulation in headless mode...");
    info!("Ticks: {}, mode: {:?}", cli.ticks, cli.mode);

    let generator = cli.generator(config.monitored_lane);
    let mut world =
        JunctionWorld::with_generator(config, generator).context("Failed to build junction")?;

    // Print a status line once per simulated minute
    let report_every = 60 / world.intersection().config().tick.max(1);
    for tick in 1..=cli.ticks {
        world.tick();
        if tick % report_every.max(1) == 0 {
            info!("{}", world.snapshot());
        }
    }

    world.log_summary();
    Ok(())
}

/// Run the ingestion, scheduling and presentation threads against the wall clock
fn run_realtime(cli: &Cli, config: JunctionConfig) -> Result<()> {
    let source = match &cli.feed {
        Some(path) => VehicleSource::Feed {
            path: path.clone(),
            from_start: cli.from_start,
        },
        None => VehicleSource::Generator(cli.generator(config.monitored_lane)),
    };
    let options = RuntimeOptions {
        tick_interval: Duration::from_millis(cli.tick_ms.max(1)),
        report_interval: Duration::from_millis(cli.tick_ms.max(1) * 2),
    };

    let intersection = Arc::new(Intersection::new(config).context("Failed to build junction")?);
    let runtime = Runtime::start(Arc::clone(&intersection), source, options)?;

    info!("Running for {}s...", cli.duration);
    runtime
        .stop_signal()
        .wait_for(Duration::from_secs(cli.duration));

    let stats = runtime.join()?;
    stats.log_summary(intersection.snapshot().total_waiting());
    Ok(())
}
