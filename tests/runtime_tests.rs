//! Threaded runtime: start, stop promptly, and account for every vehicle

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use junction_sim::simulation::{
    ConfigError, GenerationMode, InitError, Intersection, JunctionConfig, Road, Runtime,
    RuntimeOptions, StopSignal, TrafficGenerator, VehicleSource,
};

fn fast_options() -> RuntimeOptions {
    RuntimeOptions {
        tick_interval: Duration::from_millis(5),
        report_interval: Duration::from_millis(50),
    }
}

#[test]
fn test_stop_signal_wakes_sleepers() {
    let stop = StopSignal::new();
    let sleeper = {
        let stop = stop.clone();
        thread::spawn(move || {
            let started = Instant::now();
            let stopped = stop.wait_for(Duration::from_secs(30));
            (stopped, started.elapsed())
        })
    };

    thread::sleep(Duration::from_millis(20));
    stop.stop();
    let (stopped, elapsed) = sleeper.join().unwrap();
    assert!(stopped);
    assert!(elapsed < Duration::from_secs(5));
    assert!(stop.is_stopped());
}

#[test]
fn test_stop_signal_times_out() {
    let stop = StopSignal::new();
    assert!(!stop.wait_for(Duration::from_millis(10)));
    assert!(!stop.is_stopped());
}

#[test]
fn test_only_one_controller_per_junction() {
    let intersection = Intersection::new(JunctionConfig::default()).unwrap();
    let _controller = intersection.attach_controller().unwrap();
    assert!(matches!(
        intersection.attach_controller(),
        Err(InitError::ControllerAttached)
    ));
}

#[test]
fn test_invalid_config_fails_at_startup() {
    let config = JunctionConfig {
        high_threshold: 5,
        low_threshold: 5,
        ..JunctionConfig::default()
    };
    assert!(matches!(Intersection::new(config), Err(InitError::Config(_))));
}

#[test]
fn test_zero_minimum_green_fails_at_startup() {
    let config = JunctionConfig {
        min_green: 0,
        ..JunctionConfig::default()
    };
    assert_eq!(config.validate(), Err(ConfigError::Zero("minimum green")));
    assert!(matches!(
        Intersection::new(config),
        Err(InitError::Config(ConfigError::Zero(_)))
    ));
}

#[test]
fn test_generator_runtime_accounts_for_every_vehicle() {
    let intersection = Arc::new(Intersection::new(JunctionConfig::default()).unwrap());
    let generator = TrafficGenerator::new_with_seed(GenerationMode::Priority { weight: 60 }, 2, 21);

    let runtime = Runtime::start(
        Arc::clone(&intersection),
        VehicleSource::Generator(generator),
        fast_options(),
    )
    .unwrap();
    thread::sleep(Duration::from_millis(400));
    let stats = runtime.join().unwrap();

    assert!(stats.ticks > 0);
    assert!(stats.total_arrived() > 0);
    assert!(stats.total_served() > 0);

    let waiting: usize = intersection.queue_sizes().iter().sum();
    assert_eq!(
        stats.total_arrived() - stats.total_rejected(),
        stats.total_served() + waiting
    );
}

#[test]
fn test_runtime_stops_within_one_tick() {
    let intersection = Arc::new(Intersection::new(JunctionConfig::default()).unwrap());
    let options = RuntimeOptions {
        tick_interval: Duration::from_secs(60),
        report_interval: Duration::from_secs(60),
    };
    let runtime = Runtime::start(
        intersection,
        VehicleSource::Generator(TrafficGenerator::new_with_seed(GenerationMode::Normal, 2, 1)),
        options,
    )
    .unwrap();

    thread::sleep(Duration::from_millis(50));
    let started = Instant::now();
    runtime.join().unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_feed_runtime_ingests_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vehicles.data");
    fs::write(&path, "AA0BB001:B\nnot a vehicle\nAA0BB002:C\nAA0BB003:D:1\n").unwrap();

    let intersection = Arc::new(Intersection::new(JunctionConfig::default()).unwrap());
    let runtime = Runtime::start(
        Arc::clone(&intersection),
        VehicleSource::Feed {
            path: path.clone(),
            from_start: true,
        },
        fast_options(),
    )
    .unwrap();

    thread::sleep(Duration::from_millis(300));
    let stats = runtime.join().unwrap();

    assert_eq!(stats.total_arrived(), 3);
    assert_eq!(stats.malformed_lines, 1);
    for road in [Road::B, Road::C, Road::D] {
        assert_eq!(stats.road(road).arrived, 1);
    }
    let waiting: usize = intersection.queue_sizes().iter().sum();
    assert_eq!(stats.total_served() + waiting, 3);
}

#[test]
fn test_runtime_refuses_second_controller() {
    let intersection = Arc::new(Intersection::new(JunctionConfig::default()).unwrap());
    let _controller = intersection.attach_controller().unwrap();

    let result = Runtime::start(
        intersection,
        VehicleSource::Generator(TrafficGenerator::new_with_seed(GenerationMode::Normal, 2, 1)),
        fast_options(),
    );
    assert!(result.is_err());
}
