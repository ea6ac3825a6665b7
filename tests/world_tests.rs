//! Headless world: arrivals and signal decisions on one simulated clock

use junction_sim::simulation::{
    GenerationMode, JunctionConfig, JunctionWorld, QueueError, Road, TrafficGenerator,
    VehicleRecord,
};

#[test]
fn test_world_accounts_for_every_vehicle() {
    let generator = TrafficGenerator::new_with_seed(GenerationMode::Burst, 2, 8);
    let mut world = JunctionWorld::with_generator(JunctionConfig::default(), generator).unwrap();

    let served = world.run(500);
    let stats = world.stats();

    assert_eq!(stats.ticks, 500);
    assert_eq!(world.now(), 500);
    assert_eq!(stats.total_served(), served);
    assert_eq!(
        stats.total_arrived() - stats.total_rejected(),
        served + world.snapshot().total_waiting()
    );
    assert!(stats.green_phases > 0);
}

#[test]
fn test_world_records_wait_times() {
    let mut world = JunctionWorld::new(JunctionConfig::default()).unwrap();
    world
        .add_vehicle(VehicleRecord::new("CAR1", Road::C, None, 0))
        .unwrap();

    // The first car leaves on the tick it arrives
    world.tick();
    assert_eq!(world.stats().road(Road::C).served, 1);
    assert_eq!(world.stats().road(Road::C).max_wait, 0);

    // A second car stamped at t=0 but queued at t=1 has waited a second
    world
        .add_vehicle(VehicleRecord::new("CAR2", Road::C, None, 0))
        .unwrap();
    world.run(3);
    let road = world.stats().road(Road::C);
    assert_eq!(road.served, 2);
    assert!(road.max_wait >= 1);
}

#[test]
fn test_world_counts_rejected_vehicles() {
    let config = JunctionConfig {
        queue_capacity: 2,
        ..JunctionConfig::default()
    };
    let mut world = JunctionWorld::new(config).unwrap();
    for i in 0..3 {
        let result = world.add_vehicle(VehicleRecord::new(format!("D{}", i), Road::D, None, 0));
        if i < 2 {
            assert!(result.is_ok());
        } else {
            assert!(matches!(result, Err(QueueError::Full { road: Road::D, .. })));
        }
    }
    assert_eq!(world.stats().road(Road::D).arrived, 3);
    assert_eq!(world.stats().road(Road::D).rejected, 1);
    assert_eq!(world.snapshot().queue_sizes, [0, 0, 0, 2]);
}
