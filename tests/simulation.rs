use std::sync::Arc;
use std::time::Duration;

use ridehail::db::MemoryStore;
use ridehail::engine::Engine;
use ridehail::entities::RideStatus;
use ridehail::simulation::{self, SimulationConfig};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simulation_drives_every_ride_to_a_terminal_state() {
    let engine = Arc::new(Engine::new(MemoryStore::new()).unwrap());

    let config = SimulationConfig {
        passengers: 6,
        rides_per_passenger: 4,
        drivers: 4,
        cancel_probability: 0.25,
        idle_timeout: Duration::from_millis(50),
        ..SimulationConfig::default()
    };

    let report = simulation::run(engine.clone(), config).await.unwrap();

    assert_eq!(report.created, 24);
    assert!(report.accepted <= report.created);
    assert!(report.completed <= report.accepted);
    assert_eq!(report.completed + report.cancelled, report.created);

    let rides = engine.store().all().await;
    assert_eq!(rides.len(), 24);
    assert!(rides.iter().all(|ride| ride.is_terminal()));
    assert_eq!(
        rides
            .iter()
            .filter(|ride| ride.status == RideStatus::Completed)
            .count(),
        report.completed
    );
}

#[tokio::test]
async fn simulation_rejects_invalid_configuration() {
    let engine = Arc::new(Engine::new(MemoryStore::new()).unwrap());

    let config = SimulationConfig {
        cancel_probability: 1.5,
        ..SimulationConfig::default()
    };
    assert!(simulation::run(engine.clone(), config).await.is_err());

    let config = SimulationConfig {
        min_price: 50.0,
        max_price: 10.0,
        ..SimulationConfig::default()
    };
    assert!(simulation::run(engine, config).await.is_err());
}
