// End-to-end runs through the public Simulation API.

use schedsim::{Policy, Simulation, SimulationConfig};
use std::thread;
use std::time::Duration;

fn fast_config(policy: Policy) -> SimulationConfig {
    SimulationConfig {
        policy,
        target_count: 40,
        capacity: 8,
        consumers: 1,
        quantum: 3,
        burst_min: 1,
        burst_max: 15,
        time_unit: Duration::ZERO,
        seed: Some(1729),
        generator_limit: None,
    }
}

#[test]
fn sjf_single_consumer_finishes_the_full_target() {
    let report = Simulation::new(fast_config(Policy::Sjf)).run();
    assert_eq!(report.created, 40);
    assert_eq!(report.finished, 40);
    assert_eq!(report.completions.len(), 40);
    assert!(!report.cancelled);
}

#[test]
fn sjf_multiple_consumers_share_the_drain() {
    let mut config = fast_config(Policy::Sjf);
    config.consumers = 3;
    let report = Simulation::new(config).run();
    assert_eq!(report.finished, 40);
}

#[test]
fn round_robin_single_consumer_finishes_the_full_target() {
    let report = Simulation::new(fast_config(Policy::RoundRobin)).run();
    assert_eq!(report.finished, 40);
}

#[test]
fn round_robin_two_consumers_conserve_every_record() {
    let mut config = fast_config(Policy::RoundRobin);
    config.consumers = 2;
    let report = Simulation::new(config).run();
    assert_eq!(report.created, 40);
    assert_eq!(report.finished, 40);
}

#[test]
fn totals_equal_per_record_sums() {
    let report = Simulation::new(fast_config(Policy::RoundRobin)).run();
    let response_sum: u64 = report.completions.iter().map(|c| c.response_ms).sum();
    let turnaround_sum: u64 = report.completions.iter().map(|c| c.turnaround_ms).sum();
    assert_eq!(report.total_response_ms, response_sum);
    assert_eq!(report.total_turnaround_ms, turnaround_sum);
}

#[test]
fn exhausted_generator_still_drains_cleanly() {
    let mut config = fast_config(Policy::RoundRobin);
    config.generator_limit = Some(7);
    let report = Simulation::new(config).run();
    assert_eq!(report.created, 7);
    assert_eq!(report.finished, 7);
    assert!(!report.cancelled);
}

#[test]
fn tiny_capacity_does_not_deadlock_either_policy() {
    for policy in [Policy::Sjf, Policy::RoundRobin] {
        let mut config = fast_config(policy);
        config.capacity = 1;
        config.target_count = 15;
        let report = Simulation::new(config).run();
        assert_eq!(report.finished, 15);
    }
}

#[test]
fn cancellation_joins_within_bounded_time() {
    let mut config = fast_config(Policy::RoundRobin);
    // Slow enough that the run is certainly still going when we cancel.
    config.target_count = 10_000;
    config.time_unit = Duration::from_millis(1);
    let simulation = Simulation::new(config);
    let cancel = simulation.cancel_handle();

    let runner = thread::spawn(move || simulation.run());
    thread::sleep(Duration::from_millis(50));
    cancel.cancel();

    let report = runner.join().expect("cancelled run must still join");
    assert!(report.cancelled);
    assert!(report.created < 10_000);
}
