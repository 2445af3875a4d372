//! Run orchestration.
//!
//! Wires the work queue, the generator, the per-consumer engines, and the
//! metrics collector together: one producer thread fills the bounded store,
//! N consumer threads drain it under the selected policy, and once every
//! thread has joined the accumulated metrics become the run's report.

use crate::metrics::{CompletionEvent, MetricsCollector};
use crate::scheduler::{Engine, Policy, StepOutcome};
use crate::workload::{elapsed_ms, Executor, ProcessGenerator};
use crate::workqueue::{CancelToken, WorkQueue};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Immutable knobs for one run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub policy: Policy,
    /// Number of processes the producer aims to create.
    pub target_count: u64,
    /// Admission gate bound on live records.
    pub capacity: usize,
    pub consumers: usize,
    /// Round-robin quantum, in burst units. Ignored by shortest-job-first.
    pub quantum: u32,
    pub burst_min: u32,
    pub burst_max: u32,
    /// Simulated wall-clock cost of one burst unit.
    pub time_unit: Duration,
    /// Fixed RNG seed for reproducible burst sequences.
    pub seed: Option<u64>,
    /// Cap on how many records the generator can produce before reporting
    /// exhaustion; lets runs exercise early-terminated production.
    pub generator_limit: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            policy: Policy::Sjf,
            target_count: 50,
            capacity: 10,
            consumers: 1,
            quantum: 5,
            burst_min: 1,
            burst_max: 30,
            time_unit: Duration::from_millis(1),
            seed: None,
            generator_limit: None,
        }
    }
}

/// Final numbers of a finished run. Serializable for the reporting layer;
/// the core does no formatting of its own.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub policy: Policy,
    pub created: u64,
    pub finished: u64,
    pub total_response_ms: u64,
    pub total_turnaround_ms: u64,
    pub avg_response_ms: f64,
    pub avg_turnaround_ms: f64,
    pub elapsed_ms: u64,
    pub cancelled: bool,
    /// Per-record completions in the order they were observed.
    pub completions: Vec<CompletionEvent>,
}

/// Handle for stopping a run from outside (e.g. a Ctrl-C handler).
#[derive(Clone)]
pub struct CancelHandle {
    token: CancelToken,
    queue: Arc<WorkQueue>,
}

impl CancelHandle {
    /// Stop producing and draining; blocked threads are woken so the run
    /// joins within bounded time.
    pub fn cancel(&self) {
        self.token.cancel();
        self.queue.wake_all();
    }
}

pub struct Simulation {
    config: SimulationConfig,
    queue: Arc<WorkQueue>,
    cancel: CancelToken,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        assert!(config.consumers >= 1, "need at least one consumer");
        assert!(
            config.burst_min >= 1 && config.burst_min <= config.burst_max,
            "burst range must be non-empty and start at 1 or more"
        );
        if config.policy == Policy::RoundRobin {
            assert!(config.quantum >= 1, "round-robin quantum must be at least 1");
        }
        let queue = Arc::new(WorkQueue::new(config.policy.discipline(), config.capacity));
        Self {
            config,
            queue,
            cancel: CancelToken::new(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.cancel.clone(),
            queue: self.queue.clone(),
        }
    }

    /// Run the simulation to completion (or cancellation) and report.
    ///
    /// Spawns the producer and consumer threads, joins all of them, then
    /// folds the collector totals and the completion stream into a
    /// [`SimulationReport`].
    pub fn run(self) -> SimulationReport {
        let started = Instant::now();
        let (metrics, events_rx) = MetricsCollector::new();
        let metrics = Arc::new(metrics);
        let created = Arc::new(AtomicU64::new(0));

        let producer = {
            let queue = self.queue.clone();
            let cancel = self.cancel.clone();
            let created = created.clone();
            let config = self.config.clone();
            thread::Builder::new()
                .name("producer".to_string())
                .spawn(move || producer_loop(&config, &queue, &cancel, &created))
                .expect("failed to spawn producer thread")
        };

        let consumers: Vec<_> = (0..self.config.consumers)
            .map(|index| {
                let queue = self.queue.clone();
                let cancel = self.cancel.clone();
                let metrics = metrics.clone();
                let config = self.config.clone();
                thread::Builder::new()
                    .name(format!("consumer-{index}"))
                    .spawn(move || consumer_loop(&config, index, &queue, &cancel, &metrics))
                    .expect("failed to spawn consumer thread")
            })
            .collect();

        producer.join().expect("producer thread panicked");
        for consumer in consumers {
            consumer.join().expect("consumer thread panicked");
        }

        let cancelled = self.cancel.is_cancelled();
        let created = created.load(Ordering::Relaxed);
        let finished = metrics.finished_count();
        debug_assert!(
            cancelled || (finished == created && self.queue.is_empty()),
            "conservation broken: created {created}, finished {finished}"
        );

        let completions: Vec<CompletionEvent> = events_rx.try_iter().collect();
        let average = |total: u64| {
            if finished == 0 {
                0.0
            } else {
                total as f64 / finished as f64
            }
        };
        SimulationReport {
            policy: self.config.policy,
            created,
            finished,
            total_response_ms: metrics.total_response_ms(),
            total_turnaround_ms: metrics.total_turnaround_ms(),
            avg_response_ms: average(metrics.total_response_ms()),
            avg_turnaround_ms: average(metrics.total_turnaround_ms()),
            elapsed_ms: elapsed_ms(started, Instant::now()),
            cancelled,
            completions,
        }
    }
}

/// Create records up to the target, then flip the production-finished flag
/// exactly once, including when the generator gives out early or the run is
/// cancelled, so consumers always have a terminating predicate.
fn producer_loop(
    config: &SimulationConfig,
    queue: &WorkQueue,
    cancel: &CancelToken,
    created: &AtomicU64,
) {
    let mut generator = ProcessGenerator::new(config.burst_min..=config.burst_max, config.seed);
    if let Some(limit) = config.generator_limit {
        generator = generator.with_limit(limit);
    }

    while created.load(Ordering::Relaxed) < config.target_count && !cancel.is_cancelled() {
        match generator.generate() {
            Ok(record) => {
                if queue.insert_blocking(record, cancel).is_none() {
                    break;
                }
                created.fetch_add(1, Ordering::Relaxed);
            }
            Err(failure) => {
                log::warn!("stopping production early: {failure}");
                break;
            }
        }
    }
    queue.finish_production();
    log::info!(
        "production finished after {} of {} records",
        created.load(Ordering::Relaxed),
        config.target_count
    );
}

/// Drain the queue until production has finished and no turn can come again.
fn consumer_loop(
    config: &SimulationConfig,
    index: usize,
    queue: &WorkQueue,
    cancel: &CancelToken,
    metrics: &MetricsCollector,
) {
    let mut engine = Engine::for_consumer(config.policy, config.quantum, index, config.consumers);
    let executor = Executor::new(config.time_unit);

    while let Some(mut inner) = queue.wait_for_turn(engine.offset(), cancel) {
        let outcome = engine.step(&mut inner, &executor, metrics);
        drop(inner);
        if matches!(outcome, StepOutcome::Completed(_)) {
            queue.notify_removal();
        }
    }
    log::debug!("consumer {index} drained");
}
