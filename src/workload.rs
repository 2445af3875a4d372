//! External collaborators of the scheduling core: randomized process
//! generation and the execution simulator that advances a record's burst.
//!
//! The core never constructs or mutates burst state directly; it asks the
//! [`ProcessGenerator`] for fresh records and the [`Executor`] to apply one
//! grant of CPU time. Keeping both behind narrow types lets tests drive the
//! schedulers with seeded generators and zero-cost execution.

use crate::process::ProcessRecord;
use rand::prelude::*;
use std::error::Error;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

static NEXT_PROCESS_ID: AtomicU64 = AtomicU64::new(1);

/// The generator ran out of processes to hand to the producer.
///
/// The producer treats this as "finish production early", not as a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationFailure;

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "process generator exhausted")
    }
}

impl Error for GenerationFailure {}

/// Source of new process records with uniformly random burst times.
pub struct ProcessGenerator {
    rng: StdRng,
    burst_range: RangeInclusive<u32>,
    /// Records left before the generator reports exhaustion; `None` means
    /// unlimited.
    remaining: Option<u64>,
}

impl ProcessGenerator {
    /// Build a generator drawing bursts from `burst_range`. A fixed `seed`
    /// makes the burst sequence reproducible.
    pub fn new(burst_range: RangeInclusive<u32>, seed: Option<u64>) -> Self {
        assert!(
            *burst_range.start() >= 1,
            "a process needs at least one burst unit"
        );
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            burst_range,
            remaining: None,
        }
    }

    /// Cap the number of records this generator will produce.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.remaining = Some(limit);
        self
    }

    pub fn generate(&mut self) -> Result<ProcessRecord, GenerationFailure> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Err(GenerationFailure);
            }
            *remaining -= 1;
        }
        let id = NEXT_PROCESS_ID.fetch_add(1, Ordering::Relaxed);
        let burst = self.rng.random_range(self.burst_range.clone());
        Ok(ProcessRecord::new(id, burst))
    }
}

/// How much CPU time one execution call grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Retire the whole remaining burst in one call (shortest-job-first).
    ToCompletion,
    /// Grant at most one quantum of the given size (round-robin).
    Quantum(u32),
}

/// Outcome of a single execution call.
#[derive(Debug, Clone, Copy)]
pub struct ExecStep {
    /// This call was the record's first execution.
    pub first_run: bool,
    /// The record's burst reached zero and it is now `Finished`.
    pub completed: bool,
    /// Burst units consumed by this call.
    pub consumed: u32,
}

/// Simulates running a process on the CPU.
///
/// Each call blocks the calling thread for `time_unit × consumed burst`,
/// mirroring real work; tests pass `Duration::ZERO` to run at full speed.
#[derive(Debug, Clone, Copy)]
pub struct Executor {
    time_unit: Duration,
}

impl Executor {
    pub fn new(time_unit: Duration) -> Self {
        Self { time_unit }
    }

    /// Apply one grant of CPU time to `record`.
    ///
    /// Stamps the first-run timestamp exactly once, decrements the remaining
    /// burst by the granted amount, and moves the state machine forward:
    /// `Running` for the duration of the call, then `Finished` at zero burst
    /// or back to `Ready` when a quantum expires with work left over.
    pub fn execute(&self, record: &mut ProcessRecord, mode: ExecMode) -> ExecStep {
        debug_assert!(
            !record.is_finished(),
            "process {} scheduled after finishing",
            record.id()
        );
        let consumed = match mode {
            ExecMode::ToCompletion => record.remaining_burst(),
            ExecMode::Quantum(quantum) => {
                assert!(quantum >= 1, "round-robin quantum must be at least 1");
                quantum.min(record.remaining_burst())
            }
        };
        let first_run = record.begin_run(Instant::now());
        if !self.time_unit.is_zero() {
            thread::sleep(self.time_unit * consumed);
        }
        record.consume_burst(consumed);
        let completed = record.is_finished();
        if !completed {
            record.mark_ready();
        }
        ExecStep {
            first_run,
            completed,
            consumed,
        }
    }
}

/// Whole milliseconds elapsed between two instants.
pub fn elapsed_ms(from: Instant, to: Instant) -> u64 {
    to.saturating_duration_since(from).as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcState;

    #[test]
    fn generator_draws_bursts_within_range() {
        let mut generator = ProcessGenerator::new(2..=9, Some(42));
        for _ in 0..64 {
            let record = generator.generate().unwrap();
            assert!((2..=9).contains(&record.remaining_burst()));
            assert_eq!(record.state(), ProcState::New);
        }
    }

    #[test]
    fn generator_ids_are_unique() {
        let mut generator = ProcessGenerator::new(1..=5, Some(7));
        let a = generator.generate().unwrap();
        let b = generator.generate().unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn limited_generator_exhausts() {
        let mut generator = ProcessGenerator::new(1..=5, Some(7)).with_limit(2);
        assert!(generator.generate().is_ok());
        assert!(generator.generate().is_ok());
        assert_eq!(generator.generate(), Err(GenerationFailure));
    }

    #[test]
    fn to_completion_retires_the_record_in_one_call() {
        let executor = Executor::new(Duration::ZERO);
        let mut record = ProcessRecord::new(1, 7);
        record.mark_ready();
        let step = executor.execute(&mut record, ExecMode::ToCompletion);
        assert!(step.first_run);
        assert!(step.completed);
        assert_eq!(step.consumed, 7);
        assert!(record.is_finished());
    }

    #[test]
    fn quantum_execution_caps_at_remaining_burst() {
        let executor = Executor::new(Duration::ZERO);
        let mut record = ProcessRecord::new(1, 3);
        record.mark_ready();

        let first = executor.execute(&mut record, ExecMode::Quantum(2));
        assert!(first.first_run);
        assert!(!first.completed);
        assert_eq!(record.remaining_burst(), 1);
        assert_eq!(record.state(), ProcState::Ready);

        let second = executor.execute(&mut record, ExecMode::Quantum(2));
        assert!(!second.first_run);
        assert!(second.completed);
        assert_eq!(second.consumed, 1);
        assert_eq!(record.remaining_burst(), 0);
    }
}
