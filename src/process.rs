//! Process records and their lifecycle state machine.

use serde::Serialize;
use std::time::Instant;

/// Lifecycle states of a simulated process.
///
/// Transitions only ever move forward: `New → Ready → Running`, then either
/// `Finished` (burst exhausted) or back to `Ready` when a round-robin quantum
/// expires. A record never revisits `New`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProcState {
    New,
    Ready,
    Running,
    Finished,
}

/// A unit of schedulable work.
///
/// The record carries no linkage of its own; its position among other records
/// is owned entirely by the store holding it. Burst accounting and state
/// transitions are driven by the execution simulator, which is the only
/// mutator once a record has been admitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    id: u64,
    remaining_burst: u32,
    state: ProcState,
    created_at: Instant,
    first_run_at: Option<Instant>,
}

impl ProcessRecord {
    pub fn new(id: u64, burst: u32) -> Self {
        Self {
            id,
            remaining_burst: burst,
            state: ProcState::New,
            created_at: Instant::now(),
            first_run_at: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn remaining_burst(&self) -> u32 {
        self.remaining_burst
    }

    pub fn state(&self) -> ProcState {
        self.state
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Timestamp of the first execution, absent until the record first runs.
    pub fn first_run_at(&self) -> Option<Instant> {
        self.first_run_at
    }

    pub fn is_finished(&self) -> bool {
        self.state == ProcState::Finished
    }

    /// Mark the record admitted to the run queue.
    pub fn mark_ready(&mut self) {
        debug_assert!(
            matches!(self.state, ProcState::New | ProcState::Running),
            "cannot ready a {:?} process",
            self.state
        );
        self.state = ProcState::Ready;
    }

    /// Transition to `Running` and stamp `first_run_at` exactly once.
    ///
    /// Returns `true` when this is the record's first execution, so the
    /// caller can account response time a single time per record.
    pub fn begin_run(&mut self, now: Instant) -> bool {
        debug_assert!(
            matches!(self.state, ProcState::New | ProcState::Ready),
            "cannot run a {:?} process",
            self.state
        );
        self.state = ProcState::Running;
        if self.first_run_at.is_none() {
            self.first_run_at = Some(now);
            true
        } else {
            false
        }
    }

    /// Consume `amount` burst units, finishing the record at exactly zero.
    ///
    /// The remaining burst strictly decreases and never underflows; a zero
    /// `amount` or over-consumption means the executor broke its contract and
    /// the run is not salvageable.
    pub fn consume_burst(&mut self, amount: u32) {
        assert!(
            amount > 0 && amount <= self.remaining_burst,
            "invariant violation: process {} consumed {} of {} remaining burst units",
            self.id,
            amount,
            self.remaining_burst
        );
        self.remaining_burst -= amount;
        if self.remaining_burst == 0 {
            self.state = ProcState::Finished;
        }
    }
}
