//! Dispatch policies.
//!
//! A scheduler owns the per-consumer selection state (the round-robin cursor
//! or positional offset) and performs one `step` at a time: select a record,
//! execute it, account metrics, and remove it when it finished. The entire
//! step runs under the work queue guard handed in by the consumer loop, so
//! selection can never race with another consumer's removal.

pub mod rr;
pub mod sjf;

pub use rr::RoundRobinScheduler;
pub use sjf::SjfScheduler;

use crate::metrics::MetricsCollector;
use crate::store::InsertDiscipline;
use crate::workload::Executor;
use crate::workqueue::QueueInner;
use serde::Serialize;
use std::fmt;

/// Scheduling policy selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Policy {
    /// Shortest-job-first: always retire the minimum-burst record, in one
    /// execution call.
    Sjf,
    /// Round-robin: one quantum per visit, rotating over arrival order.
    RoundRobin,
}

impl Policy {
    /// Store discipline this policy relies on.
    pub fn discipline(self) -> InsertDiscipline {
        match self {
            Policy::Sjf => InsertDiscipline::SortedByBurst,
            Policy::RoundRobin => InsertDiscipline::Fifo,
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Sjf => write!(f, "sjf"),
            Policy::RoundRobin => write!(f, "rr"),
        }
    }
}

/// What a single dispatch step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The record finished and was removed from the store.
    Completed(u64),
    /// A quantum expired with burst left; the record stays queued.
    Preempted(u64),
    /// The selected record was gone by the time it was touched; another
    /// consumer finished it. Benign; the caller just takes the next turn.
    Lost,
}

/// Per-consumer dispatch engine.
pub enum Engine {
    Sjf(SjfScheduler),
    RoundRobin(RoundRobinScheduler),
}

impl Engine {
    /// Build the engine for consumer `index` out of `count`.
    ///
    /// Shortest-job-first consumers all pull the head. A lone round-robin
    /// consumer keeps a rotating cursor; with several consumers, each is
    /// pinned to the list position matching its index instead.
    pub fn for_consumer(policy: Policy, quantum: u32, index: usize, count: usize) -> Engine {
        match policy {
            Policy::Sjf => Engine::Sjf(SjfScheduler::new()),
            Policy::RoundRobin if count == 1 => {
                Engine::RoundRobin(RoundRobinScheduler::solo(quantum))
            }
            Policy::RoundRobin => Engine::RoundRobin(RoundRobinScheduler::positional(quantum, index)),
        }
    }

    /// Store length this engine needs before it has a turn to take.
    pub fn offset(&self) -> usize {
        match self {
            Engine::Sjf(_) => 0,
            Engine::RoundRobin(rr) => rr.offset(),
        }
    }

    /// Run one select-execute-remove cycle under the queue guard.
    pub fn step(
        &mut self,
        inner: &mut QueueInner,
        executor: &Executor,
        metrics: &MetricsCollector,
    ) -> StepOutcome {
        match self {
            Engine::Sjf(sjf) => sjf.step(inner, executor, metrics),
            Engine::RoundRobin(rr) => rr.step(inner, executor, metrics),
        }
    }
}
