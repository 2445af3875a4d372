//! Round-robin dispatch.
//!
//! Each visit grants one quantum. A lone consumer walks the FIFO store with
//! a rotating cursor, wrapping back to the head at the tail. With several
//! consumers, consumer `i` instead targets the record at offset `i` from the
//! head, recomputed on every turn because removals shift positions. The
//! offsets are a best-effort load-spreading heuristic: overlap between
//! consumers is tolerated and made harmless by the queue lock serializing
//! every select-execute-remove sequence.
//!
//! Cursor safety: before removing a finished record the cursor is advanced
//! past it, so the next turn never starts from a reclaimed slot. A `None`
//! cursor means "wrap to the head".

use crate::metrics::{CompletionEvent, MetricsCollector};
use crate::scheduler::StepOutcome;
use crate::store::{ProcHandle, StoreError};
use crate::workload::{elapsed_ms, ExecMode, Executor};
use crate::workqueue::QueueInner;
use std::time::Instant;

/// How this consumer picks its next record.
#[derive(Debug, Clone, Copy)]
enum Selection {
    /// Rotating cursor, single-consumer mode. `None` wraps to the head.
    Cursor(Option<ProcHandle>),
    /// Fixed offset from the head, multi-consumer mode.
    Positional(usize),
}

#[derive(Debug)]
pub struct RoundRobinScheduler {
    quantum: u32,
    selection: Selection,
}

impl RoundRobinScheduler {
    /// Single-consumer rotation.
    pub fn solo(quantum: u32) -> Self {
        assert!(quantum >= 1, "round-robin quantum must be at least 1");
        Self {
            quantum,
            selection: Selection::Cursor(None),
        }
    }

    /// Multi-consumer positional selection for the consumer at `offset`.
    pub fn positional(quantum: u32, offset: usize) -> Self {
        assert!(quantum >= 1, "round-robin quantum must be at least 1");
        Self {
            quantum,
            selection: Selection::Positional(offset),
        }
    }

    /// Minimum store length before this consumer has a turn.
    pub fn offset(&self) -> usize {
        match self.selection {
            Selection::Cursor(_) => 0,
            Selection::Positional(offset) => offset,
        }
    }

    pub fn step(
        &mut self,
        inner: &mut QueueInner,
        executor: &Executor,
        metrics: &MetricsCollector,
    ) -> StepOutcome {
        let Some(handle) = self.select(inner) else {
            // Not enough records for this consumer's offset right now; skip
            // the turn without touching anything.
            log::debug!("round-robin turn skipped, no record at offset");
            return StepOutcome::Lost;
        };

        let Some(record) = inner.store.get_mut(handle) else {
            log::debug!("selected record vanished before execution");
            self.reset_cursor();
            return StepOutcome::Lost;
        };
        let created_at = record.created_at();
        let step = executor.execute(record, ExecMode::Quantum(self.quantum));
        let quantum_end = Instant::now();
        let id = record.id();

        if step.first_run {
            let first_run_at = record
                .first_run_at()
                .expect("an executed record has a first-run stamp");
            metrics.record_first_run(elapsed_ms(created_at, first_run_at));
        }

        if !step.completed {
            self.advance_cursor(inner, handle);
            return StepOutcome::Preempted(id);
        }

        // Advance off the finished record first; removing it would leave the
        // cursor pointing at a reclaimed slot.
        self.advance_cursor(inner, handle);
        match inner.store.remove(handle) {
            Ok(record) => {
                debug_assert!(record.is_finished());
                let response_ms = record
                    .first_run_at()
                    .map(|at| elapsed_ms(created_at, at))
                    .unwrap_or_default();
                metrics.record_completion(CompletionEvent {
                    id: record.id(),
                    response_ms,
                    turnaround_ms: elapsed_ms(created_at, quantum_end),
                });
                StepOutcome::Completed(record.id())
            }
            Err(StoreError::NotFound) => {
                log::debug!("record {id} already removed by a racing consumer");
                StepOutcome::Lost
            }
        }
    }

    fn select(&self, inner: &QueueInner) -> Option<ProcHandle> {
        match self.selection {
            Selection::Cursor(cursor) => cursor
                .filter(|handle| inner.store.get(*handle).is_some())
                .or_else(|| inner.store.head()),
            Selection::Positional(offset) => inner.store.peek_offset(offset),
        }
    }

    fn advance_cursor(&mut self, inner: &QueueInner, current: ProcHandle) {
        if let Selection::Cursor(cursor) = &mut self.selection {
            // Tail wraps to the head on the next turn.
            *cursor = inner.store.next_after(current);
        }
    }

    fn reset_cursor(&mut self) {
        if let Selection::Cursor(cursor) = &mut self.selection {
            *cursor = None;
        }
    }
}
