//! Shortest-Job-First dispatch.
//!
//! The sorted store guarantees its head is the minimum-burst record, so
//! selection is just "take the head". One execution call retires the whole
//! burst; the same step then removes the record and folds its response and
//! turnaround times into the aggregator.

use crate::metrics::{CompletionEvent, MetricsCollector};
use crate::scheduler::StepOutcome;
use crate::store::StoreError;
use crate::workload::{elapsed_ms, ExecMode, Executor};
use crate::workqueue::QueueInner;
use std::time::Instant;

#[derive(Debug, Default)]
pub struct SjfScheduler;

impl SjfScheduler {
    pub fn new() -> Self {
        SjfScheduler
    }

    pub fn step(
        &mut self,
        inner: &mut QueueInner,
        executor: &Executor,
        metrics: &MetricsCollector,
    ) -> StepOutcome {
        let Some(handle) = inner.store.head() else {
            // The caller only steps with work available; an empty store here
            // means the turn evaporated, not that something broke.
            return StepOutcome::Lost;
        };
        self.debug_check_head_is_minimum(inner);

        let Some(record) = inner.store.get_mut(handle) else {
            log::debug!("head record vanished before execution");
            return StepOutcome::Lost;
        };
        let created_at = record.created_at();
        let step = executor.execute(record, ExecMode::ToCompletion);
        let finished_at = Instant::now();
        debug_assert!(step.completed, "run-to-completion must finish the record");

        let first_run_at = record
            .first_run_at()
            .expect("an executed record has a first-run stamp");
        let response_ms = elapsed_ms(created_at, first_run_at);
        if step.first_run {
            metrics.record_first_run(response_ms);
        }

        match inner.store.remove(handle) {
            Ok(record) => {
                debug_assert!(record.is_finished());
                metrics.record_completion(CompletionEvent {
                    id: record.id(),
                    response_ms,
                    turnaround_ms: elapsed_ms(created_at, finished_at),
                });
                StepOutcome::Completed(record.id())
            }
            Err(StoreError::NotFound) => {
                log::debug!("record already removed by a racing consumer");
                StepOutcome::Lost
            }
        }
    }

    /// The head must never have a longer burst than anything behind it.
    fn debug_check_head_is_minimum(&self, inner: &QueueInner) {
        if cfg!(debug_assertions) {
            let mut bursts = inner.store.records().map(|r| r.remaining_burst());
            if let Some(head) = bursts.next() {
                assert!(
                    bursts.all(|b| b >= head),
                    "invariant violation: store head is not the shortest job"
                );
            }
        }
    }
}
