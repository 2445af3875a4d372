//! Run-wide metrics aggregation.
//!
//! Consumers report two moments per process: the first time it runs
//! (response time) and the execution that retires it (turnaround time).
//! Totals are plain atomics so increments from concurrent consumers never
//! tear, and every completion is additionally published on a channel for the
//! reporting layer; the aggregator itself never formats anything.

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-record completion notice for the reporting sink.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionEvent {
    pub id: u64,
    pub response_ms: u64,
    pub turnaround_ms: u64,
}

/// Snapshot of the accumulated totals.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub finished: u64,
    pub total_response_ms: u64,
    pub total_turnaround_ms: u64,
}

pub struct MetricsCollector {
    total_response_ms: AtomicU64,
    total_turnaround_ms: AtomicU64,
    first_runs: AtomicU64,
    finished: AtomicU64,
    events_tx: Sender<CompletionEvent>,
}

impl MetricsCollector {
    /// Build a collector plus the receiving end of its completion stream.
    pub fn new() -> (Self, Receiver<CompletionEvent>) {
        let (events_tx, events_rx) = unbounded();
        let collector = Self {
            total_response_ms: AtomicU64::new(0),
            total_turnaround_ms: AtomicU64::new(0),
            first_runs: AtomicU64::new(0),
            finished: AtomicU64::new(0),
            events_tx,
        };
        (collector, events_rx)
    }

    /// Account a record's response time. Called once per record, on its
    /// first execution.
    pub fn record_first_run(&self, response_ms: u64) {
        self.total_response_ms
            .fetch_add(response_ms, Ordering::Relaxed);
        self.first_runs.fetch_add(1, Ordering::Relaxed);
    }

    /// Account a record's turnaround time and publish its completion.
    pub fn record_completion(&self, event: CompletionEvent) {
        self.total_turnaround_ms
            .fetch_add(event.turnaround_ms, Ordering::Relaxed);
        self.finished.fetch_add(1, Ordering::Relaxed);
        // The receiver may already be gone during teardown; losing the event
        // is fine, the totals above are authoritative.
        let _ = self.events_tx.send(event);
    }

    pub fn total_response_ms(&self) -> u64 {
        self.total_response_ms.load(Ordering::Relaxed)
    }

    pub fn total_turnaround_ms(&self) -> u64 {
        self.total_turnaround_ms.load(Ordering::Relaxed)
    }

    pub fn first_runs(&self) -> u64 {
        self.first_runs.load(Ordering::Relaxed)
    }

    pub fn finished_count(&self) -> u64 {
        self.finished.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            finished: self.finished_count(),
            total_response_ms: self.total_response_ms(),
            total_turnaround_ms: self.total_turnaround_ms(),
        }
    }
}
