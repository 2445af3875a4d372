//! Shared work queue: one mutex, two condition variables.
//!
//! This layer owns every piece of state the producer and consumer threads
//! share: the [`ProcessStore`], the production-finished flag, and the
//! condition variables that replace the original polling loops. The rules:
//!
//! 1. Any read or mutation of store topology happens under the single mutex,
//!    through RAII guards only, so no exit path can leave the lock held.
//! 2. The producer blocks on `space` while the store is at capacity and is
//!    woken by every removal.
//! 3. Consumers block on `work` while their turn is not available and are
//!    woken by every insert, by every removal, by the production-finished
//!    transition, and by cancellation.
//!
//! The production-finished flag lives inside the mutex, so a consumer can
//! never observe a torn "finished but store not yet final" state.

use crate::process::ProcessRecord;
use crate::store::{InsertDiscipline, ProcHandle, ProcessStore};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared by every task of a run.
///
/// Setting the token does not wake sleepers by itself; pair it with
/// [`WorkQueue::wake_all`] so blocked threads re-check their predicates.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// State behind the work queue mutex.
pub struct QueueInner {
    pub store: ProcessStore,
    production_finished: bool,
}

impl QueueInner {
    pub fn production_finished(&self) -> bool {
        self.production_finished
    }
}

/// Bounded, condvar-signalled wrapper around the process store.
pub struct WorkQueue {
    inner: Mutex<QueueInner>,
    /// Producer side: capacity became available.
    space: Condvar,
    /// Consumer side: work arrived, a removal shifted offsets, production
    /// finished, or the run was cancelled.
    work: Condvar,
    capacity: usize,
}

impl WorkQueue {
    pub fn new(discipline: InsertDiscipline, capacity: usize) -> Self {
        assert!(capacity >= 1, "admission gate needs capacity of at least 1");
        Self {
            inner: Mutex::new(QueueInner {
                store: ProcessStore::new(discipline),
                production_finished: false,
            }),
            space: Condvar::new(),
            work: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live records right now (takes the lock).
    pub fn len(&self) -> usize {
        self.inner.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Admission-gated insert used by the producer.
    ///
    /// Suspends (no busy-wait) while the store is at capacity; one waiting
    /// producer is released per removal. Returns the new record's handle, or
    /// `None` when the run was cancelled before space became available.
    pub fn insert_blocking(
        &self,
        mut record: ProcessRecord,
        cancel: &CancelToken,
    ) -> Option<ProcHandle> {
        let mut inner = self.inner.lock();
        while inner.store.len() >= self.capacity {
            if cancel.is_cancelled() {
                return None;
            }
            self.space.wait(&mut inner);
        }
        if cancel.is_cancelled() {
            return None;
        }
        debug_assert!(
            inner.store.len() < self.capacity,
            "admission gate bypassed: insert attempted at capacity"
        );
        record.mark_ready();
        let handle = inner.store.insert(record);
        drop(inner);
        self.work.notify_all();
        Some(handle)
    }

    /// Flip the production-finished flag (exactly once) and wake every
    /// consumer so empty-store waiters can re-evaluate their exit predicate.
    pub fn finish_production(&self) {
        let mut inner = self.inner.lock();
        inner.production_finished = true;
        drop(inner);
        self.work.notify_all();
    }

    /// Block until the record at `offset` from the head is available.
    ///
    /// Returns the guard over the shared state, so the caller performs its
    /// whole select-execute-remove sequence under it. Returns `None` once
    /// this consumer is done:
    /// - the run was cancelled, or
    /// - production has finished and the store can never again grow to
    ///   `offset + 1` records. For offset 0 that is the plain "finished and
    ///   drained" exit; for positional consumers it also covers the
    ///   shrunk-below-my-offset case, where no turn can ever come.
    pub fn wait_for_turn(
        &self,
        offset: usize,
        cancel: &CancelToken,
    ) -> Option<MutexGuard<'_, QueueInner>> {
        let mut inner = self.inner.lock();
        loop {
            if cancel.is_cancelled() {
                return None;
            }
            if inner.store.len() > offset {
                return Some(inner);
            }
            if inner.production_finished {
                return None;
            }
            self.work.wait(&mut inner);
        }
    }

    /// Take the lock without waiting. For observers and tests; worker loops
    /// go through [`WorkQueue::wait_for_turn`].
    pub fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock()
    }

    /// Signal that a record left the store: releases one blocked producer and
    /// re-checks every consumer, since a removal shifts positional offsets
    /// and may complete the drain.
    pub fn notify_removal(&self) {
        self.space.notify_one();
        self.work.notify_all();
    }

    /// Wake every sleeper regardless of state. Used on cancellation.
    pub fn wake_all(&self) {
        self.space.notify_all();
        self.work.notify_all();
    }
}
