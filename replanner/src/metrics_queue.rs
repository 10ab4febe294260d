/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Bounded-age metrics queue.
//!
//! A mutex-guarded ring buffer for per-cycle samples.  Producers never block:
//! when the ring is busy the sample lands in a pending buffer that the next
//! holder of the ring lock flushes in arrival order.
//!
//! | Operation | Lock      | On contention                 |
//! |-----------|-----------|-------------------------------|
//! | `push`    | try-lock  | sample buffered as pending    |
//! | `shrink`  | try-lock  | returns `None`, nothing freed |
//! | `lock`    | blocking  | waits                         |
//!
//! All three flush pending samples once they hold the ring.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};

const INITIAL_CAPACITY: usize = 16;
const DEFAULT_MAX_AGE: Duration = Duration::from_secs(3600);

pub trait Timestamped {
    fn timestamp(&self) -> Instant;
}

pub struct MetricsQueue<T> {
    ring: Mutex<VecDeque<T>>,
    pending: Mutex<Vec<T>>,
    max_age: Duration,
}

impl<T: Timestamped> Default for MetricsQueue<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE)
    }
}

impl<T: Timestamped> MetricsQueue<T> {
    pub fn new(max_age: Duration) -> Self {
        Self {
            ring: Mutex::new(VecDeque::with_capacity(INITIAL_CAPACITY)),
            pending: Mutex::new(Vec::new()),
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn push(&self, item: T) {
        let Some(mut ring) = self.ring.try_lock() else {
            self.pending.lock().push(item);
            return;
        };
        self.flush_pending(&mut ring);
        push_back(&mut ring, item);
    }

    /// Moves parked samples into the ring.  Callers hold the ring lock.
    fn flush_pending(&self, ring: &mut VecDeque<T>) {
        for queued in self.pending.lock().drain(..) {
            push_back(ring, queued);
        }
    }

    /// Evicts samples older than `now - max_age`.  Returns the number
    /// evicted, or `None` when the ring is busy.
    pub fn shrink(&self, now: Instant) -> Option<usize> {
        let mut ring = self.ring.try_lock()?;
        self.flush_pending(&mut ring);
        let Some(horizon) = now.checked_sub(self.max_age) else {
            return Some(0);
        };
        let mut evicted = 0;
        while ring.front().is_some_and(|oldest| oldest.timestamp() < horizon) {
            ring.pop_front();
            evicted += 1;
        }
        Some(evicted)
    }

    /// Exclusive access to the ring, oldest sample first.  Pending samples
    /// are flushed in first.
    pub fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        let mut ring = self.ring.lock();
        self.flush_pending(&mut ring);
        ring
    }

    /// Samples in the ring plus samples still pending.
    pub fn len(&self) -> usize {
        self.ring.lock().len() + self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Capacity doubles when the ring is full.
fn push_back<T>(ring: &mut VecDeque<T>, item: T) {
    if ring.len() == ring.capacity() {
        let grow = ring.capacity().max(INITIAL_CAPACITY);
        ring.reserve_exact(grow);
    }
    ring.push_back(item);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
