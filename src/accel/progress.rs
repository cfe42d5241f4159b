// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use std::sync::RwLock;
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Instant,
};

use log::*;

const UPDATE_SECS: f64 = 0.2;

#[derive(Clone, Copy)]
struct UpdateState {
    count: usize,
    time: f64,
    rate: f64,
}

/// Throttled progress reporting through the log facade.
///
/// Safe to advance from many worker threads; at most one record is logged
/// per update interval.
pub(crate) struct ProgressHandle {
    label: String,
    total: usize,
    start: Instant,
    count: AtomicUsize,
    last_update: RwLock<Option<UpdateState>>,
}

impl ProgressHandle {
    pub fn new(label: &str, total: usize) -> Self {
        ProgressHandle {
            label: label.to_string(),
            total,
            count: AtomicUsize::new(0),
            start: Instant::now(),
            last_update: RwLock::new(None),
        }
    }

    pub fn tick(&self) {
        self.advance(1);
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn advance(&self, n: usize) {
        let count = self.count.fetch_add(n, Ordering::Relaxed) + n;

        // a poisoned lock only means a reporter panicked; skip the update
        let last_update = match self.last_update.read() {
            Ok(lock) => *lock,
            Err(_) => return,
        };

        let thresh = if let Some(lu) = last_update {
            // bail early if the rate estimate says we don't need to update
            let n = count.saturating_sub(lu.count) as f64;
            if n / lu.rate < UPDATE_SECS * 0.95 {
                return;
            }

            lu.time
        } else {
            0.0
        };

        let time = self.start.elapsed().as_secs_f64();
        if time < thresh + UPDATE_SECS {
            return;
        }

        // if someone else is writing, they've handled it
        if let Ok(mut lock) = self.last_update.try_write() {
            *lock = Some(UpdateState {
                count,
                time,
                rate: count as f64 / time,
            });
            self.refresh(count, time);
        }
    }

    fn refresh(&self, count: usize, time: f64) {
        info!(
            "{}: {}/{} ({:.1}/s)",
            self.label,
            count,
            self.total,
            count as f64 / time
        );
    }

    /// Log the final count and elapsed time.
    pub fn finish(&self) {
        let time = self.start.elapsed().as_secs_f64();
        info!(
            "{}: finished {}/{} in {:.2}s",
            self.label,
            self.count(),
            self.total,
            time
        );
    }
}

#[test]
fn test_progress_counts() {
    use rayon::prelude::*;

    let pb = ProgressHandle::new("test", 1000);
    (0..1000).into_par_iter().for_each(|_| pb.tick());
    pb.advance(5);
    assert_eq!(pb.count(), 1005);
}
