// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use log::*;
use rayon::{current_num_threads, ThreadPoolBuilder};

use crate::errors::{NomaError, Result};

/// Initialize the global worker pool.
///
/// Fails if the pool was already initialized (including implicitly, by
/// running any parallel work first).
pub fn init_pool(n_threads: usize) -> Result<()> {
    debug!("initializing simulation thread pool with {} threads", n_threads);
    ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
        .map_err(|e| NomaError::Configuration(format!("thread pool initialization error: {}", e)))
}

pub fn thread_count() -> usize {
    current_num_threads()
}

#[test]
fn test_thread_count_positive() {
    assert!(thread_count() >= 1);
}
