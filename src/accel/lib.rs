// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Accelerated core of the NOMA system-level simulator: user pairing,
//! power and band allocation, rate evaluation and CDF statistics.
#[cfg(feature = "python")]
use pyo3::prelude::*;

pub mod errors;

pub mod allocation;
pub mod capacity;
pub mod config;
pub mod pairing;
pub mod parallel;
mod progress;
pub mod rates;
pub mod simulation;
pub mod stats;
pub mod strategy;
pub mod types;

#[cfg(feature = "python")]
mod python;

pub use errors::{NomaError, Result};

/// Entry point for the NOMA-Sim accelerator module.
#[cfg(feature = "python")]
#[pymodule]
fn _accel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();
    python::register_capacity(m)?;
    python::register_stats(m)?;
    python::register_simulation(m)?;

    Ok(())
}
