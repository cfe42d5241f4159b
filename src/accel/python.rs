// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Python bindings.
use log::*;
use numpy::{
    IntoPyArray, PyArray1, PyArray2, PyArrayDyn, PyReadonlyArray3, PyReadonlyArrayDyn,
};
use pyo3::{
    exceptions::{PyRuntimeError, PyValueError},
    prelude::*,
};

use crate::{
    allocation,
    capacity::{self, CapacityModel, Scale},
    config::SimulationConfig,
    errors::NomaError,
    parallel, rates,
    simulation::{self, SinrTrials},
    stats::CdfAccumulator,
};

impl From<NomaError> for PyErr {
    fn from(err: NomaError) -> PyErr {
        match err {
            NomaError::Domain(_) | NomaError::Configuration(_) => {
                PyValueError::new_err(err.to_string())
            }
            NomaError::Precondition(_) => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

/// Register the nomasim._accel.capacity module
pub fn register_capacity(parent: &Bound<'_, PyModule>) -> PyResult<()> {
    let cap = PyModule::new(parent.py(), "capacity")?;
    parent.add_submodule(&cap)?;

    cap.add_function(wrap_pyfunction!(rate, &cap)?)?;
    cap.add_function(wrap_pyfunction!(amc_table, &cap)?)?;
    cap.add_function(wrap_pyfunction!(fair_alpha, &cap)?)?;

    Ok(())
}

/// Register the nomasim._accel.stats module
pub fn register_stats(parent: &Bound<'_, PyModule>) -> PyResult<()> {
    let stats = PyModule::new(parent.py(), "stats")?;
    parent.add_submodule(&stats)?;

    stats.add_class::<Statistics>()?;
    stats.add_function(wrap_pyfunction!(jain, &stats)?)?;

    Ok(())
}

/// Register the top-level simulation and thread pool functions.
pub fn register_simulation(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_function(wrap_pyfunction!(simulate, module)?)?;
    module.add_function(wrap_pyfunction!(init_pool, module)?)?;
    module.add_function(wrap_pyfunction!(thread_count, module)?)?;
    Ok(())
}

/// Rate of every SINR value under a capacity model.
#[pyfunction]
#[pyo3(signature = (sinr, model="shannon_attenuated", bw=1.0, scale="lin"))]
fn rate<'py>(
    py: Python<'py>,
    sinr: PyReadonlyArrayDyn<'py, f64>,
    model: &str,
    bw: f64,
    scale: &str,
) -> PyResult<Bound<'py, PyArrayDyn<f64>>> {
    let model: CapacityModel = model.parse()?;
    let scale: Scale = scale.parse()?;
    let out = model.rates_scaled(&sinr.as_array(), bw, scale);
    Ok(out.into_pyarray(py))
}

/// Spectral efficiency from the AMC table, for SINR in dB.
#[pyfunction]
fn amc_table<'py>(
    py: Python<'py>,
    sinr_db: PyReadonlyArrayDyn<'py, f64>,
) -> Bound<'py, PyArrayDyn<f64>> {
    capacity::amc_table(&sinr_db.as_array()).into_pyarray(py)
}

#[pyfunction]
fn fair_alpha(s: f64) -> PyResult<f64> {
    Ok(allocation::fair_alpha(s)?)
}

#[pyfunction]
fn jain(values: Vec<f64>) -> PyResult<f64> {
    Ok(rates::jain(&values)?)
}

/// Run a simulation over precomputed SINR samples.
///
/// `sinr_trials` has shape `(trials, users, samples)`; the result is the
/// report as JSON.
#[pyfunction]
fn simulate<'py>(
    py: Python<'py>,
    sinr_trials: PyReadonlyArray3<'py, f64>,
    config_json: &str,
) -> PyResult<String> {
    let config = SimulationConfig::from_json(config_json)?;
    let sinr = sinr_trials.as_array();
    debug!("simulating over SINR array of shape {:?}", sinr.dim());

    let report = py.allow_threads(|| {
        let source = SinrTrials::new(sinr);
        simulation::run(&config, &source)
    })?;
    Ok(report.to_json()?)
}

#[pyfunction]
fn init_pool(n_threads: usize) -> PyResult<()> {
    Ok(parallel::init_pool(n_threads)?)
}

#[pyfunction]
fn thread_count() -> usize {
    parallel::thread_count()
}

/// Empirical CDF accumulator.
#[pyclass]
pub struct Statistics {
    acc: CdfAccumulator,
}

#[pymethods]
impl Statistics {
    #[new]
    #[pyo3(signature = (max_value, n_metrics=1, n_bins=100))]
    fn new(max_value: f64, n_metrics: usize, n_bins: usize) -> PyResult<Self> {
        Ok(Statistics {
            acc: CdfAccumulator::new(max_value, n_metrics, n_bins)?,
        })
    }

    /// Record one trial's metric values.
    fn record(&mut self, values: Vec<f64>) -> PyResult<()> {
        Ok(self.acc.record(&values)?)
    }

    fn merge(&mut self, other: PyRef<'_, Statistics>) -> PyResult<()> {
        Ok(self.acc.merge(&other.acc)?)
    }

    #[getter]
    fn n_trials(&self) -> u64 {
        self.acc.n_trials()
    }

    fn thresholds<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.acc.thresholds().to_owned().into_pyarray(py)
    }

    /// The normalized CDF, one row per metric.
    fn cdf<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let table = self.acc.finish()?;
        Ok(table.cdf.into_pyarray(py))
    }

    fn pdf<'py>(&self, py: Python<'py>, metric: usize) -> PyResult<Bound<'py, PyArray1<f64>>> {
        self.check_metric(metric)?;
        Ok(self.acc.finish()?.pdf(metric).into_pyarray(py))
    }

    fn mean(&self, metric: usize) -> PyResult<f64> {
        self.check_metric(metric)?;
        Ok(self.acc.finish()?.mean(metric))
    }

    #[pyo3(signature = (metric, target=0.05))]
    fn percentile(&self, metric: usize, target: f64) -> PyResult<Option<f64>> {
        self.check_metric(metric)?;
        Ok(self.acc.finish()?.percentile(metric, target))
    }
}

impl Statistics {
    fn check_metric(&self, metric: usize) -> PyResult<()> {
        if metric >= self.acc.n_metrics() {
            return Err(PyValueError::new_err(format!(
                "metric {} out of range for {} metrics",
                metric,
                self.acc.n_metrics()
            )));
        }
        Ok(())
    }
}
