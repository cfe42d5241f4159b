// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Empirical CDF accumulation across trials.
use log::*;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::Serialize;

use crate::ensure_config;
use crate::errors::{NomaError, Result};

mod cdf;

pub use cdf::{mean_from_cdf, pdf_from_cdf, percentile_threshold};

/// Counts, per metric, how many trials fell at or below each threshold.
///
/// The threshold axis runs linearly from 0 to `max_value`.  Values above
/// `max_value` are recorded as trials but never counted in any bin, so their
/// CDF row saturates below 1; choose `max_value` to cover the metric's range.
#[derive(Debug, Clone, PartialEq)]
pub struct CdfAccumulator {
    max_value: f64,
    thresholds: Array1<f64>,
    counts: Array2<u64>,
    n_trials: u64,
}

impl CdfAccumulator {
    pub fn new(max_value: f64, n_metrics: usize, n_bins: usize) -> Result<CdfAccumulator> {
        ensure_config!(
            max_value.is_finite() && max_value > 0.0,
            "CDF upper bound must be positive (got {})",
            max_value
        );
        ensure_config!(n_metrics > 0, "CDF needs at least one metric");
        ensure_config!(n_bins >= 2, "CDF needs at least two bins (got {})", n_bins);

        let last = n_bins - 1;
        let mut thresholds = Array1::from_shape_fn(n_bins, |i| i as f64 * max_value / last as f64);
        // rounding must not leave the top edge below the upper bound
        thresholds[last] = max_value;
        Ok(CdfAccumulator {
            max_value,
            thresholds,
            counts: Array2::zeros((n_metrics, n_bins)),
            n_trials: 0,
        })
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn n_metrics(&self) -> usize {
        self.counts.nrows()
    }

    pub fn n_bins(&self) -> usize {
        self.counts.ncols()
    }

    pub fn n_trials(&self) -> u64 {
        self.n_trials
    }

    pub fn thresholds(&self) -> ArrayView1<'_, f64> {
        self.thresholds.view()
    }

    /// Raw counter row for one metric.
    pub fn counts(&self, metric: usize) -> ArrayView1<'_, u64> {
        self.counts.row(metric)
    }

    /// Record one trial's metric values.
    ///
    /// Bin `i` of metric `j` is incremented iff `values[j] <= threshold[i]`.
    /// The whole record is rejected, with no counter touched, if the length is
    /// wrong or any value is NaN.
    pub fn record(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.n_metrics() {
            return Err(NomaError::Precondition(format!(
                "expected {} metric values, got {}",
                self.n_metrics(),
                values.len()
            )));
        }
        if values.iter().any(|v| v.is_nan()) {
            return Err(NomaError::Domain("cannot record a NaN metric".into()));
        }

        for (mut row, value) in self.counts.outer_iter_mut().zip(values) {
            // thresholds ascend, so the counted bins form a suffix
            let start = self.thresholds.iter().position(|t| *value <= *t);
            if let Some(start) = start {
                row.slice_mut(ndarray::s![start..]).mapv_inplace(|c| c + 1);
            }
        }
        self.n_trials += 1;
        Ok(())
    }

    /// Add another accumulator's counts into this one.
    pub fn merge(&mut self, other: &CdfAccumulator) -> Result<()> {
        if self.counts.dim() != other.counts.dim() || self.max_value != other.max_value {
            return Err(NomaError::Precondition(format!(
                "cannot merge {:?} bins up to {} into {:?} bins up to {}",
                other.counts.dim(),
                other.max_value,
                self.counts.dim(),
                self.max_value
            )));
        }
        self.counts += &other.counts;
        self.n_trials += other.n_trials;
        Ok(())
    }

    /// Normalize the counts by the number of recorded trials.
    pub fn finish(&self) -> Result<CdfTable> {
        if self.n_trials == 0 {
            return Err(NomaError::Precondition(
                "no trials recorded, CDF is undefined".into(),
            ));
        }
        debug!(
            "normalizing {}x{} CDF over {} trials",
            self.n_metrics(),
            self.n_bins(),
            self.n_trials
        );
        let n = self.n_trials as f64;
        Ok(CdfTable {
            thresholds: self.thresholds.clone(),
            cdf: self.counts.mapv(|c| c as f64 / n),
            n_trials: self.n_trials,
        })
    }
}

/// A normalized CDF, one row per metric.
#[derive(Debug, Clone, PartialEq)]
pub struct CdfTable {
    pub thresholds: Array1<f64>,
    pub cdf: Array2<f64>,
    pub n_trials: u64,
}

/// Summary indicators for one metric, derived from its CDF row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CdfSummary {
    pub mean: f64,
    /// Threshold closest to the 5% point ("cell-edge" value).
    pub p05: Option<f64>,
    pub median: Option<f64>,
    pub thresholds: Vec<f64>,
    pub cdf: Vec<f64>,
}

impl CdfTable {
    pub fn n_metrics(&self) -> usize {
        self.cdf.nrows()
    }

    pub fn row(&self, metric: usize) -> ArrayView1<'_, f64> {
        self.cdf.index_axis(Axis(0), metric)
    }

    pub fn pdf(&self, metric: usize) -> Array1<f64> {
        pdf_from_cdf(self.row(metric))
    }

    pub fn mean(&self, metric: usize) -> f64 {
        mean_from_cdf(self.thresholds.view(), self.row(metric))
    }

    pub fn percentile(&self, metric: usize, target: f64) -> Option<f64> {
        percentile_threshold(self.thresholds.view(), self.row(metric), target)
    }

    pub fn summary(&self, metric: usize) -> CdfSummary {
        CdfSummary {
            mean: self.mean(metric),
            p05: self.percentile(metric, 0.05),
            median: self.percentile(metric, 0.5),
            thresholds: self.thresholds.to_vec(),
            cdf: self.row(metric).to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_thresholds() {
        let acc = CdfAccumulator::new(100.0, 1, 5).unwrap();
        assert_eq!(acc.thresholds(), array![0.0, 25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn test_record_single() {
        let mut acc = CdfAccumulator::new(100.0, 1, 5).unwrap();
        acc.record(&[60.0]).unwrap();
        assert_eq!(acc.counts(0), array![0u64, 0, 0, 1, 1]);
        assert_eq!(acc.n_trials(), 1);
    }

    #[test]
    fn test_record_boundary_inclusive() {
        let mut acc = CdfAccumulator::new(100.0, 1, 5).unwrap();
        acc.record(&[50.0]).unwrap();
        acc.record(&[0.0]).unwrap();
        assert_eq!(acc.counts(0), array![1u64, 1, 2, 2, 2]);
    }

    #[test]
    fn test_saturation_above_max() {
        let mut acc = CdfAccumulator::new(100.0, 1, 5).unwrap();
        acc.record(&[10.0]).unwrap();
        acc.record(&[150.0]).unwrap();
        let table = acc.finish().unwrap();
        // the out-of-range trial keeps the last bin below 1
        assert_eq!(table.row(0)[4], 0.5);
    }

    #[test]
    fn test_upper_bound_reaches_last_bin() {
        let mut acc = CdfAccumulator::new(1.0, 1, 50).unwrap();
        assert_eq!(acc.thresholds()[49], 1.0);
        acc.record(&[1.0]).unwrap();
        let table = acc.finish().unwrap();
        assert_eq!(table.row(0)[49], 1.0);
        assert_eq!(table.row(0)[48], 0.0);
    }

    #[test]
    fn test_multi_metric() {
        let mut acc = CdfAccumulator::new(1.0, 3, 3).unwrap();
        acc.record(&[0.0, 0.4, 1.0]).unwrap();
        assert_eq!(acc.counts(0), array![1u64, 1, 1]);
        assert_eq!(acc.counts(1), array![0u64, 1, 1]);
        assert_eq!(acc.counts(2), array![0u64, 0, 1]);
    }

    #[test]
    fn test_record_rejects_whole_trial() {
        let mut acc = CdfAccumulator::new(1.0, 2, 3).unwrap();
        assert!(matches!(
            acc.record(&[0.5]),
            Err(NomaError::Precondition(_))
        ));
        assert!(matches!(
            acc.record(&[0.5, f64::NAN]),
            Err(NomaError::Domain(_))
        ));
        assert_eq!(acc.n_trials(), 0);
        assert_eq!(acc.counts(0).sum(), 0);
    }

    #[test]
    fn test_cdf_monotone() {
        let mut acc = CdfAccumulator::new(10.0, 1, 11).unwrap();
        for v in [0.3, 2.2, 9.9, 4.5, 4.5, 7.1, 1.0] {
            acc.record(&[v]).unwrap();
        }
        let table = acc.finish().unwrap();
        let row = table.row(0);
        for i in 1..row.len() {
            assert!(row[i] >= row[i - 1]);
        }
        assert_eq!(row[row.len() - 1], 1.0);
    }

    #[test]
    fn test_merge_matches_sequential() {
        let values = [0.1, 0.9, 0.35, 0.6, 0.75, 0.2];
        let mut whole = CdfAccumulator::new(1.0, 1, 6).unwrap();
        let mut left = whole.clone();
        let mut right = whole.clone();
        for (i, v) in values.iter().enumerate() {
            whole.record(&[*v]).unwrap();
            if i % 2 == 0 {
                left.record(&[*v]).unwrap();
            } else {
                right.record(&[*v]).unwrap();
            }
        }
        left.merge(&right).unwrap();
        assert_eq!(left, whole);

        let other = CdfAccumulator::new(2.0, 1, 6).unwrap();
        assert!(left.merge(&other).is_err());
    }

    #[test]
    fn test_finish_requires_trials() {
        let acc = CdfAccumulator::new(1.0, 1, 4).unwrap();
        assert!(matches!(acc.finish(), Err(NomaError::Precondition(_))));
    }

    #[test]
    fn test_summary_mean() {
        let mut acc = CdfAccumulator::new(4.0, 1, 5).unwrap();
        for v in [1.0, 3.0] {
            acc.record(&[v]).unwrap();
        }
        let table = acc.finish().unwrap();
        // cdf [0, .5, .5, 1, 1] -> pdf [.5, .5, 0, .5, 0]
        assert_abs_diff_eq!(table.mean(0), 0.5 * 1.0 + 0.5 * 3.0);
        let summary = table.summary(0);
        assert_eq!(summary.median, Some(1.0));
        assert_eq!(summary.cdf.len(), 5);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(CdfAccumulator::new(0.0, 1, 5).is_err());
        assert!(CdfAccumulator::new(1.0, 0, 5).is_err());
        assert!(matches!(
            CdfAccumulator::new(1.0, 1, 1),
            Err(NomaError::Configuration(_))
        ));
    }
}
