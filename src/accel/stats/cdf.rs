// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Indicators derived from a normalized CDF row.
use ndarray::{Array1, ArrayView1};

/// Approximate a PDF by differencing a CDF.
///
/// The first difference is repeated so the result has the CDF's length.
/// Rows with fewer than two bins give all zeros.
pub fn pdf_from_cdf(cdf: ArrayView1<'_, f64>) -> Array1<f64> {
    let n = cdf.len();
    if n < 2 {
        return Array1::zeros(n);
    }
    let mut pdf = Array1::zeros(n);
    for i in 1..n {
        pdf[i] = cdf[i] - cdf[i - 1];
    }
    pdf[0] = pdf[1];
    pdf
}

/// Mean of the distribution, as `sum(threshold * pdf)`.
pub fn mean_from_cdf(thresholds: ArrayView1<'_, f64>, cdf: ArrayView1<'_, f64>) -> f64 {
    let pdf = pdf_from_cdf(cdf);
    thresholds.dot(&pdf)
}

/// Find the threshold whose CDF value is closest to `target`.
///
/// Scans for the first bin whose CDF reaches `target`, then picks between it
/// and its predecessor by distance in CDF space; the later bin wins ties.
/// Returns `None` if the CDF never reaches `target`.
pub fn percentile_threshold(
    thresholds: ArrayView1<'_, f64>,
    cdf: ArrayView1<'_, f64>,
    target: f64,
) -> Option<f64> {
    let i = cdf.iter().position(|c| *c >= target)?;
    if i == 0 {
        return Some(thresholds[0]);
    }
    let below = (target - cdf[i - 1]).abs();
    let above = (cdf[i] - target).abs();
    if below < above {
        Some(thresholds[i - 1])
    } else {
        Some(thresholds[i])
    }
}
