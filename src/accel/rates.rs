// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Achieved rates of paired users, and Jain's fairness index.
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::capacity::CapacityModel;
use crate::errors::{NomaError, Result};
use crate::types::{Pair, User, PAIR_SIZE};

/// Per-pair rates, in decoding order.
pub type PairRates = [f64; PAIR_SIZE];

/// Multiple-access scheme used to evaluate a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Shared resource with successive interference cancellation.
    #[default]
    Noma,
    /// Exclusive bandwidth fractions.
    Oma,
}

impl Access {
    /// Evaluate a pair under this scheme.
    pub fn throughput(&self, pair: &Pair, bw_sb: f64, model: CapacityModel) -> Result<PairRates> {
        match self {
            Access::Noma => throughput_noma(pair, bw_sb, model),
            Access::Oma => throughput_oma(pair, bw_sb, model),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Access::Noma => "noma",
            Access::Oma => "oma",
        }
    }
}

impl FromStr for Access {
    type Err = NomaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "noma" => Ok(Access::Noma),
            "oma" => Ok(Access::Oma),
            _ => Err(NomaError::Configuration(format!(
                "unknown access scheme: {}",
                s
            ))),
        }
    }
}

/// NOMA rates with successive interference cancellation.
///
/// Users are processed in decoding order.  Each user sees the power of every
/// user processed before it as interference, scaled by its own SINR; later
/// users contribute no interference to earlier ones.  The result therefore
/// depends on the order of the pair.
pub fn throughput_noma(pair: &Pair, bw_sb: f64, model: CapacityModel) -> Result<PairRates> {
    // read all coefficients first, so a missing one fails before any work
    let powers = [pair.first().require_power()?, pair.second().require_power()?];

    let mut rates = [0.0; PAIR_SIZE];
    let mut interference = 0.0;
    for (i, (user, power)) in pair.decoding_order().iter().zip(powers).enumerate() {
        let eff = user
            .sinr()
            .mapv(|s| power * s / (interference * s + 1.0));
        rates[i] = model.rates(&eff, bw_sb).mean().unwrap_or_default();
        interference += power;
    }
    Ok(rates)
}

/// OMA rates on exclusive bandwidth fractions.
///
/// Each user transmits on its band share, with its power share spread over
/// that band.  A user with a zero band share gets no rate.
pub fn throughput_oma(pair: &Pair, bw_sb: f64, model: CapacityModel) -> Result<PairRates> {
    let mut coeffs = [(0.0, 0.0); PAIR_SIZE];
    for (slot, user) in coeffs.iter_mut().zip(pair.decoding_order()) {
        *slot = (user.require_power()?, user.require_band()?);
    }

    let mut rates = [0.0; PAIR_SIZE];
    for (i, (user, (power, band))) in pair.decoding_order().iter().zip(coeffs).enumerate() {
        if band == 0.0 {
            continue;
        }
        let eff = user.sinr().mapv(|s| s * (power / band));
        let r = model.rates(&eff, bw_sb) * band;
        rates[i] = r.mean().unwrap_or_default();
    }
    Ok(rates)
}

/// Rate the user would get alone on the whole resource.
pub fn exclusive_rate(user: &User, bw_sb: f64, model: CapacityModel) -> f64 {
    model.rates(user.sinr(), bw_sb).mean().unwrap_or_default()
}

/// Jain's fairness index `(sum x)^2 / (n * sum x^2)`.
///
/// Ranges from `1/n` (one user takes everything) to `1` (all equal).  An
/// all-zero input counts as perfectly equal.
pub fn jain(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(NomaError::Precondition(
            "Jain's index needs at least one value".into(),
        ));
    }
    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    let sum_sq: f64 = values.iter().map(|x| x * x).sum();
    if sum_sq == 0.0 {
        return Ok(1.0);
    }
    Ok(sum * sum / (n * sum_sq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{BandPolicy, PowerPolicy};
    use crate::types::test_support::scalar_users;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn pair_of(first: f64, second: f64) -> Pair {
        let mut users = scalar_users(&[first, second]).into_iter();
        Pair::new(0, users.next().unwrap(), users.next().unwrap())
    }

    #[test]
    fn test_jain_examples() {
        assert_eq!(jain(&[1.0, 1.0, 1.0, 1.0]).unwrap(), 1.0);
        assert_eq!(jain(&[4.0, 0.0, 0.0, 0.0]).unwrap(), 0.25);
        assert_eq!(jain(&[0.0, 0.0]).unwrap(), 1.0);
        assert!(matches!(jain(&[]), Err(NomaError::Precondition(_))));
    }

    #[test]
    fn test_jain_range() {
        let j = jain(&[1.0, 2.0, 3.0]).unwrap();
        assert!(j > 1.0 / 3.0 && j < 1.0);
        assert_abs_diff_eq!(j, 36.0 / 42.0, epsilon = 1e-12);
    }

    #[test]
    fn test_noma_hand_computed() {
        let mut pair = pair_of(15.0, 3.0);
        PowerPolicy::Fixed { alpha: 0.5 }.apply(&mut pair).unwrap();
        let rates = throughput_noma(&pair, 1.0, CapacityModel::Shannon).unwrap();
        // first: 0.5*15 / 1 = 7.5; second: 0.5*3 / (0.5*3 + 1) = 0.6
        assert_abs_diff_eq!(rates[0], (8.5f64).log2(), epsilon = 1e-12);
        assert_abs_diff_eq!(rates[1], (1.6f64).log2(), epsilon = 1e-12);
    }

    #[test]
    fn test_noma_order_matters() {
        let mut pair = pair_of(15.0, 3.0);
        PowerPolicy::Fixed { alpha: 0.2 }.apply(&mut pair).unwrap();
        let fwd = throughput_noma(&pair, 1.0, CapacityModel::Shannon).unwrap();

        let rev = pair.reversed();
        let back = throughput_noma(&rev, 1.0, CapacityModel::Shannon).unwrap();
        assert_ne!(fwd, back);
        assert_ne!(fwd, [back[1], back[0]]);
    }

    #[test]
    fn test_noma_vector_sinr() {
        let a = User::new(0, array![3.0, 7.0]).unwrap();
        let b = User::new(1, array![1.0, 1.0]).unwrap();
        let mut pair = Pair::new(0, a, b);
        PowerPolicy::Fixed { alpha: 1.0 }.apply(&mut pair).unwrap();
        let rates = throughput_noma(&pair, 2.0, CapacityModel::Shannon).unwrap();
        // first: mean(2*log2(4), 2*log2(8)) = 5; second has no power
        assert_abs_diff_eq!(rates[0], 5.0, epsilon = 1e-12);
        assert_eq!(rates[1], 0.0);
    }

    #[test]
    fn test_noma_requires_power() {
        let pair = pair_of(3.0, 1.0);
        let res = throughput_noma(&pair, 1.0, CapacityModel::Shannon);
        assert!(matches!(res, Err(NomaError::Precondition(_))));
    }

    #[test]
    fn test_oma_hand_computed() {
        let mut pair = pair_of(7.0, 3.0);
        PowerPolicy::Equal.apply(&mut pair).unwrap();
        BandPolicy::Equal.apply(&mut pair);
        let rates = throughput_oma(&pair, 1.0, CapacityModel::Shannon).unwrap();
        // power share equals band share, so each gets half of the full-band capacity
        assert_abs_diff_eq!(rates[0], 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(rates[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_oma_requires_band() {
        let mut pair = pair_of(7.0, 3.0);
        PowerPolicy::Equal.apply(&mut pair).unwrap();
        let res = throughput_oma(&pair, 1.0, CapacityModel::Shannon);
        assert!(matches!(res, Err(NomaError::Precondition(_))));
    }

    #[test]
    fn test_oma_zero_band() {
        let mut pair = pair_of(7.0, 3.0);
        PowerPolicy::Equal.apply(&mut pair).unwrap();
        BandPolicy::Fair { beta: 0.0 }.apply(&mut pair);
        let rates = throughput_oma(&pair, 1.0, CapacityModel::Shannon).unwrap();
        assert_eq!(rates[0], 0.0);
        // second: band 1, power 0.5 -> log2(1 + 1.5)
        assert_abs_diff_eq!(rates[1], (2.5f64).log2(), epsilon = 1e-12);
    }

    #[test]
    fn test_exclusive_rate() {
        let users = scalar_users(&[7.0]);
        assert_eq!(exclusive_rate(&users[0], 1.0, CapacityModel::Shannon), 3.0);
    }

    #[test]
    fn test_access_dispatch() {
        let mut pair = pair_of(7.0, 3.0);
        PowerPolicy::Equal.apply(&mut pair).unwrap();
        BandPolicy::Equal.apply(&mut pair);
        let m = CapacityModel::Shannon;
        assert_eq!(
            Access::Oma.throughput(&pair, 1.0, m).unwrap(),
            throughput_oma(&pair, 1.0, m).unwrap()
        );
        assert_eq!("noma".parse::<Access>().unwrap(), Access::Noma);
        assert!("cdma".parse::<Access>().is_err());
    }
}
