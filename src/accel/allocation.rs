// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Power (NOMA) and band (OMA) split within a pair.
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{NomaError, Result};
use crate::types::{Pair, PAIR_SIZE};
use crate::ensure_config;

/// Default power share of the first user under the fixed policy.
pub const DEFAULT_ALPHA: f64 = 0.2;
/// Default band share of the first user under the fair band policy.
pub const DEFAULT_BETA: f64 = 0.5;

/// Power-domain allocation policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerPolicy {
    /// Both users get `1/2`.
    Equal,
    /// `first` gets `alpha`, `second` gets `1 - alpha`.
    Fixed {
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    /// Closed-form split from the mean SINR `s` of `second`:
    /// `alpha = (sqrt(1 + s) - 1) / s`.
    Fair,
}

/// Frequency-domain allocation policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandPolicy {
    Equal,
    /// `first` gets `beta`, `second` gets `1 - beta`.
    Fair {
        #[serde(default = "default_beta")]
        beta: f64,
    },
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn default_beta() -> f64 {
    DEFAULT_BETA
}

impl Default for PowerPolicy {
    fn default() -> Self {
        PowerPolicy::Equal
    }
}

impl Default for BandPolicy {
    fn default() -> Self {
        BandPolicy::Equal
    }
}

/// The fair power coefficient of the first user, given the mean linear SINR
/// of the second.
pub fn fair_alpha(s: f64) -> Result<f64> {
    if s == 0.0 {
        return Err(NomaError::Domain(
            "fair power split is undefined for zero SINR".into(),
        ));
    }
    if !s.is_finite() || s < 0.0 {
        return Err(NomaError::Domain(format!(
            "fair power split needs a positive finite SINR (got {})",
            s
        )));
    }
    Ok(((1.0 + s).sqrt() - 1.0) / s)
}

fn equal_split() -> [f64; PAIR_SIZE] {
    let share = 1.0 / PAIR_SIZE as f64;
    [share; PAIR_SIZE]
}

impl PowerPolicy {
    /// Compute the coefficients for a pair, in decoding order, without
    /// writing them.  The fair policy reads only the second user's SINR.
    pub fn split(&self, pair: &Pair) -> Result<[f64; PAIR_SIZE]> {
        match *self {
            PowerPolicy::Equal => Ok(equal_split()),
            PowerPolicy::Fixed { alpha } => Ok([alpha, 1.0 - alpha]),
            PowerPolicy::Fair => {
                let alpha = fair_alpha(pair.second().mean_sinr())?;
                Ok([alpha, 1.0 - alpha])
            }
        }
    }

    /// Write power coefficients on both users of the pair.
    pub fn apply(&self, pair: &mut Pair) -> Result<()> {
        let coeffs = self.split(pair)?;
        for (user, c) in pair.users_mut().iter_mut().zip(coeffs) {
            user.set_power(c);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if let PowerPolicy::Fixed { alpha } = *self {
            ensure_config!(
                (0.0..=1.0).contains(&alpha),
                "power coefficient alpha must lie in [0, 1] (got {})",
                alpha
            );
        }
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        match self {
            PowerPolicy::Equal => "equal",
            PowerPolicy::Fixed { .. } => "fixed",
            PowerPolicy::Fair => "fair",
        }
    }
}

impl BandPolicy {
    pub fn split(&self) -> [f64; PAIR_SIZE] {
        match *self {
            BandPolicy::Equal => equal_split(),
            BandPolicy::Fair { beta } => [beta, 1.0 - beta],
        }
    }

    /// Write band coefficients on both users of the pair.
    pub fn apply(&self, pair: &mut Pair) {
        let coeffs = self.split();
        for (user, c) in pair.users_mut().iter_mut().zip(coeffs) {
            user.set_band(c);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let BandPolicy::Fair { beta } = *self {
            ensure_config!(
                (0.0..=1.0).contains(&beta),
                "band coefficient beta must lie in [0, 1] (got {})",
                beta
            );
        }
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        match self {
            BandPolicy::Equal => "equal",
            BandPolicy::Fair { .. } => "fair",
        }
    }
}

impl FromStr for PowerPolicy {
    type Err = NomaError;

    /// Parse a policy name; `fixed` takes the default alpha.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "equal" => Ok(PowerPolicy::Equal),
            "fixed" | "fix" => Ok(PowerPolicy::Fixed {
                alpha: DEFAULT_ALPHA,
            }),
            "fair" => Ok(PowerPolicy::Fair),
            _ => Err(NomaError::Configuration(format!(
                "unknown power allocation mode: {}",
                s
            ))),
        }
    }
}

impl FromStr for BandPolicy {
    type Err = NomaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "equal" => Ok(BandPolicy::Equal),
            "fair" => Ok(BandPolicy::Fair { beta: DEFAULT_BETA }),
            _ => Err(NomaError::Configuration(format!(
                "unknown band allocation mode: {}",
                s
            ))),
        }
    }
}
