// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Link-adaptation capacity models.
//!
//! Every model maps an SINR and a bandwidth to a rate (spectral efficiency
//! times bandwidth).  The scalar kernels are plain functions; [CapacityModel]
//! selects one of them and applies it elementwise to arrays of any shape.
use std::fmt;
use std::str::FromStr;

use ndarray::{Array, ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};

use crate::errors::{NomaError, Result};

/// Highest spectral efficiency of the MCS table (948/1024 code rate, 64-QAM).
pub const R_MAX_NORM: f64 = 948.0 * 6.0 / 1024.0;

/// Default decoder efficiency relative to the Shannon bound.
pub const SHANNON_ATTENUATION: f64 = 0.75;

/// One interval of the AMC table: SINR (dB) up to and including
/// `upper_db` maps to `code_rate * modulation_bits / 1024`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmcEntry {
    pub upper_db: f64,
    pub code_rate: u32,
    pub modulation_bits: u32,
}

impl AmcEntry {
    const fn new(upper_db: f64, code_rate: u32, modulation_bits: u32) -> AmcEntry {
        AmcEntry {
            upper_db,
            code_rate,
            modulation_bits,
        }
    }

    /// Spectral efficiency in bit/s/Hz.
    pub fn efficiency(&self) -> f64 {
        (self.code_rate * self.modulation_bits) as f64 / 1024.0
    }
}

/// LTE CQI table.  Intervals are open below and closed above; the first row
/// catches everything at or below -9.478 dB (no throughput) and the last
/// everything above 19.809 dB.
pub const AMC_TABLE: [AmcEntry; 16] = [
    AmcEntry::new(-9.478, 0, 2),
    AmcEntry::new(-6.658, 78, 2),
    AmcEntry::new(-4.098, 120, 2),
    AmcEntry::new(-1.798, 193, 2),
    AmcEntry::new(0.399, 308, 2),
    AmcEntry::new(2.424, 449, 2),
    AmcEntry::new(4.489, 602, 2),
    AmcEntry::new(6.367, 378, 4),
    AmcEntry::new(8.456, 490, 4),
    AmcEntry::new(10.266, 616, 4),
    AmcEntry::new(12.218, 466, 6),
    AmcEntry::new(14.122, 567, 6),
    AmcEntry::new(15.849, 666, 6),
    AmcEntry::new(17.786, 772, 6),
    AmcEntry::new(19.809, 873, 6),
    AmcEntry::new(f64::INFINITY, 948, 6),
];

/// Scale of an SINR argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    #[default]
    Linear,
    Decibel,
}

impl Scale {
    /// Convert a value in this scale to linear.
    pub fn to_linear(self, sinr: f64) -> f64 {
        match self {
            Scale::Linear => sinr,
            Scale::Decibel => db_to_linear(sinr),
        }
    }
}

pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

pub fn linear_to_db(lin: f64) -> f64 {
    10.0 * lin.log10()
}

/// Shannon capacity `bw * log2(1 + sinr)`.
pub fn shannon(sinr: f64, bw: f64) -> f64 {
    bw * (1.0 + sinr).log2()
}

/// Shannon capacity clipped at `r_max_norm * bw`.
pub fn shannon_truncated(sinr: f64, bw: f64, r_max_norm: f64) -> f64 {
    shannon(sinr, bw).min(r_max_norm * bw)
}

/// Attenuated Shannon capacity `att * shannon`, clipped like
/// [shannon_truncated].
pub fn shannon_attenuated(sinr: f64, bw: f64, att: f64, r_max_norm: f64) -> f64 {
    (att * shannon(sinr, bw)).min(r_max_norm * bw)
}

/// Look up the spectral efficiency for an SINR in dB.
///
/// NaN matches no interval and yields zero.
pub fn amc_efficiency(sinr_db: f64) -> f64 {
    AMC_TABLE
        .iter()
        .find(|e| sinr_db <= e.upper_db)
        .map(AmcEntry::efficiency)
        .unwrap_or(0.0)
}

/// Map SINR values in dB through the AMC table, keeping the input shape.
pub fn amc_table<S, D>(sinr_db: &ArrayBase<S, D>) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    sinr_db.mapv(amc_efficiency)
}

/// A capacity model with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityModel {
    Shannon,
    ShannonTruncated {
        #[serde(default = "default_r_max")]
        r_max_norm: f64,
    },
    ShannonAttenuated {
        #[serde(default = "default_attenuation")]
        att: f64,
        #[serde(default = "default_r_max")]
        r_max_norm: f64,
    },
    /// Table lookup; the rate evaluator feeds linear SINR, which this model
    /// converts to dB before the lookup.
    AmcTable,
}

fn default_r_max() -> f64 {
    R_MAX_NORM
}

fn default_attenuation() -> f64 {
    SHANNON_ATTENUATION
}

impl Default for CapacityModel {
    fn default() -> Self {
        CapacityModel::shannon_attenuated()
    }
}

impl CapacityModel {
    pub fn shannon_truncated() -> CapacityModel {
        CapacityModel::ShannonTruncated {
            r_max_norm: R_MAX_NORM,
        }
    }

    pub fn shannon_attenuated() -> CapacityModel {
        CapacityModel::ShannonAttenuated {
            att: SHANNON_ATTENUATION,
            r_max_norm: R_MAX_NORM,
        }
    }

    /// Rate for one linear SINR value.
    pub fn rate(&self, sinr: f64, bw: f64) -> f64 {
        match *self {
            CapacityModel::Shannon => shannon(sinr, bw),
            CapacityModel::ShannonTruncated { r_max_norm } => {
                shannon_truncated(sinr, bw, r_max_norm)
            }
            CapacityModel::ShannonAttenuated { att, r_max_norm } => {
                shannon_attenuated(sinr, bw, att, r_max_norm)
            }
            CapacityModel::AmcTable => bw * amc_efficiency(linear_to_db(sinr)),
        }
    }

    /// Rate for an SINR given in `scale`.
    pub fn rate_scaled(&self, sinr: f64, bw: f64, scale: Scale) -> f64 {
        match (self, scale) {
            (CapacityModel::AmcTable, Scale::Decibel) => bw * amc_efficiency(sinr),
            _ => self.rate(scale.to_linear(sinr), bw),
        }
    }

    /// Elementwise rates for linear SINR of any shape.
    pub fn rates<S, D>(&self, sinr: &ArrayBase<S, D>, bw: f64) -> Array<f64, D>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        sinr.mapv(|s| self.rate(s, bw))
    }

    /// Elementwise rates for SINR of any shape in the given scale.
    pub fn rates_scaled<S, D>(&self, sinr: &ArrayBase<S, D>, bw: f64, scale: Scale) -> Array<f64, D>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        sinr.mapv(|s| self.rate_scaled(s, bw, scale))
    }

    pub fn name(&self) -> &'static str {
        match self {
            CapacityModel::Shannon => "shannon",
            CapacityModel::ShannonTruncated { .. } => "shannon_truncated",
            CapacityModel::ShannonAttenuated { .. } => "shannon_attenuated",
            CapacityModel::AmcTable => "amc_table",
        }
    }
}

impl fmt::Display for CapacityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CapacityModel {
    type Err = NomaError;

    /// Parse a model name with default parameters.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "shannon" => Ok(CapacityModel::Shannon),
            "shannon_truncated" | "shannon_trunc" => Ok(CapacityModel::shannon_truncated()),
            "shannon_attenuated" | "shannon_att" => Ok(CapacityModel::shannon_attenuated()),
            "amc_table" | "amc" => Ok(CapacityModel::AmcTable),
            _ => Err(NomaError::Configuration(format!(
                "unknown capacity model: {}",
                s
            ))),
        }
    }
}

impl FromStr for Scale {
    type Err = NomaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lin" | "linear" => Ok(Scale::Linear),
            "db" | "decibel" => Ok(Scale::Decibel),
            _ => Err(NomaError::Configuration(format!("unknown SINR scale: {}", s))),
        }
    }
}
