// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Simulation configuration, read from JSON.
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::allocation::{BandPolicy, PowerPolicy};
use crate::capacity::CapacityModel;
use crate::ensure_config;
use crate::errors::{NomaError, Result};
use crate::pairing::{PairingMode, DEFAULT_MAX_SEARCH_USERS};
use crate::rates::Access;
use crate::strategy::Strategy;
use crate::types::CellParams;

pub const DEFAULT_TRIALS: usize = 10_000;
pub const DEFAULT_BINS: usize = 100;

/// Upper ends of the CDF threshold axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateBounds {
    pub user_rate: f64,
    pub cell_rate: f64,
    pub subband_rate: f64,
}

/// One named strategy to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    #[serde(default)]
    pub pairing: PairingMode,
    #[serde(default)]
    pub power: PowerPolicy,
    #[serde(default)]
    pub band: BandPolicy,
    #[serde(default)]
    pub capacity: CapacityModel,
    #[serde(default)]
    pub access: Access,
}

impl StrategyConfig {
    pub fn strategy(&self, max_search_users: usize) -> Strategy {
        Strategy {
            pairing: self.pairing,
            power: self.power,
            band: self.band,
            capacity: self.capacity,
            access: self.access,
            max_search_users,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub cell: CellParams,
    #[serde(default = "default_trials")]
    pub n_trials: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_bins")]
    pub n_bins: usize,
    pub bounds: RateBounds,
    #[serde(default = "default_max_search")]
    pub max_search_users: usize,
    /// Worker thread count; `None` uses the global pool as configured.
    #[serde(default)]
    pub threads: Option<usize>,
    pub strategies: Vec<StrategyConfig>,
}

fn default_trials() -> usize {
    DEFAULT_TRIALS
}

fn default_bins() -> usize {
    DEFAULT_BINS
}

fn default_max_search() -> usize {
    DEFAULT_MAX_SEARCH_USERS
}

impl SimulationConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<SimulationConfig> {
        let config: SimulationConfig = serde_json::from_str(text)
            .map_err(|e| NomaError::Configuration(format!("cannot parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<SimulationConfig> {
        let path = path.as_ref();
        debug!("loading configuration from {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| {
            NomaError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| NomaError::Configuration(format!("cannot serialize configuration: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        self.cell.validate()?;
        ensure_config!(self.n_trials > 0, "need at least one trial");
        ensure_config!(
            self.n_bins >= 2,
            "need at least two CDF bins (got {})",
            self.n_bins
        );
        for (name, bound) in [
            ("user_rate", self.bounds.user_rate),
            ("cell_rate", self.bounds.cell_rate),
            ("subband_rate", self.bounds.subband_rate),
        ] {
            ensure_config!(
                bound.is_finite() && bound > 0.0,
                "rate bound {} must be positive (got {})",
                name,
                bound
            );
        }
        if let Some(n) = self.threads {
            ensure_config!(n > 0, "thread count must be positive");
        }

        ensure_config!(!self.strategies.is_empty(), "no strategies configured");
        let mut seen = FxHashSet::default();
        for sc in &self.strategies {
            ensure_config!(
                seen.insert(sc.name.as_str()),
                "duplicate strategy name {}",
                sc.name
            );
            sc.strategy(self.max_search_users).validate()?;
            if sc.pairing == PairingMode::Search {
                ensure_config!(
                    self.cell.n_users() <= self.max_search_users,
                    "strategy {}: exhaustive search over {} users exceeds the limit of {}",
                    sc.name,
                    self.cell.n_users(),
                    self.max_search_users
                );
            }
        }
        Ok(())
    }

    /// The configured strategies, in order.
    pub fn strategies(&self) -> Vec<(String, Strategy)> {
        self.strategies
            .iter()
            .map(|sc| (sc.name.clone(), sc.strategy(self.max_search_users)))
            .collect()
    }
}

impl FromStr for SimulationConfig {
    type Err = NomaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s)
    }
}
