// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! User pairing strategies.
//!
//! Every strategy consumes an even-sized user group and returns a
//! [Partition] that holds each input user exactly once.  Strategies differ
//! in which users they combine and in the decoding order they give each pair:
//!
//! - `random` puts the stronger user (higher mean SINR) first;
//! - `fair` puts the weaker user first;
//! - `search` puts the stronger user first.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{NomaError, Result};
use crate::types::{User, PAIR_SIZE};

mod random;
mod ranked;
mod search;

pub use random::random_pairs;
pub use ranked::ranked_pairs;
pub use search::{matching_count, search_pairs, PerfectMatchings, SearchOutcome};

/// Default bound on the group size accepted by exhaustive search
/// (10395 matchings).
pub const DEFAULT_MAX_SEARCH_USERS: usize = 12;

/// Pairing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingMode {
    /// Uniformly random pairs.
    #[default]
    Random,
    /// Weakest half matched against strongest half by rank.
    Fair,
    /// Exhaustive search for the matching with the highest sum rate.
    Search,
}

impl PairingMode {
    pub fn name(&self) -> &'static str {
        match self {
            PairingMode::Random => "random",
            PairingMode::Fair => "fair",
            PairingMode::Search => "search",
        }
    }
}

impl fmt::Display for PairingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PairingMode {
    type Err = NomaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random" => Ok(PairingMode::Random),
            "fair" => Ok(PairingMode::Fair),
            "search" => Ok(PairingMode::Search),
            _ => Err(NomaError::Configuration(format!(
                "unknown pairing mode: {}",
                s
            ))),
        }
    }
}

/// Check that `users` can be split into exactly `n_sb` pairs.
///
/// Empty input is accepted for any `n_sb` and yields an empty partition.
pub(crate) fn check_group(users: &[User], n_sb: usize) -> Result<()> {
    if users.is_empty() {
        return Ok(());
    }
    if users.len() % PAIR_SIZE != 0 {
        return Err(NomaError::Precondition(format!(
            "cannot pair an odd number of users ({})",
            users.len()
        )));
    }
    if users.len() != n_sb * PAIR_SIZE {
        return Err(NomaError::Precondition(format!(
            "{} users cannot fill {} pairs",
            users.len(),
            n_sb
        )));
    }
    Ok(())
}
