// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Users, pairs and partitions.
use std::cmp::Reverse;

use ndarray::Array1;
use ordered_float::NotNan;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::errors::{NomaError, Result};
use crate::{ensure_config, ok_or_precondition};

/// Number of users sharing one multiple-access resource.
pub const PAIR_SIZE: usize = 2;

/// Opaque user identifier, supplied by the caller.
pub type UserId = u64;

/// A user with its SINR samples and allocated coefficients.
///
/// The SINR is in linear scale, one entry per TTI or sub-carrier.  Only the
/// power and band coefficients are mutable; they stay unset until an
/// allocator writes them.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    sinr: Array1<f64>,
    mean_sinr: NotNan<f64>,
    power: Option<f64>,
    band: Option<f64>,
}

impl User {
    /// Create a user from a vector of linear SINR samples.
    pub fn new(id: UserId, sinr: Array1<f64>) -> Result<User> {
        if sinr.is_empty() {
            return Err(NomaError::Domain(format!("user {} has no SINR samples", id)));
        }
        if let Some(bad) = sinr.iter().find(|s| !s.is_finite() || **s < 0.0) {
            return Err(NomaError::Domain(format!(
                "user {} has invalid linear SINR {}",
                id, bad
            )));
        }
        // non-empty and finite, so the mean exists and is not NaN
        let mean = sinr.mean().unwrap_or_default();
        let mean_sinr = NotNan::new(mean)
            .map_err(|_| NomaError::Domain(format!("user {} has NaN mean SINR", id)))?;

        Ok(User {
            id,
            sinr,
            mean_sinr,
            power: None,
            band: None,
        })
    }

    /// Create a user with a single SINR value.
    pub fn from_scalar(id: UserId, sinr: f64) -> Result<User> {
        User::new(id, Array1::from_elem(1, sinr))
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn sinr(&self) -> &Array1<f64> {
        &self.sinr
    }

    /// Mean of the SINR samples, used for every ordering decision.
    pub fn mean_sinr(&self) -> f64 {
        self.mean_sinr.into_inner()
    }

    pub(crate) fn sort_key(&self) -> NotNan<f64> {
        self.mean_sinr
    }

    /// The power coefficient, if allocated.
    pub fn power(&self) -> Option<f64> {
        self.power
    }

    /// The band coefficient, if allocated.
    pub fn band(&self) -> Option<f64> {
        self.band
    }

    /// The power coefficient, failing if no allocator has written it.
    pub fn require_power(&self) -> Result<f64> {
        ok_or_precondition!(self.power, "power coefficient of user {} is not allocated", self.id)
    }

    /// The band coefficient, failing if no allocator has written it.
    pub fn require_band(&self) -> Result<f64> {
        ok_or_precondition!(self.band, "band coefficient of user {} is not allocated", self.id)
    }

    pub(crate) fn set_power(&mut self, power: f64) {
        self.power = Some(power);
    }

    pub(crate) fn set_band(&mut self, band: f64) {
        self.band = Some(band);
    }

    /// Drop both coefficients, so the user can be allocated again.
    pub fn clear_allocation(&mut self) {
        self.power = None;
        self.band = None;
    }
}

/// Sort users by descending mean SINR.  The sort is stable, so equal users
/// keep their input order.
pub(crate) fn sort_descending(users: &mut [User]) {
    users.sort_by_key(|u| Reverse(u.sort_key()));
}

/// Sort users by ascending mean SINR (stable).
pub(crate) fn sort_ascending(users: &mut [User]) {
    users.sort_by_key(|u| u.sort_key());
}

/// Two users sharing one resource.
///
/// The decoding order is explicit: successive interference cancellation
/// processes `first` before `second`, and every pairing strategy states which
/// user it places first.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    id: usize,
    decoding_order: [User; PAIR_SIZE],
}

impl Pair {
    pub fn new(id: usize, first: User, second: User) -> Pair {
        Pair {
            id,
            decoding_order: [first, second],
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// The user decoded first.
    pub fn first(&self) -> &User {
        &self.decoding_order[0]
    }

    /// The user decoded second.
    pub fn second(&self) -> &User {
        &self.decoding_order[1]
    }

    /// Users in decoding order.
    pub fn decoding_order(&self) -> &[User; PAIR_SIZE] {
        &self.decoding_order
    }

    pub(crate) fn users_mut(&mut self) -> &mut [User; PAIR_SIZE] {
        &mut self.decoding_order
    }

    /// The same pair with the decoding order swapped.
    pub fn reversed(&self) -> Pair {
        let [a, b] = self.decoding_order.clone();
        Pair::new(self.id, b, a)
    }

    pub fn into_users(self) -> [User; PAIR_SIZE] {
        self.decoding_order
    }
}

/// A perfect matching of a user group into disjoint pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partition {
    pairs: Vec<Pair>,
}

impl Partition {
    pub fn new(pairs: Vec<Pair>) -> Partition {
        Partition { pairs }
    }

    pub fn empty() -> Partition {
        Partition::default()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn pairs_mut(&mut self) -> &mut [Pair] {
        &mut self.pairs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pair> {
        self.pairs.iter()
    }

    pub fn into_pairs(self) -> Vec<Pair> {
        self.pairs
    }

    /// All user IDs, in pair order.
    pub fn user_ids(&self) -> Vec<UserId> {
        self.pairs
            .iter()
            .flat_map(|p| p.decoding_order().iter().map(User::id))
            .collect()
    }

    /// Check that the partition covers exactly the given IDs, each once.
    pub fn covers(&self, ids: &[UserId]) -> bool {
        let mine = self.user_ids();
        if mine.len() != ids.len() {
            return false;
        }
        let mut seen = FxHashSet::default();
        if !mine.iter().all(|id| seen.insert(*id)) {
            return false;
        }
        ids.iter().all(|id| seen.contains(id))
    }
}

impl<'a> IntoIterator for &'a Partition {
    type Item = &'a Pair;
    type IntoIter = std::slice::Iter<'a, Pair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

/// Cell-level resource parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellParams {
    /// Number of sub-bands, i.e. pairs to form.
    pub n_sb: usize,
    /// Users per multiple-access group.
    #[serde(default = "default_group_size")]
    pub n_ma_ue: usize,
    /// Sub-band bandwidth.
    pub bw_sb: f64,
}

fn default_group_size() -> usize {
    PAIR_SIZE
}

impl CellParams {
    pub fn new(n_sb: usize, bw_sb: f64) -> CellParams {
        CellParams {
            n_sb,
            n_ma_ue: PAIR_SIZE,
            bw_sb,
        }
    }

    /// Number of users the cell serves per trial.
    pub fn n_users(&self) -> usize {
        self.n_sb * self.n_ma_ue
    }

    pub fn validate(&self) -> Result<()> {
        ensure_config!(
            self.n_ma_ue == PAIR_SIZE,
            "only pairs are supported (n_ma_ue = {})",
            self.n_ma_ue
        );
        ensure_config!(self.n_sb > 0, "cell needs at least one sub-band");
        ensure_config!(
            self.bw_sb.is_finite() && self.bw_sb > 0.0,
            "sub-band bandwidth must be positive (got {})",
            self.bw_sb
        );
        Ok(())
    }
}
