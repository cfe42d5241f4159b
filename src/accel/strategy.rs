// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Combined pairing and allocation (UPPA), and per-drop metrics.
use log::*;
use rand::Rng;
use serde::Serialize;

use crate::allocation::{BandPolicy, PowerPolicy};
use crate::capacity::CapacityModel;
use crate::errors::{NomaError, Result};
use crate::pairing::{
    random_pairs, ranked_pairs, search_pairs, PairingMode, DEFAULT_MAX_SEARCH_USERS,
};
use crate::rates::{exclusive_rate, jain, Access, PairRates};
use crate::types::{CellParams, Partition, User};

/// Number of Jain's indices in [DropMetrics].
pub const N_FAIRNESS_METRICS: usize = 3;

/// A complete user pairing and power/band allocation scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strategy {
    pub pairing: PairingMode,
    pub power: PowerPolicy,
    pub band: BandPolicy,
    pub capacity: CapacityModel,
    pub access: Access,
    pub max_search_users: usize,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy {
            pairing: PairingMode::default(),
            power: PowerPolicy::default(),
            band: BandPolicy::default(),
            capacity: CapacityModel::default(),
            access: Access::default(),
            max_search_users: DEFAULT_MAX_SEARCH_USERS,
        }
    }
}

/// Metrics of one strategy on one drop of users.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DropMetrics {
    /// Average rate over all users.
    pub user_mean: f64,
    /// Sum rate over the cell.
    pub cell_sum: f64,
    /// Average sum rate of a sub-band (pair).
    pub subband_mean: f64,
    /// Average rate of the users decoded first.
    pub first_mean: f64,
    /// Average rate of the users decoded second.
    pub second_mean: f64,
    pub jain_user: f64,
    pub jain_pair: f64,
    /// Jain's index over `exclusive - achieved` per user.
    pub jain_gain: f64,
}

impl DropMetrics {
    pub fn fairness(&self) -> [f64; N_FAIRNESS_METRICS] {
        [self.jain_user, self.jain_pair, self.jain_gain]
    }
}

impl Strategy {
    pub fn validate(&self) -> Result<()> {
        self.power.validate()?;
        self.band.validate()?;
        Ok(())
    }

    /// Pair the users, then write power and band coefficients on every pair.
    pub fn uppa<R: Rng>(
        &self,
        users: Vec<User>,
        cell: &CellParams,
        rng: &mut R,
    ) -> Result<Partition> {
        let mut partition = match self.pairing {
            PairingMode::Random => random_pairs(users, cell.n_sb, rng)?,
            PairingMode::Fair => ranked_pairs(users, cell.n_sb)?,
            PairingMode::Search => {
                if users.len() > self.max_search_users {
                    return Err(NomaError::Precondition(format!(
                        "exhaustive search over {} users exceeds the limit of {}",
                        users.len(),
                        self.max_search_users
                    )));
                }
                let band = self.band;
                let outcome = search_pairs(users, cell.n_sb, self.power, |pair| {
                    let mut pair = pair.clone();
                    band.apply(&mut pair);
                    self.access.throughput(&pair, cell.bw_sb, self.capacity)
                })?;
                trace!(
                    "search visited {} matchings, best total {:.4}",
                    outcome.visited,
                    outcome.total
                );
                outcome.partition
            }
        };

        for pair in partition.pairs_mut() {
            self.power.apply(pair)?;
            self.band.apply(pair);
        }
        Ok(partition)
    }

    /// Rates of every pair of an allocated partition.
    pub fn evaluate(&self, partition: &Partition, cell: &CellParams) -> Result<Vec<PairRates>> {
        partition
            .iter()
            .map(|pair| self.access.throughput(pair, cell.bw_sb, self.capacity))
            .collect()
    }

    /// Run UPPA on one drop of users and summarize the resulting rates.
    pub fn evaluate_drop<R: Rng>(
        &self,
        users: Vec<User>,
        cell: &CellParams,
        rng: &mut R,
    ) -> Result<DropMetrics> {
        let partition = self.uppa(users, cell, rng)?;
        if partition.is_empty() {
            return Err(NomaError::Precondition(
                "cannot summarize an empty drop".into(),
            ));
        }
        let rates = self.evaluate(&partition, cell)?;

        let n_pairs = rates.len() as f64;
        let user_rates: Vec<f64> = rates.iter().flatten().copied().collect();
        let pair_sums: Vec<f64> = rates.iter().map(|r| r.iter().sum()).collect();
        let gains: Vec<f64> = partition
            .iter()
            .zip(&rates)
            .flat_map(|(pair, r)| pair.decoding_order().iter().zip(r))
            .map(|(user, r)| exclusive_rate(user, cell.bw_sb, self.capacity) - r)
            .collect();

        let cell_sum: f64 = pair_sums.iter().sum();
        Ok(DropMetrics {
            user_mean: cell_sum / user_rates.len() as f64,
            cell_sum,
            subband_mean: cell_sum / n_pairs,
            first_mean: rates.iter().map(|r| r[0]).sum::<f64>() / n_pairs,
            second_mean: rates.iter().map(|r| r[1]).sum::<f64>() / n_pairs,
            jain_user: jain(&user_rates)?,
            jain_pair: jain(&pair_sums)?,
            jain_gain: jain(&gains)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::scalar_users;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    const SINRS: [f64; 6] = [0.5, 12.0, 3.0, 40.0, 1.5, 7.0];

    fn cell() -> CellParams {
        CellParams::new(3, 1.0)
    }

    #[test]
    fn test_uppa_allocates_everyone() {
        let strategy = Strategy {
            pairing: PairingMode::Fair,
            power: PowerPolicy::Fair,
            band: BandPolicy::Fair { beta: 0.3 },
            ..Strategy::default()
        };
        let mut rng = Pcg64::seed_from_u64(5);
        let part = strategy.uppa(scalar_users(&SINRS), &cell(), &mut rng).unwrap();
        for pair in &part {
            let p: f64 = pair.decoding_order().iter().map(|u| u.power().unwrap()).sum();
            assert_relative_eq!(p, 1.0);
            assert_relative_eq!(pair.first().band().unwrap(), 0.3);
            assert_relative_eq!(pair.second().band().unwrap(), 0.7);
        }
    }

    #[test]
    fn test_search_not_worse_than_fair() {
        // equal shares under OMA make pair rates independent of order
        let base = Strategy {
            access: Access::Oma,
            capacity: CapacityModel::Shannon,
            ..Strategy::default()
        };
        let search = Strategy {
            pairing: PairingMode::Search,
            ..base
        };
        let fair = Strategy {
            pairing: PairingMode::Fair,
            ..base
        };
        let mut rng = Pcg64::seed_from_u64(9);
        let best = search
            .evaluate_drop(scalar_users(&SINRS), &cell(), &mut rng)
            .unwrap();
        let ranked = fair
            .evaluate_drop(scalar_users(&SINRS), &cell(), &mut rng)
            .unwrap();
        assert!(best.cell_sum >= ranked.cell_sum - 1e-12);
    }

    #[test]
    fn test_search_limit() {
        let strategy = Strategy {
            pairing: PairingMode::Search,
            max_search_users: 4,
            ..Strategy::default()
        };
        let mut rng = Pcg64::seed_from_u64(1);
        let res = strategy.uppa(scalar_users(&SINRS), &cell(), &mut rng);
        assert!(matches!(res, Err(NomaError::Precondition(_))));
    }

    #[test]
    fn test_drop_metrics_consistent() {
        let strategy = Strategy {
            pairing: PairingMode::Fair,
            access: Access::Oma,
            ..Strategy::default()
        };
        let mut rng = Pcg64::seed_from_u64(2);
        let m = strategy
            .evaluate_drop(scalar_users(&SINRS), &cell(), &mut rng)
            .unwrap();
        assert_relative_eq!(m.user_mean * 6.0, m.cell_sum, max_relative = 1e-12);
        assert_relative_eq!(m.subband_mean * 3.0, m.cell_sum, max_relative = 1e-12);
        assert_relative_eq!(
            m.first_mean + m.second_mean,
            m.subband_mean,
            max_relative = 1e-12
        );
        for j in m.fairness() {
            assert!(j > 0.0 && j <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn test_equal_users_fair() {
        let strategy = Strategy {
            pairing: PairingMode::Fair,
            access: Access::Oma,
            ..Strategy::default()
        };
        let mut rng = Pcg64::seed_from_u64(2);
        let users = scalar_users(&[4.0; 6]);
        let m = strategy.evaluate_drop(users, &cell(), &mut rng).unwrap();
        assert_relative_eq!(m.jain_user, 1.0, max_relative = 1e-12);
        assert_relative_eq!(m.jain_pair, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_fair_power_domain_error() {
        let strategy = Strategy {
            pairing: PairingMode::Fair,
            power: PowerPolicy::Fair,
            ..Strategy::default()
        };
        let mut rng = Pcg64::seed_from_u64(3);
        // ranked pairs put the weak user first; alpha reads the second
        let users = scalar_users(&[0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
        let res = strategy.evaluate_drop(users, &cell(), &mut rng);
        assert!(res.is_ok());
        let users = scalar_users(&[0.0, 0.0, 0.0, 0.0, 3.0, 4.0]);
        let res = strategy.evaluate_drop(users, &cell(), &mut rng);
        assert!(matches!(res, Err(NomaError::Domain(_))));
    }
}
