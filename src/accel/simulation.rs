// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Monte Carlo trial driver.
//!
//! Every trial draws one set of users and evaluates each configured strategy
//! on its own copy of them.  Trials run in parallel; each worker folds its
//! trials into private accumulators, which are merged at the end, so the
//! result depends only on the configuration and the seed.
use log::*;
use ndarray::{s, ArrayView3};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;

use crate::config::SimulationConfig;
use crate::errors::{NomaError, Result};
use crate::progress::ProgressHandle;
use crate::stats::{CdfAccumulator, CdfSummary};
use crate::strategy::{DropMetrics, Strategy, N_FAIRNESS_METRICS};
use crate::types::{User, UserId};

/// Supplier of the users of each trial.
pub trait SinrSource: Sync {
    /// Check that the source can serve `n_trials` trials of `n_users` users.
    fn check(&self, _n_trials: usize, _n_users: usize) -> Result<()> {
        Ok(())
    }

    /// Draw the users of trial `trial`.
    fn draw(&self, trial: usize, n_users: usize, rng: &mut Pcg64) -> Result<Vec<User>>;
}

impl<F> SinrSource for F
where
    F: Fn(usize, usize, &mut Pcg64) -> Result<Vec<User>> + Sync,
{
    fn draw(&self, trial: usize, n_users: usize, rng: &mut Pcg64) -> Result<Vec<User>> {
        self(trial, n_users, rng)
    }
}

/// Precomputed SINR samples, indexed `[trial, user, sample]`.
pub struct SinrTrials<'a> {
    sinr: ArrayView3<'a, f64>,
}

impl<'a> SinrTrials<'a> {
    pub fn new(sinr: ArrayView3<'a, f64>) -> SinrTrials<'a> {
        SinrTrials { sinr }
    }
}

impl SinrSource for SinrTrials<'_> {
    fn check(&self, n_trials: usize, n_users: usize) -> Result<()> {
        let (trials, users, samples) = self.sinr.dim();
        if trials < n_trials || users != n_users || samples == 0 {
            return Err(NomaError::Precondition(format!(
                "SINR array of shape {:?} cannot serve {} trials of {} users",
                self.sinr.dim(),
                n_trials,
                n_users
            )));
        }
        Ok(())
    }

    fn draw(&self, trial: usize, n_users: usize, _rng: &mut Pcg64) -> Result<Vec<User>> {
        (0..n_users)
            .map(|u| User::new(u as UserId, self.sinr.slice(s![trial, u, ..]).to_owned()))
            .collect()
    }
}

/// Accumulators for one strategy.
#[derive(Debug, Clone)]
struct StrategyStats {
    user: CdfAccumulator,
    cell: CdfAccumulator,
    subband: CdfAccumulator,
    fairness: CdfAccumulator,
}

impl StrategyStats {
    fn new(config: &SimulationConfig) -> Result<StrategyStats> {
        let b = &config.bounds;
        Ok(StrategyStats {
            user: CdfAccumulator::new(b.user_rate, 1, config.n_bins)?,
            cell: CdfAccumulator::new(b.cell_rate, 1, config.n_bins)?,
            subband: CdfAccumulator::new(b.subband_rate, 1, config.n_bins)?,
            fairness: CdfAccumulator::new(1.0, N_FAIRNESS_METRICS, config.n_bins)?,
        })
    }

    fn record(&mut self, m: &DropMetrics) -> Result<()> {
        self.user.record(&[m.user_mean])?;
        self.cell.record(&[m.cell_sum])?;
        self.subband.record(&[m.subband_mean])?;
        self.fairness.record(&m.fairness())?;
        Ok(())
    }

    fn merge(&mut self, other: &StrategyStats) -> Result<()> {
        self.user.merge(&other.user)?;
        self.cell.merge(&other.cell)?;
        self.subband.merge(&other.subband)?;
        self.fairness.merge(&other.fairness)?;
        Ok(())
    }
}

/// Per-worker fold state.
#[derive(Debug, Clone)]
struct Partial {
    stats: Vec<StrategyStats>,
    discarded: usize,
}

impl Partial {
    fn merge(mut self, other: Partial) -> Result<Partial> {
        for (mine, theirs) in self.stats.iter_mut().zip(&other.stats) {
            mine.merge(theirs)?;
        }
        self.discarded += other.discarded;
        Ok(self)
    }
}

/// Indicators of one strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyReport {
    pub name: String,
    pub user_rate: CdfSummary,
    pub cell_rate: CdfSummary,
    pub subband_rate: CdfSummary,
    pub jain_user: CdfSummary,
    pub jain_pair: CdfSummary,
    pub jain_gain: CdfSummary,
}

/// Result of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub n_trials: usize,
    pub accepted: u64,
    pub discarded: usize,
    pub strategies: Vec<StrategyReport>,
}

impl SimulationReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| NomaError::Configuration(format!("cannot serialize report: {}", e)))
    }

    pub fn strategy(&self, name: &str) -> Option<&StrategyReport> {
        self.strategies.iter().find(|s| s.name == name)
    }
}

/// Run every configured strategy over `config.n_trials` trials.
pub fn run<S: SinrSource>(config: &SimulationConfig, source: &S) -> Result<SimulationReport> {
    config.validate()?;
    source.check(config.n_trials, config.cell.n_users())?;

    match config.threads {
        Some(n) => {
            let pool = ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| NomaError::Configuration(format!("cannot build thread pool: {}", e)))?;
            pool.install(|| run_trials(config, source))
        }
        None => run_trials(config, source),
    }
}

fn run_trials<S: SinrSource>(config: &SimulationConfig, source: &S) -> Result<SimulationReport> {
    let strategies = config.strategies();
    info!(
        "simulating {} strategies over {} trials of {} users on {} threads",
        strategies.len(),
        config.n_trials,
        config.cell.n_users(),
        rayon::current_num_threads()
    );
    for (name, strategy) in &strategies {
        debug!(
            "strategy {}: pairing {}, power {}, band {}, capacity {}, access {}",
            name,
            strategy.pairing,
            strategy.power.name(),
            strategy.band.name(),
            strategy.capacity,
            strategy.access.name()
        );
    }

    let init = Partial {
        stats: strategies
            .iter()
            .map(|_| StrategyStats::new(config))
            .collect::<Result<Vec<_>>>()?,
        discarded: 0,
    };

    let pb = ProgressHandle::new("trials", config.n_trials);
    let total = (0..config.n_trials)
        .into_par_iter()
        .try_fold(
            || init.clone(),
            |mut acc: Partial, trial| -> Result<Partial> {
                let metrics = run_trial(config, &strategies, source, trial)?;
                match metrics {
                    Some(metrics) => {
                        for (stats, m) in acc.stats.iter_mut().zip(&metrics) {
                            stats.record(m)?;
                        }
                    }
                    None => acc.discarded += 1,
                }
                pb.tick();
                Ok(acc)
            },
        )
        .try_reduce(|| init.clone(), Partial::merge)?;
    pb.finish();

    let accepted = total.stats.first().map(|s| s.cell.n_trials()).unwrap_or(0);
    info!(
        "accepted {} trials, discarded {}",
        accepted, total.discarded
    );

    let reports = strategies
        .iter()
        .zip(&total.stats)
        .map(|((name, _), stats)| {
            let fairness = stats.fairness.finish()?;
            Ok(StrategyReport {
                name: name.clone(),
                user_rate: stats.user.finish()?.summary(0),
                cell_rate: stats.cell.finish()?.summary(0),
                subband_rate: stats.subband.finish()?.summary(0),
                jain_user: fairness.summary(0),
                jain_pair: fairness.summary(1),
                jain_gain: fairness.summary(2),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SimulationReport {
        n_trials: config.n_trials,
        accepted,
        discarded: total.discarded,
        strategies: reports,
    })
}

/// Evaluate every strategy on one trial.
///
/// Returns `None` when any strategy fails or yields a NaN metric; the trial
/// is then dropped for all strategies.  Errors from the source abort the run.
fn run_trial<S: SinrSource>(
    config: &SimulationConfig,
    strategies: &[(String, Strategy)],
    source: &S,
    trial: usize,
) -> Result<Option<Vec<DropMetrics>>> {
    let mut rng = Pcg64::seed_from_u64(config.seed.wrapping_add(trial as u64));
    let n_users = config.cell.n_users();
    let users = source.draw(trial, n_users, &mut rng)?;
    if users.len() != n_users {
        return Err(NomaError::Precondition(format!(
            "trial {}: source drew {} users, expected {}",
            trial,
            users.len(),
            n_users
        )));
    }

    let mut metrics = Vec::with_capacity(strategies.len());
    for (name, strategy) in strategies {
        match strategy.evaluate_drop(users.clone(), &config.cell, &mut rng) {
            Ok(m) if has_nan(&m) => {
                warn!("trial {}: strategy {} produced a NaN metric, discarding", trial, name);
                return Ok(None);
            }
            Ok(m) => metrics.push(m),
            Err(e) => {
                warn!("trial {}: strategy {} failed ({}), discarding", trial, name, e);
                return Ok(None);
            }
        }
    }
    Ok(Some(metrics))
}

fn has_nan(m: &DropMetrics) -> bool {
    [m.user_mean, m.cell_sum, m.subband_mean]
        .iter()
        .chain(m.fairness().iter())
        .any(|v| v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::PowerPolicy;
    use crate::config::{RateBounds, StrategyConfig};
    use crate::pairing::PairingMode;
    use crate::rates::Access;
    use crate::types::CellParams;
    use ndarray::Array3;
    use rand::Rng;

    fn config(n_trials: usize) -> SimulationConfig {
        let strategy = |name: &str, pairing| StrategyConfig {
            name: name.into(),
            pairing,
            power: PowerPolicy::Fair,
            band: Default::default(),
            capacity: Default::default(),
            access: Access::Noma,
        };
        SimulationConfig {
            cell: CellParams::new(2, 1.0),
            n_trials,
            seed: 20,
            n_bins: 50,
            bounds: RateBounds {
                user_rate: 6.0,
                cell_rate: 24.0,
                subband_rate: 12.0,
            },
            max_search_users: 12,
            threads: None,
            strategies: vec![
                strategy("random", PairingMode::Random),
                strategy("fair", PairingMode::Fair),
                strategy("search", PairingMode::Search),
            ],
        }
    }

    fn uniform_users(_trial: usize, n_users: usize, rng: &mut Pcg64) -> Result<Vec<User>> {
        (0..n_users)
            .map(|u| User::from_scalar(u as UserId, rng.random_range(0.1..100.0)))
            .collect()
    }

    #[test]
    fn test_run_accepts_all() {
        let report = run(&config(200), &uniform_users).unwrap();
        assert_eq!(report.accepted, 200);
        assert_eq!(report.discarded, 0);
        assert_eq!(report.strategies.len(), 3);
        for s in &report.strategies {
            let cdf = &s.cell_rate.cdf;
            assert_eq!(cdf.len(), 50);
            for i in 1..cdf.len() {
                assert!(cdf[i] >= cdf[i - 1]);
            }
            assert!(s.jain_user.cdf[49] > 0.999);
        }
    }

    #[test]
    fn test_thread_count_independent() {
        let mut one = config(100);
        one.threads = Some(1);
        let mut four = config(100);
        four.threads = Some(4);
        let a = run(&one, &uniform_users).unwrap();
        let b = run(&four, &uniform_users).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_search_beats_random() {
        // both put the stronger user first, so search dominates every trial
        let report = run(&config(300), &uniform_users).unwrap();
        let search = report.strategy("search").unwrap();
        let random = report.strategy("random").unwrap();
        assert!(search.cell_rate.mean >= random.cell_rate.mean - 1e-9);
    }

    #[test]
    fn test_failed_trials_discarded() {
        // a user with zero SINR second in a pair fails the fair power split
        let source = |trial: usize, n_users: usize, _rng: &mut Pcg64| {
            let sinr = if trial % 4 == 0 { 0.0 } else { 2.0 };
            (0..n_users)
                .map(|u| User::from_scalar(u as UserId, sinr))
                .collect::<Result<Vec<_>>>()
        };
        let report = run(&config(40), &source).unwrap();
        assert_eq!(report.discarded, 10);
        assert_eq!(report.accepted, 30);
    }

    #[test]
    fn test_array_source() {
        let mut rng = Pcg64::seed_from_u64(3);
        let sinr = Array3::from_shape_fn((30, 4, 5), |_| rng.random_range(0.5..50.0));
        let source = SinrTrials::new(sinr.view());
        let report = run(&config(30), &source).unwrap();
        assert_eq!(report.accepted, 30);

        let short = SinrTrials::new(sinr.slice(s![..10, .., ..]));
        assert!(matches!(
            run(&config(30), &short),
            Err(NomaError::Precondition(_))
        ));
    }

    #[test]
    fn test_report_json() {
        let report = run(&config(20), &uniform_users).unwrap();
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["accepted"], 20);
        assert_eq!(value["strategies"][1]["name"], "fair");
        assert!(value["strategies"][0]["cell_rate"]["thresholds"].is_array());
    }
}
