// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Exhaustive search over perfect matchings.
//!
//! A group of `2k` users has `(2k-1)!!` perfect matchings: 3 for 4 users,
//! 105 for 8, 10395 for 12 and over 654 million for 20.  The search visits
//! every one of them, so it is only usable as an offline baseline on small
//! groups; callers must bound the group size before invoking it.
use log::*;

use crate::allocation::PowerPolicy;
use crate::errors::{NomaError, Result};
use crate::rates::PairRates;
use crate::types::{sort_descending, Pair, Partition, User};

use super::check_group;

/// Enumerate all perfect matchings of `n` indices.
///
/// Matchings come out in canonical order: the lowest free index is paired
/// with each higher free index in turn, and the rest is matched recursively.
/// The recursion is unrolled onto an explicit stack of chosen pairs, with a
/// bitmap of indices in use, so memory stays at `O(n)`.
pub struct PerfectMatchings {
    n: usize,
    used: Vec<bool>,
    stack: Vec<(usize, usize)>,
    started: bool,
    done: bool,
}

impl PerfectMatchings {
    pub fn new(n: usize) -> PerfectMatchings {
        PerfectMatchings {
            n,
            used: vec![false; n],
            stack: Vec::with_capacity(n / 2),
            started: false,
            done: n % 2 != 0,
        }
    }

    /// Advance to the next matching and borrow it.
    pub fn next_matching(&mut self) -> Option<&[(usize, usize)]> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
        } else if !self.backtrack() {
            self.done = true;
            return None;
        }
        self.complete();
        Some(&self.stack)
    }

    fn next_free(&self, from: usize) -> Option<usize> {
        (from..self.n).find(|i| !self.used[*i])
    }

    /// Pair off remaining free indices with their first candidates.
    fn complete(&mut self) {
        while let Some(a) = self.next_free(0) {
            self.used[a] = true;
            // an even number of indices was free, so a partner exists
            let Some(b) = self.next_free(a + 1) else {
                break;
            };
            self.used[b] = true;
            self.stack.push((a, b));
        }
    }

    /// Move the deepest pair that has an untried partner to that partner.
    fn backtrack(&mut self) -> bool {
        while let Some((a, b)) = self.stack.pop() {
            self.used[b] = false;
            if let Some(c) = self.next_free(b + 1) {
                self.used[c] = true;
                self.stack.push((a, c));
                return true;
            }
            self.used[a] = false;
        }
        false
    }
}

impl Iterator for PerfectMatchings {
    type Item = Vec<(usize, usize)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_matching().map(|m| m.to_vec())
    }
}

/// Number of perfect matchings of `n` users, `(n-1)!!`.
///
/// Returns `None` for odd `n` or on overflow.
pub fn matching_count(n: usize) -> Option<u128> {
    if n % 2 != 0 {
        return None;
    }
    let mut count: u128 = 1;
    let mut k = n;
    while k > 1 {
        count = count.checked_mul((k - 1) as u128)?;
        k -= 2;
    }
    Some(count)
}

/// Result of an exhaustive search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The best matching, with power coefficients written.
    pub partition: Partition,
    /// Objective total of the best matching.
    pub total: f64,
    /// Number of matchings visited.
    pub visited: usize,
}

/// Sum-rate table over unordered index pairs `i < j`, stored as a packed
/// upper triangle without the diagonal.
struct PairScores {
    n: usize,
    scores: Vec<f64>,
}

impl PairScores {
    fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < j && j < self.n);
        // rows before i hold (n-1) + (n-2) + ... + (n-i) entries
        i * self.n - arith_tot(i) + (j - i - 1)
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.scores[self.index(i, j)]
    }
}

/// Compute the total of an arithmetic series.
fn arith_tot(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Find the matching with the greatest total objective.
///
/// Users are sorted by descending mean SINR, so the stronger user of every
/// candidate pair is decoded first.  For each candidate pair the power policy
/// is applied and `objective` gives the pair's rates; a matching scores the
/// sum over its pairs.  A matching replaces the incumbent only when its total
/// is strictly greater, so the first of several equal matchings wins.  A NaN
/// total never wins over a finite one, whichever comes first.
///
/// Each unordered pair is scored once and reused across matchings; the
/// objective must therefore be a pure function of the pair.
pub fn search_pairs<F>(
    mut users: Vec<User>,
    n_sb: usize,
    power: PowerPolicy,
    mut objective: F,
) -> Result<SearchOutcome>
where
    F: FnMut(&Pair) -> Result<PairRates>,
{
    check_group(&users, n_sb)?;
    let n = users.len();
    sort_descending(&mut users);

    debug!(
        "searching {:?} matchings of {} users",
        matching_count(n),
        n
    );

    let mut table = PairScores {
        n,
        scores: Vec::with_capacity(n * n.saturating_sub(1) / 2),
    };
    for i in 0..n {
        for j in (i + 1)..n {
            let mut pair = Pair::new(0, users[i].clone(), users[j].clone());
            power.apply(&mut pair)?;
            let rates = objective(&pair)?;
            table.scores.push(rates.iter().sum());
        }
    }

    let mut matchings = PerfectMatchings::new(n);
    let mut best: Option<(f64, Vec<(usize, usize)>)> = None;
    let mut visited = 0;
    while let Some(m) = matchings.next_matching() {
        visited += 1;
        let total: f64 = m.iter().map(|(i, j)| table.get(*i, *j)).sum();
        let better = match &best {
            None => true,
            Some((incumbent, _)) => {
                total > *incumbent || (incumbent.is_nan() && !total.is_nan())
            }
        };
        if better {
            best = Some((total, m.to_vec()));
        }
    }

    let (total, matching) = best.unwrap_or_default();
    let mut slots: Vec<Option<User>> = users.into_iter().map(Some).collect();
    let mut pairs = Vec::with_capacity(matching.len());
    for (k, (i, j)) in matching.into_iter().enumerate() {
        let (first, second) = match (slots[i].take(), slots[j].take()) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(NomaError::Precondition(format!(
                    "matching reuses user slot {} or {}",
                    i, j
                )))
            }
        };
        let mut pair = Pair::new(k, first, second);
        power.apply(&mut pair)?;
        pairs.push(pair);
    }

    trace!("best of {} matchings scored {}", visited, total);
    Ok(SearchOutcome {
        partition: Partition::new(pairs),
        total,
        visited,
    })
}
