// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use crate::errors::Result;
use crate::types::{sort_ascending, Pair, Partition, User};

use super::check_group;

/// Pair users by SINR rank.
///
/// Users are sorted by ascending mean SINR; pair `i` combines rank `i` from
/// the weak half with rank `i + n_sb` from the strong half.  The weak user
/// is decoded first.
pub fn ranked_pairs(mut users: Vec<User>, n_sb: usize) -> Result<Partition> {
    check_group(&users, n_sb)?;
    if users.is_empty() {
        return Ok(Partition::empty());
    }

    sort_ascending(&mut users);
    let strong = users.split_off(n_sb);
    let pairs = users
        .into_iter()
        .zip(strong)
        .enumerate()
        .map(|(i, (weak, strong))| Pair::new(i, weak, strong))
        .collect();

    Ok(Partition::new(pairs))
}

#[test]
fn test_rank_mirroring() {
    use crate::types::test_support::scalar_users;

    // ids 0..6 with SINR ranks 3, 0, 5, 1, 4, 2
    let users = scalar_users(&[4.0, 1.0, 6.0, 2.0, 5.0, 3.0]);
    let part = ranked_pairs(users, 3).unwrap();
    let pairs: Vec<_> = part
        .iter()
        .map(|p| (p.first().id(), p.second().id()))
        .collect();
    assert_eq!(pairs, vec![(1, 0), (3, 4), (5, 2)]);
}

#[test]
fn test_weak_first() {
    use crate::types::test_support::scalar_users;

    let users = scalar_users(&[10.0, 0.1, 3.0, 30.0]);
    let part = ranked_pairs(users, 2).unwrap();
    for pair in &part {
        assert!(pair.first().mean_sinr() < pair.second().mean_sinr());
    }
}
