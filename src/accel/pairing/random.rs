// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use rand::Rng;

use crate::errors::Result;
use crate::types::{sort_descending, Pair, Partition, User};

use super::check_group;

/// Pair users uniformly at random.
///
/// Two users at a time are drawn without replacement; within each pair the
/// user with the higher mean SINR is decoded first.
pub fn random_pairs<R: Rng + ?Sized>(
    mut users: Vec<User>,
    n_sb: usize,
    rng: &mut R,
) -> Result<Partition> {
    check_group(&users, n_sb)?;

    let mut pairs = Vec::with_capacity(users.len() / 2);
    while !users.is_empty() {
        let a = users.remove(rng.random_range(0..users.len()));
        let b = users.remove(rng.random_range(0..users.len()));
        let mut drawn = [a, b];
        sort_descending(&mut drawn);
        let [first, second] = drawn;
        pairs.push(Pair::new(pairs.len(), first, second));
    }

    Ok(Partition::new(pairs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::scalar_users;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn test_stronger_first() {
        let users = scalar_users(&[1.0, 9.0, 4.0, 16.0, 0.25, 2.0]);
        let mut rng = Pcg64::seed_from_u64(7);
        let part = random_pairs(users, 3, &mut rng).unwrap();
        for pair in &part {
            assert!(pair.first().mean_sinr() >= pair.second().mean_sinr());
        }
        let ids: Vec<_> = part.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_seed_reproducible() {
        let users = scalar_users(&[1.0, 9.0, 4.0, 16.0, 0.25, 2.0, 3.0, 5.0]);
        let a = random_pairs(users.clone(), 4, &mut Pcg64::seed_from_u64(11)).unwrap();
        let b = random_pairs(users, 4, &mut Pcg64::seed_from_u64(11)).unwrap();
        assert_eq!(a.user_ids(), b.user_ids());
    }

    #[test]
    fn test_draws_vary() {
        // over many draws, user 0 should meet more than one partner
        let users = scalar_users(&[1.0, 2.0, 3.0, 4.0]);
        let mut rng = Pcg64::seed_from_u64(3);
        let mut partners = std::collections::HashSet::new();
        for _ in 0..50 {
            let part = random_pairs(users.clone(), 2, &mut rng).unwrap();
            for p in &part {
                if p.first().id() == 0 {
                    partners.insert(p.second().id());
                } else if p.second().id() == 0 {
                    partners.insert(p.first().id());
                }
            }
        }
        assert!(partners.len() > 1);
    }
}
