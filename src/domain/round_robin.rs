use std::collections::HashSet;

use crate::database::models::{Match, UserId};

/// Ordered (home, away) pairing of a scheduled fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fixture {
    pub player1_id: UserId,
    pub player2_id: UserId,
}

/// Every pair of players meets `rounds` times; odd rounds swap home and away
pub fn generate_round_robin(player_ids: &[UserId], rounds: u32) -> Vec<Fixture> {
    let pairs = unordered_pairs(player_ids);
    let mut fixtures = Vec::with_capacity(pairs.len() * rounds as usize);

    for round in 0..rounds {
        for &(a, b) in &pairs {
            fixtures.push(oriented(a, b, round));
        }
    }

    log::info!(
        "Generated {} round-robin fixtures for {} players over {} rounds",
        fixtures.len(),
        player_ids.len(),
        rounds
    );
    fixtures
}

/// Fixtures required by the round robin whose exact (home, away) pairing does not exist yet.
/// Only matches between current players are taken into account.
pub fn generate_missing(existing: &[Match], player_ids: &[UserId], rounds: u32) -> Vec<Fixture> {
    if player_ids.len() < 2 {
        return Vec::new();
    }

    let current: HashSet<UserId> = player_ids.iter().copied().collect();
    let mut scheduled: HashSet<Fixture> = existing
        .iter()
        .filter(|m| current.contains(&m.player1_id) && current.contains(&m.player2_id))
        .map(|m| Fixture {
            player1_id: m.player1_id,
            player2_id: m.player2_id,
        })
        .collect();

    let mut missing = Vec::new();
    for (a, b) in unordered_pairs(player_ids) {
        for round in 0..rounds {
            let fixture = oriented(a, b, round);
            if scheduled.insert(fixture) {
                missing.push(fixture);
            }
        }
    }

    log::info!(
        "Generated {} missing fixtures for {} players, {} existing matches kept",
        missing.len(),
        player_ids.len(),
        existing.len()
    );
    missing
}

fn unordered_pairs(player_ids: &[UserId]) -> Vec<(UserId, UserId)> {
    let mut pairs = Vec::new();
    for (i, &a) in player_ids.iter().enumerate() {
        for &b in &player_ids[i + 1..] {
            pairs.push((a, b));
        }
    }
    pairs
}

fn oriented(a: UserId, b: UserId, round: u32) -> Fixture {
    if round % 2 == 1 {
        Fixture {
            player1_id: b,
            player2_id: a,
        }
    } else {
        Fixture {
            player1_id: a,
            player2_id: b,
        }
    }
}
