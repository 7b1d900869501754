use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::database::models::{Match, User, UserId};
use crate::rating::Outcome;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpponentTally {
    pub username: String,
    pub count: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinRatePoint {
    pub date: NaiveDate,
    pub winrate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailedStats {
    pub win_rate: f64,
    pub average_goals_scored: f64,
    pub average_goals_conceded: f64,
    pub highest_wins_against: Option<OpponentTally>,
    pub highest_losses_against: Option<OpponentTally>,
    pub winrate_over_time: Vec<WinRatePoint>,
}

/// Derives the long-term profile of `user` from their completed matches, ordered oldest first.
/// Opponents missing from `usernames` are left out of the per-opponent tallies.
pub fn compute_detailed_stats(
    user: &User,
    matches: &[Match],
    usernames: &HashMap<UserId, String>,
) -> DetailedStats {
    let played: Vec<&Match> = matches
        .iter()
        .filter(|m| m.completed && m.involves(user.id))
        .collect();

    let mut wins_against = Tally::default();
    let mut losses_against = Tally::default();
    for m in &played {
        let (_, _, opponent_id) = m.perspective(user.id);
        let Some(name) = usernames.get(&opponent_id) else {
            continue;
        };
        match m.outcome_for(user.id) {
            Outcome::Win => wins_against.bump(name),
            Outcome::Loss => losses_against.bump(name),
            Outcome::Draw => {}
        }
    }

    DetailedStats {
        win_rate: user.counters.win_rate(),
        average_goals_scored: user.counters.average_goals_scored(),
        average_goals_conceded: user.counters.average_goals_conceded(),
        highest_wins_against: wins_against.highest(),
        highest_losses_against: losses_against.highest(),
        winrate_over_time: winrate_over_time(&played, user.id),
    }
}

/// Cumulative win rate at the end of each day with at least one match
fn winrate_over_time(played: &[&Match], user_id: UserId) -> Vec<WinRatePoint> {
    let mut points: Vec<WinRatePoint> = Vec::new();
    let mut total = 0;
    let mut wins = 0;

    for m in played {
        total += 1;
        if m.outcome_for(user_id) == Outcome::Win {
            wins += 1;
        }
        let point = WinRatePoint {
            date: m.date.date(),
            winrate: f64::from(wins) / f64::from(total),
        };

        match points.last_mut() {
            Some(last) if last.date == point.date => *last = point,
            _ => points.push(point),
        }
    }

    points
}

/// Counts per opponent in first-seen order
#[derive(Default)]
struct Tally {
    entries: Vec<(String, i32)>,
}

impl Tally {
    fn bump(&mut self, name: &str) {
        match self.entries.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((name.to_string(), 1)),
        }
    }

    /// Highest count; the opponent seen first wins a tie
    fn highest(&self) -> Option<OpponentTally> {
        let mut best: Option<&(String, i32)> = None;
        for entry in &self.entries {
            if best.is_none_or(|(_, count)| entry.1 > *count) {
                best = Some(entry);
            }
        }
        best.map(|(username, count)| OpponentTally {
            username: username.clone(),
            count: *count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StatCounters;
    use chrono::{Duration, NaiveDateTime};

    fn user_with(counters: StatCounters) -> User {
        User {
            id: 1,
            username: "nia".to_string(),
            email: "nia@example.com".to_string(),
            first_name: None,
            last_name: None,
            is_deleted: false,
            counters,
            elo_rating: 1200,
            tournaments_played: 0,
            last_5_teams: Vec::new(),
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
            deleted_at: None,
        }
    }

    fn played(opponent: UserId, own: i32, other: i32, day: i64, hour: i64) -> Match {
        Match {
            id: 0,
            player1_id: 1,
            player2_id: opponent,
            player1_goals: own,
            player2_goals: other,
            team1: String::new(),
            team2: String::new(),
            half_length: 4,
            completed: true,
            tournament_id: None,
            date: NaiveDateTime::default() + Duration::days(day) + Duration::hours(hour),
            applied: true,
            player1_elo_change: 0,
            player2_elo_change: 0,
        }
    }

    fn names() -> HashMap<UserId, String> {
        HashMap::from([(2, "rex".to_string()), (3, "zed".to_string())])
    }

    #[test]
    fn test_nemesis_and_favourite_opponent() {
        let matches = vec![
            played(2, 2, 0, 0, 1),
            played(3, 1, 0, 0, 2),
            played(3, 3, 1, 1, 0),
            played(2, 0, 2, 1, 1),
            played(2, 0, 1, 2, 0),
        ];
        let mut counters = StatCounters::default();
        for m in &matches {
            counters.record(m.player1_goals, m.player2_goals);
        }

        let stats = compute_detailed_stats(&user_with(counters), &matches, &names());

        assert_eq!(
            stats.highest_wins_against,
            Some(OpponentTally {
                username: "zed".to_string(),
                count: 2
            })
        );
        assert_eq!(stats.highest_losses_against.unwrap().username, "rex");
        assert_eq!(stats.win_rate, 0.6);
    }

    #[test]
    fn test_winrate_is_cumulative_per_day() {
        let matches = vec![
            played(2, 1, 0, 0, 1),
            played(2, 0, 1, 0, 2),
            played(2, 2, 0, 3, 0),
        ];
        let stats = compute_detailed_stats(&user_with(StatCounters::default()), &matches, &names());

        let rates: Vec<f64> = stats.winrate_over_time.iter().map(|p| p.winrate).collect();
        assert_eq!(rates, vec![0.5, 2.0 / 3.0]);
        assert_eq!(
            stats.winrate_over_time[1].date,
            (NaiveDateTime::default() + Duration::days(3)).date()
        );
    }

    #[test]
    fn test_tie_goes_to_first_opponent() {
        let matches = vec![played(3, 1, 0, 0, 0), played(2, 1, 0, 0, 1)];
        let stats = compute_detailed_stats(&user_with(StatCounters::default()), &matches, &names());
        assert_eq!(stats.highest_wins_against.unwrap().username, "zed");
        assert!(stats.highest_losses_against.is_none());
    }
}
