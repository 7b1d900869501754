use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::round_to;
use crate::database::models::{Match, MatchId, TournamentId, UserId};

pub const RECENT_MEETINGS: usize = 5;

/// One meeting seen from the first requested player's side
#[derive(Debug, Clone, Serialize)]
pub struct Meeting {
    pub match_id: MatchId,
    pub date: NaiveDateTime,
    pub player1_goals: i32,
    pub player2_goals: i32,
    pub team1: String,
    pub team2: String,
    pub tournament_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeadToHead {
    pub player1_id: UserId,
    pub player2_id: UserId,
    pub player1_name: String,
    pub player2_name: String,
    pub total_matches: i32,
    pub player1_wins: i32,
    pub player2_wins: i32,
    pub draws: i32,
    pub player1_goals: i32,
    pub player2_goals: i32,
    pub player1_win_rate: f64,
    pub player2_win_rate: f64,
    pub player1_avg_goals: f64,
    pub player2_avg_goals: f64,
    pub recent_matches: Vec<Meeting>,
}

impl HeadToHead {
    pub fn new(player1: (UserId, String), player2: (UserId, String)) -> Self {
        Self {
            player1_id: player1.0,
            player2_id: player2.0,
            player1_name: player1.1,
            player2_name: player2.1,
            total_matches: 0,
            player1_wins: 0,
            player2_wins: 0,
            draws: 0,
            player1_goals: 0,
            player2_goals: 0,
            player1_win_rate: 0.0,
            player2_win_rate: 0.0,
            player1_avg_goals: 0.0,
            player2_avg_goals: 0.0,
            recent_matches: Vec::new(),
        }
    }

    /// Folds in all meetings between the two players, ordered newest first
    pub fn tally(
        mut self,
        meetings: &[Match],
        tournament_names: &HashMap<TournamentId, String>,
    ) -> Self {
        for m in meetings {
            let (own, opponent, _) = m.perspective(self.player1_id);
            self.total_matches += 1;
            self.player1_goals += own;
            self.player2_goals += opponent;

            if own > opponent {
                self.player1_wins += 1;
            } else if own < opponent {
                self.player2_wins += 1;
            } else {
                self.draws += 1;
            }
        }

        if self.total_matches > 0 {
            let total = f64::from(self.total_matches);
            self.player1_win_rate = round_to(f64::from(self.player1_wins) / total, 3);
            self.player2_win_rate = round_to(f64::from(self.player2_wins) / total, 3);
            self.player1_avg_goals = round_to(f64::from(self.player1_goals) / total, 2);
            self.player2_avg_goals = round_to(f64::from(self.player2_goals) / total, 2);
        }

        self.recent_matches = meetings
            .iter()
            .take(RECENT_MEETINGS)
            .map(|m| {
                let (own, opponent, _) = m.perspective(self.player1_id);
                Meeting {
                    match_id: m.id,
                    date: m.date,
                    player1_goals: own,
                    player2_goals: opponent,
                    team1: m.team_for(self.player1_id).to_string(),
                    team2: m.team_for(self.player2_id).to_string(),
                    tournament_name: m
                        .tournament_id
                        .and_then(|id| tournament_names.get(&id).cloned()),
                }
            })
            .collect();

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meeting(id: MatchId, p1: UserId, p2: UserId, g1: i32, g2: i32) -> Match {
        Match {
            id,
            player1_id: p1,
            player2_id: p2,
            player1_goals: g1,
            player2_goals: g2,
            team1: format!("home-{}", id),
            team2: format!("away-{}", id),
            half_length: 4,
            completed: true,
            tournament_id: (id == 1).then_some(3),
            date: NaiveDateTime::default(),
            applied: true,
            player1_elo_change: 0,
            player2_elo_change: 0,
        }
    }

    #[test]
    fn test_tally_from_first_player_side() {
        let meetings = vec![
            meeting(1, 10, 20, 2, 1),
            meeting(2, 20, 10, 3, 0),
            meeting(3, 10, 20, 1, 1),
        ];
        let names = HashMap::from([(3, "Spring Open".to_string())]);

        let h2h = HeadToHead::new((10, "ivo".to_string()), (20, "uma".to_string()))
            .tally(&meetings, &names);

        assert_eq!(h2h.total_matches, 3);
        assert_eq!(h2h.player1_wins, 1);
        assert_eq!(h2h.player2_wins, 1);
        assert_eq!(h2h.draws, 1);
        assert_eq!(h2h.player1_goals, 3);
        assert_eq!(h2h.player2_goals, 5);
        assert_eq!(h2h.player1_win_rate, 0.333);
        assert_eq!(h2h.player2_avg_goals, 1.67);

        let second = &h2h.recent_matches[1];
        assert_eq!((second.player1_goals, second.player2_goals), (0, 3));
        assert_eq!(second.team1, "away-2");
        assert_eq!(
            h2h.recent_matches[0].tournament_name.as_deref(),
            Some("Spring Open")
        );
    }

    #[test]
    fn test_no_meetings_keeps_zero_rates() {
        let h2h = HeadToHead::new((1, "a".to_string()), (2, "b".to_string()))
            .tally(&[], &HashMap::new());
        assert_eq!(h2h.total_matches, 0);
        assert_eq!(h2h.player1_win_rate, 0.0);
        assert!(h2h.recent_matches.is_empty());
    }

    #[test]
    fn test_recent_meetings_capped() {
        let meetings: Vec<Match> = (0..8).map(|id| meeting(id, 1, 2, 1, 0)).collect();
        let h2h = HeadToHead::new((1, "a".to_string()), (2, "b".to_string()))
            .tally(&meetings, &HashMap::new());
        assert_eq!(h2h.recent_matches.len(), RECENT_MEETINGS);
        assert_eq!(h2h.player1_win_rate, 1.0);
    }
}
