use serde::Serialize;

use crate::rating::Outcome;

/// Running per-player totals kept on the user record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatCounters {
    pub total_matches: i32,
    pub total_goals_scored: i32,
    pub total_goals_conceded: i32,
    pub goal_difference: i32,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub points: i32,
}

impl StatCounters {
    pub fn record(&mut self, scored: i32, conceded: i32) {
        self.adjust(scored, conceded, 1);
    }

    pub fn revert(&mut self, scored: i32, conceded: i32) {
        self.adjust(scored, conceded, -1);
    }

    fn adjust(&mut self, scored: i32, conceded: i32, sign: i32) {
        let outcome = Outcome::from_goals(scored, conceded);

        self.total_matches += sign;
        self.total_goals_scored += sign * scored;
        self.total_goals_conceded += sign * conceded;
        self.goal_difference = self.total_goals_scored - self.total_goals_conceded;
        match outcome {
            Outcome::Win => self.wins += sign,
            Outcome::Loss => self.losses += sign,
            Outcome::Draw => self.draws += sign,
        }
        self.points += sign * outcome.points();
    }

    pub fn win_rate(&self) -> f64 {
        ratio(self.wins, self.total_matches)
    }

    pub fn average_goals_scored(&self) -> f64 {
        ratio(self.total_goals_scored, self.total_matches)
    }

    pub fn average_goals_conceded(&self) -> f64 {
        ratio(self.total_goals_conceded, self.total_matches)
    }
}

fn ratio(numerator: i32, denominator: i32) -> f64 {
    if denominator > 0 {
        f64::from(numerator) / f64::from(denominator)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_win_draw_loss() {
        let mut counters = StatCounters::default();
        counters.record(3, 1);
        counters.record(2, 2);
        counters.record(0, 1);

        assert_eq!(counters.total_matches, 3);
        assert_eq!(counters.wins, 1);
        assert_eq!(counters.draws, 1);
        assert_eq!(counters.losses, 1);
        assert_eq!(counters.points, 4);
        assert_eq!(counters.total_goals_scored, 5);
        assert_eq!(counters.total_goals_conceded, 4);
        assert_eq!(counters.goal_difference, 1);
    }

    #[test]
    fn test_revert_undoes_record() {
        let mut counters = StatCounters::default();
        counters.record(4, 0);
        counters.record(1, 2);
        counters.revert(4, 0);

        let mut expected = StatCounters::default();
        expected.record(1, 2);
        assert_eq!(counters, expected);
    }

    #[test]
    fn test_rates_without_matches_are_zero() {
        let counters = StatCounters::default();
        assert_eq!(counters.win_rate(), 0.0);
        assert_eq!(counters.average_goals_scored(), 0.0);
    }
}
