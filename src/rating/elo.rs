use log::debug;

use super::types::{EloUpdate, Outcome, RatingChange, RatingValue, StoredRating};
use crate::config::settings::EloSettings;

pub const DEFAULT_ELO_RATING: StoredRating = 1200;
pub const ELO_K_FACTOR: f64 = 32.0;

// Rating gap at which the stronger side is expected to score 10:1
const LOGISTIC_SCALE: f64 = 400.0;

/// Probability-like expected score of `rating` against `opponent_rating`
pub fn expected_score(rating: RatingValue, opponent_rating: RatingValue) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent_rating - rating) / LOGISTIC_SCALE))
}

/// Standard ELO update with a fixed K-factor.
///
/// The calculator is a pure value: it holds no state besides the K-factor and
/// can be shared freely between request handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EloCalculator {
    k_factor: f64,
}

impl Default for EloCalculator {
    fn default() -> Self {
        Self::new(ELO_K_FACTOR)
    }
}

impl From<&EloSettings> for EloCalculator {
    fn from(settings: &EloSettings) -> Self {
        Self::new(settings.k_factor)
    }
}

impl EloCalculator {
    pub fn new(k_factor: f64) -> Self {
        Self { k_factor }
    }

    pub fn k_factor(&self) -> f64 {
        self.k_factor
    }

    /// Rating deltas for both players given the final score
    pub fn compute_rating_change(
        &self,
        rating_a: RatingValue,
        rating_b: RatingValue,
        goals_a: i32,
        goals_b: i32,
    ) -> RatingChange {
        let expected_a = expected_score(rating_a, rating_b);
        let expected_b = 1.0 - expected_a;

        let outcome_a = Outcome::from_goals(goals_a, goals_b);
        let actual_a = outcome_a.score();
        let actual_b = outcome_a.reversed().score();

        RatingChange {
            delta_a: self.k_factor * (actual_a - expected_a),
            delta_b: self.k_factor * (actual_b - expected_b),
        }
    }

    pub fn compute_new_ratings(
        &self,
        rating_a: RatingValue,
        rating_b: RatingValue,
        goals_a: i32,
        goals_b: i32,
    ) -> (RatingValue, RatingValue) {
        let change = self.compute_rating_change(rating_a, rating_b, goals_a, goals_b);
        (rating_a + change.delta_a, rating_b + change.delta_b)
    }

    /// Applies a match to integer ratings as stored on player records.
    ///
    /// Player A's delta is rounded half away from zero and player B receives
    /// its exact negation, so stored ratings never drift from zero-sum.
    pub fn apply(
        &self,
        rating_a: StoredRating,
        rating_b: StoredRating,
        goals_a: i32,
        goals_b: i32,
    ) -> EloUpdate {
        let change = self.compute_rating_change(
            f64::from(rating_a),
            f64::from(rating_b),
            goals_a,
            goals_b,
        );
        // |delta_a| <= k_factor, so the cast never saturates for a validated K
        debug_assert!(change.delta_a.abs() <= self.k_factor);
        let delta_a = change.delta_a.round() as StoredRating;
        let delta_b = -delta_a;

        let update = EloUpdate {
            delta_a,
            delta_b,
            new_rating_a: rating_a + delta_a,
            new_rating_b: rating_b + delta_b,
        };

        debug!(
            "ELO calculation: A({}->{}) vs B({}->{}) score {}-{}",
            rating_a, update.new_rating_a, rating_b, update.new_rating_b, goals_a, goals_b
        );

        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn calculator() -> EloCalculator {
        EloCalculator::default()
    }

    #[test]
    fn test_equal_ratings_draw_is_noop() {
        let change = calculator().compute_rating_change(1200.0, 1200.0, 2, 2);
        assert!(change.delta_a.abs() < TOLERANCE);
        assert!(change.delta_b.abs() < TOLERANCE);
    }

    #[test]
    fn test_equal_ratings_decisive_win() {
        let change = calculator().compute_rating_change(1200.0, 1200.0, 3, 1);
        assert!((change.delta_a - 16.0).abs() < TOLERANCE);
        assert!((change.delta_b + 16.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_upset_bonus() {
        let underdog = calculator().compute_rating_change(1000.0, 1400.0, 3, 1);
        let favourite = calculator().compute_rating_change(1400.0, 1000.0, 3, 1);

        assert!((underdog.delta_a - 32.0 * (1.0 - 1.0 / 11.0)).abs() < 1e-6);
        assert!((favourite.delta_a - 32.0 * (1.0 - 10.0 / 11.0)).abs() < 1e-6);
        assert!(underdog.delta_a > favourite.delta_a);
        assert_eq!(underdog.delta_a.round(), 29.0);
        assert_eq!(favourite.delta_a.round(), 3.0);
    }

    #[test]
    fn test_zero_sum_across_grid() {
        let ratings = [-300.0, 0.0, 850.0, 1200.0, 1525.5, 2400.0];
        let scores = [(0, 0), (1, 0), (0, 4), (7, 7), (3, 2)];

        for &ra in &ratings {
            for &rb in &ratings {
                for &(ga, gb) in &scores {
                    let change = calculator().compute_rating_change(ra, rb, ga, gb);
                    assert!(
                        (change.delta_a + change.delta_b).abs() < TOLERANCE,
                        "not zero-sum for {ra} vs {rb} at {ga}-{gb}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_symmetry_when_players_swap() {
        let forward = calculator().compute_rating_change(1340.0, 1180.0, 1, 2);
        let backward = calculator().compute_rating_change(1180.0, 1340.0, 2, 1);

        assert!((forward.delta_a - backward.delta_b).abs() < TOLERANCE);
        assert!((forward.delta_b - backward.delta_a).abs() < TOLERANCE);
        assert!((forward.swapped().delta_a - backward.delta_a).abs() < TOLERANCE);
    }

    #[test]
    fn test_monotonic_in_own_rating() {
        let mut previous = f64::INFINITY;
        for rating_a in (600..=2000).step_by(50) {
            let change = calculator().compute_rating_change(f64::from(rating_a), 1200.0, 2, 0);
            assert!(change.delta_a <= previous);
            previous = change.delta_a;
        }
    }

    #[test]
    fn test_new_ratings_add_deltas() {
        let (new_a, new_b) = calculator().compute_new_ratings(1200.0, 1200.0, 3, 1);
        assert!((new_a - 1216.0).abs() < TOLERANCE);
        assert!((new_b - 1184.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_apply_rounds_and_stays_zero_sum() {
        let update = calculator().apply(1000, 1400, 3, 1);
        assert_eq!(update.delta_a, 29);
        assert_eq!(update.delta_b, -29);
        assert_eq!(update.new_rating_a, 1029);
        assert_eq!(update.new_rating_b, 1371);
    }

    #[test]
    fn test_apply_allows_negative_ratings() {
        let update = calculator().apply(5, 1200, 0, 9);
        assert!(update.new_rating_a < 5);
        assert_eq!(update.delta_a + update.delta_b, 0);
    }

    #[test]
    fn test_apply_extreme_gap_stays_within_k() {
        let update = calculator().apply(-1_000_000, 1_000_000, 1, 0);
        assert_eq!(update.delta_a, 32);
        let update = calculator().apply(1_000_000, -1_000_000, 1, 0);
        assert_eq!(update.delta_a, 0);
    }

    #[test]
    fn test_custom_k_factor_scales_delta() {
        let change = EloCalculator::new(64.0).compute_rating_change(1200.0, 1200.0, 1, 0);
        assert!((change.delta_a - 32.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_deterministic() {
        let first = calculator().compute_rating_change(1111.0, 1333.0, 4, 4);
        let second = calculator().compute_rating_change(1111.0, 1333.0, 4, 4);
        assert_eq!(first, second);
    }
}
