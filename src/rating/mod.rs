pub mod elo;
pub mod types;

pub use elo::{expected_score, EloCalculator, DEFAULT_ELO_RATING, ELO_K_FACTOR};
pub use types::{EloUpdate, Outcome, RatingChange, RatingValue, StoredRating};
