use serde::{Deserialize, Serialize};

pub type RatingValue = f64;
pub type StoredRating = i32;

/// Result of a match from the first player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    pub fn from_goals(goals: i32, opponent_goals: i32) -> Self {
        if goals > opponent_goals {
            Outcome::Win
        } else if goals < opponent_goals {
            Outcome::Loss
        } else {
            Outcome::Draw
        }
    }

    /// Actual score used by the expected-score model
    pub fn score(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss => 0.0,
            Outcome::Draw => 0.5,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Outcome::Win => Outcome::Loss,
            Outcome::Loss => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
        }
    }

    pub fn points(self) -> i32 {
        match self {
            Outcome::Win => 3,
            Outcome::Draw => 1,
            Outcome::Loss => 0,
        }
    }

    pub fn as_letter(self) -> &'static str {
        match self {
            Outcome::Win => "W",
            Outcome::Loss => "L",
            Outcome::Draw => "D",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
            Outcome::Draw => "draw",
        }
    }
}

/// Floating-point rating deltas for both sides of a match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingChange {
    pub delta_a: RatingValue,
    pub delta_b: RatingValue,
}

impl RatingChange {
    pub fn swapped(self) -> Self {
        Self {
            delta_a: self.delta_b,
            delta_b: self.delta_a,
        }
    }
}

/// Integer rating update as written back to player records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EloUpdate {
    pub delta_a: StoredRating,
    pub delta_b: StoredRating,
    pub new_rating_a: StoredRating,
    pub new_rating_b: StoredRating,
}
