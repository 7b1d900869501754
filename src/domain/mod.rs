pub mod counters;
pub mod form;
pub mod head_to_head;
pub mod player_stats;
pub mod round_robin;
pub mod standings;
pub mod teams;

pub use counters::StatCounters;
pub use form::recent_form;
pub use head_to_head::HeadToHead;
pub use player_stats::{compute_detailed_stats, DetailedStats};
pub use round_robin::{generate_missing, generate_round_robin, Fixture};
pub use standings::{compute_standings, StandingRow};
pub use teams::push_recent_team;

/// Rounds half away from zero to `places` decimals
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
