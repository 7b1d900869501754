pub mod friends;
pub mod lookup;
pub mod matches;
pub mod recalculation;
pub mod server;
pub mod stats;
pub mod tournaments;
pub mod users;

pub use friends::FriendService;
pub use matches::MatchService;
pub use recalculation::{RecalculationReport, RecalculationService};
pub use server::ServerService;
pub use stats::StatsService;
pub use tournaments::TournamentService;
pub use users::UserService;
