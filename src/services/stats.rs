use std::collections::HashMap;

use log::debug;

use super::lookup::Lookup;
use crate::api::models::{DetailedUserStats, LeaderboardEntry, RecentMatch, UserStats, UserView};
use crate::config::settings::AppConfig;
use crate::database::models::{Match, UserId};
use crate::database::{self, matches, tournaments, users, DbPool};
use crate::domain::{compute_detailed_stats, HeadToHead};
use crate::errors::{bad_request, not_found, ServiceResult};
use crate::pagination::{Page, PageParams, PageRequest};

pub const RECENT_MATCHES: usize = 5;

pub struct StatsService<'a> {
    pool: &'a DbPool,
    config: &'a AppConfig,
}

impl<'a> StatsService<'a> {
    pub fn new(pool: &'a DbPool, config: &'a AppConfig) -> Self {
        Self { pool, config }
    }

    /// Stats of the caller with their latest matches, played or scheduled
    pub fn current_user(&self, user_id: UserId) -> ServiceResult<UserStats> {
        let conn = database::get_connection(self.pool)?;
        let user = users::find_by_id(&conn, user_id)?.ok_or_else(|| not_found("User not found"))?;
        let recent = matches::list_for_user(&conn, user_id, false, Some(RECENT_MATCHES))?;

        Ok(UserStats {
            user: UserView::from(&user),
            last_5_matches: recent_matches(&mut Lookup::new(&conn), &recent, user_id)?,
        })
    }

    /// Available for deleted users too
    pub fn detailed(&self, user_id: UserId) -> ServiceResult<DetailedUserStats> {
        let conn = database::get_connection(self.pool)?;
        let user = users::find_by_id(&conn, user_id)?.ok_or_else(|| not_found("User not found"))?;

        let mut played = matches::list_for_user(&conn, user_id, true, None)?;
        let mut lookup = Lookup::new(&conn);
        let last_5 = recent_matches(&mut lookup, &played[..played.len().min(RECENT_MATCHES)], user_id)?;

        let mut usernames = HashMap::new();
        for m in &played {
            let (_, _, opponent_id) = m.perspective(user_id);
            if !usernames.contains_key(&opponent_id) {
                if let Some(opponent) = lookup.user(opponent_id)? {
                    usernames.insert(opponent_id, opponent.display_name().to_string());
                }
            }
        }

        played.reverse();
        let stats = compute_detailed_stats(&user, &played, &usernames);
        debug!(
            "Computed detailed stats for user {} over {} completed matches",
            user_id,
            played.len()
        );

        Ok(DetailedUserStats {
            user: UserView::from(&user),
            stats,
            tournament_ids: tournaments::list_ids_for_player(&conn, user_id)?,
            last_5_matches: last_5,
        })
    }

    /// Completed meetings of the two players, seen from `player1_id`'s side
    pub fn head_to_head(&self, player1_id: UserId, player2_id: UserId) -> ServiceResult<HeadToHead> {
        if player1_id == player2_id {
            return Err(bad_request("Head-to-head needs two different players"));
        }

        let conn = database::get_connection(self.pool)?;
        let mut lookup = Lookup::new(&conn);
        let mut names = Vec::with_capacity(2);
        for id in [player1_id, player2_id] {
            let user = lookup
                .user(id)?
                .ok_or_else(|| not_found("One or both players not found"))?;
            names.push((id, user.display_name().to_string()));
        }

        let meetings: Vec<Match> = matches::list_between(&conn, player1_id, player2_id)?
            .into_iter()
            .filter(|m| m.completed)
            .collect();
        let tournament_names = lookup.tournament_names(&meetings)?;

        let player2 = names.pop().ok_or_else(|| not_found("Player not found"))?;
        let player1 = names.pop().ok_or_else(|| not_found("Player not found"))?;
        Ok(HeadToHead::new(player1, player2).tally(&meetings, &tournament_names))
    }

    pub fn leaderboard(&self, params: &PageParams) -> ServiceResult<Page<LeaderboardEntry>> {
        let request = PageRequest::from_params(params, &self.config.pagination);
        let conn = database::get_connection(self.pool)?;

        let total = users::count_active(&conn)?;
        let ranked = users::leaderboard(&conn, request.limit(), request.offset())?;
        let entries = ranked
            .iter()
            .enumerate()
            .map(|(i, user)| LeaderboardEntry::new(request.offset() + i + 1, user))
            .collect();

        Ok(Page::new(entries, total, request))
    }
}

fn recent_matches(
    lookup: &mut Lookup<'_>,
    matches: &[Match],
    user_id: UserId,
) -> anyhow::Result<Vec<RecentMatch>> {
    matches.iter().map(|m| lookup.recent_match(m, user_id)).collect()
}
