use std::collections::HashSet;

use log::info;
use rusqlite::{Connection, TransactionBehavior};

use super::lookup::Lookup;
use super::matches::{remove_match, revert_match};
use crate::api::models::{
    CreateTournamentRequest, FriendView, MatchView, TournamentView, UpdateTournamentRequest,
};
use crate::config::settings::AppConfig;
use crate::database::models::{
    NewMatch, NewTournament, Tournament, TournamentChanges, TournamentId, UserId,
};
use crate::database::{self, matches, tournaments, users, DbPool};
use crate::domain::{compute_standings, generate_missing, generate_round_robin, Fixture, StandingRow};
use crate::errors::{bad_request, conflict, forbidden, not_found, ServiceResult};
use crate::pagination::{Page, PageParams, PageRequest};

pub const DEFAULT_ROUNDS_PER_MATCHUP: i32 = 2;
const FIXTURE_HALF_LENGTH: i32 = 4;

pub struct TournamentService<'a> {
    pool: &'a DbPool,
    config: &'a AppConfig,
}

impl<'a> TournamentService<'a> {
    pub fn new(pool: &'a DbPool, config: &'a AppConfig) -> Self {
        Self { pool, config }
    }

    pub fn create(
        &self,
        owner_id: UserId,
        request: &CreateTournamentRequest,
    ) -> ServiceResult<TournamentView> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(bad_request("Tournament name cannot be empty"));
        }
        let rounds = request.rounds_per_matchup.unwrap_or(DEFAULT_ROUNDS_PER_MATCHUP);
        validate_rounds(rounds, self.config.tournaments.max_rounds_per_matchup)?;

        let mut seen = HashSet::new();
        let player_ids: Vec<UserId> = request
            .player_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let mut conn = database::get_connection(self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if users::find_by_id(&tx, owner_id)?.is_none() {
            return Err(not_found("User not found"));
        }
        for &player_id in &player_ids {
            if users::find_by_id(&tx, player_id)?.is_none() {
                return Err(bad_request("One or more player IDs are invalid"));
            }
        }

        let now = database::now();
        let tournament = tournaments::insert_tournament(
            &tx,
            &NewTournament {
                name: name.to_string(),
                description: request.description.clone(),
                start_date: request.start_date.unwrap_or(now),
                owner_id,
                rounds_per_matchup: rounds,
            },
            now,
        )?;
        for &player_id in &player_ids {
            tournaments::add_player(&tx, tournament.id, player_id, now)?;
        }
        let fixtures = generate_round_robin(&player_ids, rounds as u32);
        insert_fixtures(&tx, tournament.id, &fixtures)?;

        let view = tournament_view(&tx, &tournament)?;
        tx.commit()?;

        info!(
            "Created tournament {} '{}' with {} fixtures",
            tournament.id,
            tournament.name,
            fixtures.len()
        );
        Ok(view)
    }

    pub fn list_for_user(&self, user_id: UserId) -> ServiceResult<Vec<TournamentView>> {
        let conn = database::get_connection(self.pool)?;
        let found = tournaments::list_for_user(&conn, user_id)?;
        found
            .iter()
            .map(|t| tournament_view(&conn, t))
            .collect()
    }

    pub fn get(&self, id: TournamentId) -> ServiceResult<TournamentView> {
        let conn = database::get_connection(self.pool)?;
        let tournament = load_tournament(&conn, id)?;
        tournament_view(&conn, &tournament)
    }

    pub fn update(
        &self,
        id: TournamentId,
        request: &UpdateTournamentRequest,
    ) -> ServiceResult<TournamentView> {
        let changes = TournamentChanges {
            name: request.name.as_deref().map(|s| s.trim().to_string()),
            description: request.description.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            rounds_per_matchup: request.rounds_per_matchup,
        };
        if changes.is_empty() {
            return Err(bad_request("No fields to update"));
        }
        if changes.name.as_deref().is_some_and(str::is_empty) {
            return Err(bad_request("Tournament name cannot be empty"));
        }
        if let Some(rounds) = changes.rounds_per_matchup {
            validate_rounds(rounds, self.config.tournaments.max_rounds_per_matchup)?;
        }

        let mut conn = database::get_connection(self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let tournament = load_tournament(&tx, id)?;

        let start = changes.start_date.unwrap_or(tournament.start_date);
        if let Some(end) = changes.end_date.or(tournament.end_date) {
            if start > end {
                return Err(bad_request("Start date cannot be after end date"));
            }
        }

        let rounds_changed = changes
            .rounds_per_matchup
            .is_some_and(|rounds| rounds != tournament.rounds_per_matchup);
        if rounds_changed && tournament.completed {
            return Err(bad_request(
                "Cannot change rounds per matchup for a completed tournament",
            ));
        }

        let updated = tournaments::update_tournament(&tx, id, &changes)?;
        if rounds_changed {
            let removed = matches::delete_unplayed_by_tournament(&tx, id)?;
            let added = fill_missing_fixtures(&tx, &updated)?;
            info!(
                "Tournament {} now plays {} rounds: {} unplayed fixtures replaced by {}",
                id, updated.rounds_per_matchup, removed, added
            );
        }

        let view = tournament_view(&tx, &updated)?;
        tx.commit()?;
        Ok(view)
    }

    pub fn delete(&self, caller_id: UserId, id: TournamentId) -> ServiceResult<()> {
        let mut conn = database::get_connection(self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let tournament = load_tournament(&tx, id)?;
        if tournament.owner_id != caller_id {
            return Err(forbidden("You can only delete tournaments that you created"));
        }

        let scheduled = matches::list_by_tournament(&tx, id)?;
        for m in scheduled.iter().filter(|m| m.applied) {
            revert_match(&tx, m)?;
        }
        tournaments::delete_tournament(&tx, id)?;
        tx.commit()?;

        info!(
            "Deleted tournament {} and {} matches by user {}",
            id,
            scheduled.len(),
            caller_id
        );
        Ok(())
    }

    pub fn add_player(&self, id: TournamentId, player_id: UserId) -> ServiceResult<TournamentView> {
        let mut conn = database::get_connection(self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let tournament = load_tournament(&tx, id)?;
        if tournament.completed {
            return Err(bad_request("Cannot add players to a completed tournament"));
        }
        if users::find_by_id(&tx, player_id)?.is_none_or(|u| u.is_deleted) {
            return Err(not_found("Player not found"));
        }
        if tournaments::is_player(&tx, id, player_id)? {
            return Err(conflict("Player already in tournament"));
        }

        tournaments::add_player(&tx, id, player_id, database::now())?;
        let added = fill_missing_fixtures(&tx, &tournament)?;
        let view = tournament_view(&tx, &tournament)?;
        tx.commit()?;

        info!(
            "Added player {} to tournament {} with {} new fixtures",
            player_id, id, added
        );
        Ok(view)
    }

    pub fn remove_player(&self, id: TournamentId, player_id: UserId) -> ServiceResult<TournamentView> {
        let mut conn = database::get_connection(self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let tournament = load_tournament(&tx, id)?;
        if tournament.completed {
            return Err(bad_request("Cannot remove players from a completed tournament"));
        }
        if !tournaments::remove_player(&tx, id, player_id)? {
            return Err(not_found("Player not found in tournament"));
        }

        let involved: Vec<_> = matches::list_by_tournament(&tx, id)?
            .into_iter()
            .filter(|m| m.involves(player_id))
            .collect();
        for m in &involved {
            remove_match(&tx, m)?;
        }
        let added = fill_missing_fixtures(&tx, &tournament)?;
        let view = tournament_view(&tx, &tournament)?;
        tx.commit()?;

        info!(
            "Removed player {} from tournament {}: {} matches deleted, {} fixtures added",
            player_id,
            id,
            involved.len(),
            added
        );
        Ok(view)
    }

    pub fn players(&self, id: TournamentId) -> ServiceResult<Vec<FriendView>> {
        let conn = database::get_connection(self.pool)?;
        load_tournament(&conn, id)?;
        let players = tournaments::list_players(&conn, id)?;
        Ok(players.iter().map(FriendView::from).collect())
    }

    pub fn matches(&self, id: TournamentId, params: &PageParams) -> ServiceResult<Page<MatchView>> {
        let request = PageRequest::from_params(params, &self.config.pagination);
        let conn = database::get_connection(self.pool)?;
        load_tournament(&conn, id)?;

        let total = matches::count_by_tournament(&conn, id)?;
        let page = matches::page_by_tournament(&conn, id, request.limit(), request.offset())?;
        let views = Lookup::new(&conn).match_views(&page)?;
        Ok(Page::new(views, total, request))
    }

    pub fn standings(&self, id: TournamentId) -> ServiceResult<Vec<StandingRow>> {
        let conn = database::get_connection(self.pool)?;
        load_tournament(&conn, id)?;
        let players = tournaments::list_players(&conn, id)?;
        let scheduled = matches::list_by_tournament(&conn, id)?;
        Ok(compute_standings(&players, &scheduled))
    }

    pub fn end(&self, caller_id: UserId, id: TournamentId) -> ServiceResult<TournamentView> {
        let mut conn = database::get_connection(self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let tournament = load_tournament(&tx, id)?;
        if tournament.owner_id != caller_id {
            return Err(forbidden("You can only end tournaments that you created"));
        }
        if tournament.completed {
            return Err(bad_request("Tournament is already completed"));
        }

        let ended = tournaments::mark_completed(&tx, id, database::now())?;
        let credited = users::increment_tournaments_played(&tx, id)?;
        let view = tournament_view(&tx, &ended)?;
        tx.commit()?;

        info!(
            "Tournament {} ended by user {}, {} players credited",
            id, caller_id, credited
        );
        Ok(view)
    }
}

fn validate_rounds(rounds: i32, max_rounds: i32) -> ServiceResult<()> {
    if !(1..=max_rounds).contains(&rounds) {
        return Err(bad_request(format!(
            "Rounds per matchup must be between 1 and {}",
            max_rounds
        )));
    }
    Ok(())
}

fn load_tournament(conn: &Connection, id: TournamentId) -> ServiceResult<Tournament> {
    tournaments::find_by_id(conn, id)?.ok_or_else(|| not_found("Tournament not found"))
}

fn tournament_view(conn: &Connection, tournament: &Tournament) -> ServiceResult<TournamentView> {
    let player_ids = tournaments::list_player_ids(conn, tournament.id)?;
    let matches_count = matches::count_by_tournament(conn, tournament.id)?;
    Ok(TournamentView::new(tournament, player_ids, matches_count))
}

fn insert_fixtures(conn: &Connection, tournament_id: TournamentId, fixtures: &[Fixture]) -> ServiceResult<()> {
    let date = database::now();
    for fixture in fixtures {
        matches::insert_match(
            conn,
            &NewMatch {
                player1_id: fixture.player1_id,
                player2_id: fixture.player2_id,
                player1_goals: 0,
                player2_goals: 0,
                team1: String::new(),
                team2: String::new(),
                half_length: FIXTURE_HALF_LENGTH,
                completed: false,
                tournament_id: Some(tournament_id),
                date,
            },
        )?;
    }
    Ok(())
}

/// Schedules the round-robin fixtures the current roster is still missing
fn fill_missing_fixtures(conn: &Connection, tournament: &Tournament) -> ServiceResult<usize> {
    let player_ids = tournaments::list_player_ids(conn, tournament.id)?;
    let existing = matches::list_by_tournament(conn, tournament.id)?;
    let rounds = tournament.rounds_per_matchup.max(0) as u32;

    let missing = generate_missing(&existing, &player_ids, rounds);
    insert_fixtures(conn, tournament.id, &missing)?;
    Ok(missing.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{RecordMatchRequest, UpdateMatchRequest};
    use crate::database::models::NewUser;
    use crate::database::{create_memory_pool, get_connection, setup};
    use crate::errors::ServiceError;
    use crate::services::matches::MatchService;

    fn setup_pool(names: &[&str]) -> (DbPool, Vec<UserId>) {
        let pool = create_memory_pool().unwrap();
        let conn = get_connection(&pool).unwrap();
        setup::init_schema(&conn).unwrap();
        let ids = names
            .iter()
            .map(|name| {
                users::insert_user(
                    &conn,
                    &NewUser {
                        username: name.to_string(),
                        email: format!("{}@example.com", name),
                        first_name: None,
                        last_name: None,
                        elo_rating: 1200,
                    },
                    database::now(),
                )
                .unwrap()
                .id
            })
            .collect();
        drop(conn);
        (pool, ids)
    }

    fn create_request(player_ids: Vec<UserId>, rounds: i32) -> CreateTournamentRequest {
        CreateTournamentRequest {
            name: "League Night".to_string(),
            description: Some("Thursday games".to_string()),
            start_date: None,
            player_ids,
            rounds_per_matchup: Some(rounds),
        }
    }

    fn play(pool: &DbPool, config: &AppConfig, match_id: i64, g1: i32, g2: i32) {
        MatchService::new(pool, config)
            .update(
                match_id,
                &UpdateMatchRequest {
                    player1_goals: g1,
                    player2_goals: g2,
                    team1: Some("Roma".to_string()),
                    team2: Some("Lyon".to_string()),
                    half_length: 4,
                    completed: true,
                },
            )
            .unwrap();
    }

    #[test]
    fn test_create_generates_fixtures() {
        let (pool, ids) = setup_pool(&["ada", "bo", "cy"]);
        let config = AppConfig::new();
        let service = TournamentService::new(&pool, &config);

        let view = service.create(ids[0], &create_request(ids.clone(), 2)).unwrap();
        assert_eq!(view.matches_count, 6);
        assert_eq!(view.player_ids, ids);
        assert_eq!(view.owner_id, ids[0]);

        let page = service.matches(view.id, &PageParams::default()).unwrap();
        assert_eq!(page.total, 6);
        assert!(page.items.iter().all(|m| !m.completed && !m.applied));
        assert!(page.items.iter().all(|m| m.half_length == 4));

        assert!(matches!(
            service.create(ids[0], &create_request(vec![ids[1], 999], 1)),
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[test]
    fn test_fixtures_count_only_once_completed() {
        let (pool, ids) = setup_pool(&["ada", "bo"]);
        let config = AppConfig::new();
        let service = TournamentService::new(&pool, &config);
        let view = service.create(ids[0], &create_request(ids.clone(), 1)).unwrap();

        let fixture = service.matches(view.id, &PageParams::default()).unwrap().items[0].clone();
        let conn = get_connection(&pool).unwrap();
        assert_eq!(users::find_by_id(&conn, ids[0]).unwrap().unwrap().counters.total_matches, 0);
        drop(conn);

        play(&pool, &config, fixture.id, 2, 0);

        let table = service.standings(view.id).unwrap();
        assert_eq!(table[0].user_id, fixture.player1_id);
        assert_eq!(table[0].counters.points, 3);
        assert_eq!(table[0].last_5_matches, vec!["W", "-", "-", "-", "-"]);

        let conn = get_connection(&pool).unwrap();
        let winner = users::find_by_id(&conn, fixture.player1_id).unwrap().unwrap();
        assert_eq!(winner.elo_rating, 1216);
    }

    #[test]
    fn test_add_and_remove_player_keep_round_robin() {
        let (pool, ids) = setup_pool(&["ada", "bo", "cy"]);
        let config = AppConfig::new();
        let service = TournamentService::new(&pool, &config);
        let view = service.create(ids[0], &create_request(vec![ids[0], ids[1]], 2)).unwrap();
        assert_eq!(view.matches_count, 2);

        let grown = service.add_player(view.id, ids[2]).unwrap();
        assert_eq!(grown.matches_count, 6);
        assert!(matches!(service.add_player(view.id, ids[2]), Err(ServiceError::Conflict(_))));
        assert!(matches!(service.add_player(view.id, 999), Err(ServiceError::NotFound(_))));

        let shrunk = service.remove_player(view.id, ids[1]).unwrap();
        assert_eq!(shrunk.matches_count, 2);
        assert_eq!(shrunk.player_ids, vec![ids[0], ids[2]]);
        assert!(matches!(
            service.remove_player(view.id, ids[1]),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_player_reverts_played_matches() {
        let (pool, ids) = setup_pool(&["ada", "bo", "cy"]);
        let config = AppConfig::new();
        let service = TournamentService::new(&pool, &config);
        let view = service.create(ids[0], &create_request(ids.clone(), 1)).unwrap();

        let fixtures = service.matches(view.id, &PageParams::default()).unwrap().items;
        for fixture in fixtures.iter().filter(|m| m.player1_id == ids[1] || m.player2_id == ids[1]) {
            play(&pool, &config, fixture.id, 3, 0);
        }

        service.remove_player(view.id, ids[1]).unwrap();

        let conn = get_connection(&pool).unwrap();
        for id in &ids {
            let user = users::find_by_id(&conn, *id).unwrap().unwrap();
            assert_eq!(user.elo_rating, 1200);
            assert_eq!(user.counters.total_matches, 0);
        }
    }

    #[test]
    fn test_update_rounds_regenerates_unplayed_fixtures() {
        let (pool, ids) = setup_pool(&["ada", "bo"]);
        let config = AppConfig::new();
        let service = TournamentService::new(&pool, &config);
        let view = service.create(ids[0], &create_request(ids.clone(), 2)).unwrap();

        let first = service.matches(view.id, &PageParams::default()).unwrap().items[0].clone();
        play(&pool, &config, first.id, 1, 1);

        let updated = service
            .update(
                view.id,
                &UpdateTournamentRequest {
                    rounds_per_matchup: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.rounds_per_matchup, 1);
        assert_eq!(updated.matches_count, 2);

        assert!(matches!(
            service.update(view.id, &UpdateTournamentRequest::default()),
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[test]
    fn test_owner_only_end_and_delete() {
        let (pool, ids) = setup_pool(&["ada", "bo"]);
        let config = AppConfig::new();
        let service = TournamentService::new(&pool, &config);
        let view = service.create(ids[0], &create_request(ids.clone(), 1)).unwrap();

        assert!(matches!(service.end(ids[1], view.id), Err(ServiceError::Forbidden(_))));
        let ended = service.end(ids[0], view.id).unwrap();
        assert!(ended.completed);
        assert!(ended.end_date.is_some());
        assert!(matches!(service.end(ids[0], view.id), Err(ServiceError::BadRequest(_))));

        let conn = get_connection(&pool).unwrap();
        assert_eq!(users::find_by_id(&conn, ids[1]).unwrap().unwrap().tournaments_played, 1);
        drop(conn);

        assert!(matches!(
            MatchService::new(&pool, &config).record(&RecordMatchRequest {
                player1_id: ids[0],
                player2_id: ids[1],
                player1_goals: 1,
                player2_goals: 0,
                team1: String::new(),
                team2: String::new(),
                half_length: 4,
                tournament_id: Some(view.id),
                completed: true,
            }),
            Err(ServiceError::BadRequest(_))
        ));

        assert!(matches!(service.delete(ids[1], view.id), Err(ServiceError::Forbidden(_))));
        service.delete(ids[0], view.id).unwrap();
        assert!(matches!(service.get(view.id), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_rounds_above_limit_rejected() {
        let (pool, ids) = setup_pool(&["ada", "bo"]);
        let config = AppConfig::new();
        let service = TournamentService::new(&pool, &config);

        assert!(matches!(
            service.create(ids[0], &create_request(ids.clone(), i32::MAX)),
            Err(ServiceError::BadRequest(_))
        ));
        assert!(service.list_for_user(ids[0]).unwrap().is_empty());

        let view = service.create(ids[0], &create_request(ids.clone(), 10)).unwrap();
        assert_eq!(view.matches_count, 10);

        let too_many = UpdateTournamentRequest {
            rounds_per_matchup: Some(11),
            ..Default::default()
        };
        assert!(matches!(
            service.update(view.id, &too_many),
            Err(ServiceError::BadRequest(_))
        ));
        assert_eq!(service.get(view.id).unwrap().matches_count, 10);
    }
}
