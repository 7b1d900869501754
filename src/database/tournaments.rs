use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{NewTournament, Tournament, TournamentChanges, TournamentId, User, UserId};
use super::users::parse_user_row;

const TOURNAMENT_COLUMNS: &str = "id, name, description, start_date, end_date, completed, owner_id, rounds_per_matchup, created_at";

pub fn insert_tournament(
    conn: &Connection,
    tournament: &NewTournament,
    now: NaiveDateTime,
) -> Result<Tournament> {
    let sql = format!(
        "INSERT INTO tournaments (name, description, start_date, owner_id, rounds_per_matchup, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING {}",
        TOURNAMENT_COLUMNS
    );

    conn.query_row(
        &sql,
        params![
            tournament.name,
            tournament.description,
            tournament.start_date,
            tournament.owner_id,
            tournament.rounds_per_matchup,
            now
        ],
        parse_tournament_row,
    )
    .context("Failed to insert new tournament")
}

fn parse_tournament_row(row: &rusqlite::Row) -> rusqlite::Result<Tournament> {
    Ok(Tournament {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        completed: row.get(5)?,
        owner_id: row.get(6)?,
        rounds_per_matchup: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn find_by_id(conn: &Connection, id: TournamentId) -> Result<Option<Tournament>> {
    let sql = format!("SELECT {} FROM tournaments WHERE id = ?1", TOURNAMENT_COLUMNS);

    conn.query_row(&sql, params![id], parse_tournament_row)
        .optional()
        .context("Failed to query tournament by id")
}

/// Tournaments the user owns or plays in, newest start first
pub fn list_for_user(conn: &Connection, user_id: UserId) -> Result<Vec<Tournament>> {
    let sql = format!(
        "SELECT {} FROM tournaments
         WHERE owner_id = ?1
            OR id IN (SELECT tournament_id FROM tournament_players WHERE user_id = ?1)
         ORDER BY start_date DESC, id DESC",
        TOURNAMENT_COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_id], parse_tournament_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Tournaments the user is on the roster of, oldest first
pub fn list_ids_for_player(conn: &Connection, user_id: UserId) -> Result<Vec<TournamentId>> {
    let mut stmt = conn.prepare(
        "SELECT tournament_id FROM tournament_players WHERE user_id = ?1 ORDER BY tournament_id",
    )?;
    let rows = stmt
        .query_map(params![user_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn update_tournament(
    conn: &Connection,
    id: TournamentId,
    changes: &TournamentChanges,
) -> Result<Tournament> {
    let sql = format!(
        "UPDATE tournaments SET
            name = coalesce(?2, name),
            description = coalesce(?3, description),
            start_date = coalesce(?4, start_date),
            end_date = coalesce(?5, end_date),
            rounds_per_matchup = coalesce(?6, rounds_per_matchup)
         WHERE id = ?1 RETURNING {}",
        TOURNAMENT_COLUMNS
    );

    conn.query_row(
        &sql,
        params![
            id,
            changes.name,
            changes.description,
            changes.start_date,
            changes.end_date,
            changes.rounds_per_matchup
        ],
        parse_tournament_row,
    )
    .context("Failed to update tournament")
}

pub fn mark_completed(
    conn: &Connection,
    id: TournamentId,
    end_date: NaiveDateTime,
) -> Result<Tournament> {
    let sql = format!(
        "UPDATE tournaments SET completed = 1, end_date = ?2 WHERE id = ?1 RETURNING {}",
        TOURNAMENT_COLUMNS
    );

    conn.query_row(&sql, params![id, end_date], parse_tournament_row)
        .context("Failed to mark tournament completed")
}

/// Removes the tournament, its roster and all of its matches
pub fn delete_tournament(conn: &Connection, id: TournamentId) -> Result<()> {
    conn.execute("DELETE FROM matches WHERE tournament_id = ?1", params![id])
        .context("Failed to delete tournament matches")?;
    conn.execute("DELETE FROM tournaments WHERE id = ?1", params![id])
        .context("Failed to delete tournament")?;
    Ok(())
}

pub fn add_player(
    conn: &Connection,
    tournament_id: TournamentId,
    user_id: UserId,
    now: NaiveDateTime,
) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO tournament_players (tournament_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
        params![tournament_id, user_id, now],
    )
    .context("Failed to add tournament player")
    .map(|_| ())
}

pub fn remove_player(conn: &Connection, tournament_id: TournamentId, user_id: UserId) -> Result<bool> {
    let removed = conn
        .execute(
            "DELETE FROM tournament_players WHERE tournament_id = ?1 AND user_id = ?2",
            params![tournament_id, user_id],
        )
        .context("Failed to remove tournament player")?;
    Ok(removed > 0)
}

pub fn is_player(conn: &Connection, tournament_id: TournamentId, user_id: UserId) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tournament_players WHERE tournament_id = ?1 AND user_id = ?2)",
        params![tournament_id, user_id],
        |row| row.get(0),
    )
    .context("Failed to check tournament membership")
}

/// Player ids in join order
pub fn list_player_ids(conn: &Connection, tournament_id: TournamentId) -> Result<Vec<UserId>> {
    let mut stmt = conn.prepare(
        "SELECT user_id FROM tournament_players WHERE tournament_id = ?1 ORDER BY joined_at, rowid",
    )?;
    let rows = stmt
        .query_map(params![tournament_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn list_players(conn: &Connection, tournament_id: TournamentId) -> Result<Vec<User>> {
    let sql = "SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.is_deleted,
                u.total_matches, u.total_goals_scored, u.total_goals_conceded, u.goal_difference,
                u.wins, u.losses, u.draws, u.points, u.elo_rating, u.tournaments_played,
                u.last_5_teams, u.created_at, u.updated_at, u.deleted_at
         FROM tournament_players tp
         JOIN users u ON u.id = tp.user_id
         WHERE tp.tournament_id = ?1
         ORDER BY tp.joined_at, tp.rowid";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![tournament_id], parse_user_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}
