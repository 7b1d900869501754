use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{NewUser, PlayerStanding, TournamentId, User, UserChanges, UserId};
use crate::domain::StatCounters;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, is_deleted, total_matches, total_goals_scored, total_goals_conceded, goal_difference, wins, losses, draws, points, elo_rating, tournaments_played, last_5_teams, created_at, updated_at, deleted_at";

pub fn insert_user(conn: &Connection, user: &NewUser, now: NaiveDateTime) -> Result<User> {
    let sql = format!(
        "INSERT INTO users (username, email, first_name, last_name, elo_rating, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) RETURNING {}",
        USER_COLUMNS
    );

    conn.query_row(
        &sql,
        params![
            user.username,
            user.email,
            user.first_name,
            user.last_name,
            user.elo_rating,
            now
        ],
        parse_user_row,
    )
    .context("Failed to insert user")
}

pub(crate) fn parse_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        is_deleted: row.get(5)?,
        counters: StatCounters {
            total_matches: row.get(6)?,
            total_goals_scored: row.get(7)?,
            total_goals_conceded: row.get(8)?,
            goal_difference: row.get(9)?,
            wins: row.get(10)?,
            losses: row.get(11)?,
            draws: row.get(12)?,
            points: row.get(13)?,
        },
        elo_rating: row.get(14)?,
        tournaments_played: row.get(15)?,
        last_5_teams: parse_teams(row, 16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
        deleted_at: row.get(19)?,
    })
}

fn parse_teams(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn encode_teams(teams: &[String]) -> Result<String> {
    serde_json::to_string(teams).context("Failed to encode last teams")
}

pub fn find_by_id(conn: &Connection, id: UserId) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);

    conn.query_row(&sql, params![id], parse_user_row)
        .optional()
        .context("Failed to query user by id")
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);

    conn.query_row(&sql, params![username], parse_user_row)
        .optional()
        .context("Failed to query user by username")
}

pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);

    conn.query_row(&sql, params![email], parse_user_row)
        .optional()
        .context("Failed to query user by email")
}

fn query_users(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, parse_user_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn list_active(conn: &Connection) -> Result<Vec<User>> {
    let sql = format!(
        "SELECT {} FROM users WHERE is_deleted = 0 ORDER BY username COLLATE NOCASE",
        USER_COLUMNS
    );
    query_users(conn, &sql, [])
}

/// Every user including soft-deleted ones, by id
pub fn list_all(conn: &Connection) -> Result<Vec<User>> {
    let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
    query_users(conn, &sql, [])
}

pub fn search(
    conn: &Connection,
    query: &str,
    exclude_id: UserId,
    limit: usize,
) -> Result<Vec<User>> {
    let sql = format!(
        "SELECT {} FROM users
         WHERE is_deleted = 0 AND id != ?2
           AND (instr(lower(username), lower(?1)) > 0
             OR instr(lower(coalesce(first_name, '')), lower(?1)) > 0
             OR instr(lower(coalesce(last_name, '')), lower(?1)) > 0
             OR instr(lower(email), lower(?1)) > 0)
         ORDER BY username COLLATE NOCASE
         LIMIT ?3",
        USER_COLUMNS
    );
    query_users(conn, &sql, params![query, exclude_id, limit as i64])
}

pub fn leaderboard(conn: &Connection, limit: usize, offset: usize) -> Result<Vec<User>> {
    let sql = format!(
        "SELECT {} FROM users WHERE is_deleted = 0
         ORDER BY elo_rating DESC, points DESC, username COLLATE NOCASE
         LIMIT ?1 OFFSET ?2",
        USER_COLUMNS
    );
    query_users(conn, &sql, params![limit as i64, offset as i64])
}

pub fn count_active(conn: &Connection) -> Result<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users WHERE is_deleted = 0", [], |row| row.get(0))
        .context("Failed to count active users")?;
    Ok(count as usize)
}

pub fn update_profile(
    conn: &Connection,
    id: UserId,
    changes: &UserChanges,
    now: NaiveDateTime,
) -> Result<User> {
    let sql = format!(
        "UPDATE users SET
            username = coalesce(?2, username),
            email = coalesce(?3, email),
            first_name = coalesce(?4, first_name),
            last_name = coalesce(?5, last_name),
            updated_at = ?6
         WHERE id = ?1 RETURNING {}",
        USER_COLUMNS
    );

    conn.query_row(
        &sql,
        params![
            id,
            changes.username,
            changes.email,
            changes.first_name,
            changes.last_name,
            now
        ],
        parse_user_row,
    )
    .context("Failed to update user profile")
}

pub fn soft_delete(conn: &Connection, id: UserId, now: NaiveDateTime) -> Result<()> {
    conn.execute(
        "UPDATE users SET is_deleted = 1, deleted_at = ?2, updated_at = ?2 WHERE id = ?1",
        params![id, now],
    )
    .context("Failed to soft delete user")
    .map(|_| ())
}

pub fn save_standing(
    conn: &Connection,
    id: UserId,
    standing: &PlayerStanding,
    now: NaiveDateTime,
) -> Result<()> {
    let counters = &standing.counters;
    let sql = "UPDATE users SET
            total_matches = ?2,
            total_goals_scored = ?3,
            total_goals_conceded = ?4,
            goal_difference = ?5,
            wins = ?6,
            losses = ?7,
            draws = ?8,
            points = ?9,
            elo_rating = ?10,
            last_5_teams = ?11,
            updated_at = ?12
         WHERE id = ?1";

    conn.execute(
        sql,
        params![
            id,
            counters.total_matches,
            counters.total_goals_scored,
            counters.total_goals_conceded,
            counters.goal_difference,
            counters.wins,
            counters.losses,
            counters.draws,
            counters.points,
            standing.elo_rating,
            encode_teams(&standing.last_5_teams)?,
            now
        ],
    )
    .context("Failed to save player standing")
    .map(|_| ())
}

pub fn increment_tournaments_played(conn: &Connection, tournament_id: TournamentId) -> Result<usize> {
    conn.execute(
        "UPDATE users SET tournaments_played = tournaments_played + 1
         WHERE id IN (SELECT user_id FROM tournament_players WHERE tournament_id = ?1)",
        params![tournament_id],
    )
    .context("Failed to increment tournaments played")
}
