use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{Match, MatchId, MatchResult, NewMatch, TournamentId, UserId};

const MATCH_COLUMNS: &str = "id, player1_id, player2_id, player1_goals, player2_goals, team1, team2, half_length, completed, tournament_id, date, applied, player1_elo_change, player2_elo_change";

/// Inserts a match that does not yet count towards player stats
pub fn insert_match(conn: &Connection, new: &NewMatch) -> Result<Match> {
    let sql = format!(
        "INSERT INTO matches (player1_id, player2_id, player1_goals, player2_goals, team1, team2, half_length, completed, tournament_id, date) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) RETURNING {}",
        MATCH_COLUMNS
    );

    conn.query_row(
        &sql,
        params![
            new.player1_id,
            new.player2_id,
            new.player1_goals,
            new.player2_goals,
            new.team1,
            new.team2,
            new.half_length,
            new.completed,
            new.tournament_id,
            new.date
        ],
        parse_match_row,
    )
    .context("Failed to insert match")
}

fn parse_match_row(row: &rusqlite::Row) -> rusqlite::Result<Match> {
    Ok(Match {
        id: row.get(0)?,
        player1_id: row.get(1)?,
        player2_id: row.get(2)?,
        player1_goals: row.get(3)?,
        player2_goals: row.get(4)?,
        team1: row.get(5)?,
        team2: row.get(6)?,
        half_length: row.get(7)?,
        completed: row.get(8)?,
        tournament_id: row.get(9)?,
        date: row.get(10)?,
        applied: row.get(11)?,
        player1_elo_change: row.get(12)?,
        player2_elo_change: row.get(13)?,
    })
}

fn query_matches(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Match>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, parse_match_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn find_by_id(conn: &Connection, id: MatchId) -> Result<Option<Match>> {
    let sql = format!("SELECT {} FROM matches WHERE id = ?1", MATCH_COLUMNS);

    conn.query_row(&sql, params![id], parse_match_row)
        .optional()
        .context("Failed to query match by id")
}

/// Newest first
pub fn list_all(conn: &Connection) -> Result<Vec<Match>> {
    let sql = format!(
        "SELECT {} FROM matches ORDER BY date DESC, id DESC",
        MATCH_COLUMNS
    );
    query_matches(conn, &sql, [])
}

/// Matches that count towards stats, oldest first
pub fn list_applied_chronological(conn: &Connection) -> Result<Vec<Match>> {
    let sql = format!(
        "SELECT {} FROM matches WHERE applied = 1 ORDER BY date ASC, id ASC",
        MATCH_COLUMNS
    );
    query_matches(conn, &sql, [])
}

/// Newest first, optionally limited to completed matches
pub fn list_for_user(
    conn: &Connection,
    user_id: UserId,
    completed_only: bool,
    limit: Option<usize>,
) -> Result<Vec<Match>> {
    let sql = format!(
        "SELECT {} FROM matches
         WHERE (player1_id = ?1 OR player2_id = ?1) AND (?2 = 0 OR completed = 1)
         ORDER BY date DESC, id DESC
         LIMIT ?3",
        MATCH_COLUMNS
    );
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    query_matches(conn, &sql, params![user_id, completed_only, limit])
}

/// Newest first
pub fn list_between(conn: &Connection, player1_id: UserId, player2_id: UserId) -> Result<Vec<Match>> {
    let sql = format!(
        "SELECT {} FROM matches
         WHERE (player1_id = ?1 AND player2_id = ?2) OR (player1_id = ?2 AND player2_id = ?1)
         ORDER BY date DESC, id DESC",
        MATCH_COLUMNS
    );
    query_matches(conn, &sql, params![player1_id, player2_id])
}

pub fn list_by_tournament(conn: &Connection, tournament_id: TournamentId) -> Result<Vec<Match>> {
    let sql = format!(
        "SELECT {} FROM matches WHERE tournament_id = ?1 ORDER BY date DESC, id DESC",
        MATCH_COLUMNS
    );
    query_matches(conn, &sql, params![tournament_id])
}

pub fn page_by_tournament(
    conn: &Connection,
    tournament_id: TournamentId,
    limit: usize,
    offset: usize,
) -> Result<Vec<Match>> {
    let sql = format!(
        "SELECT {} FROM matches WHERE tournament_id = ?1 ORDER BY date DESC, id DESC LIMIT ?2 OFFSET ?3",
        MATCH_COLUMNS
    );
    query_matches(
        conn,
        &sql,
        params![tournament_id, limit as i64, offset as i64],
    )
}

pub fn count_by_tournament(conn: &Connection, tournament_id: TournamentId) -> Result<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM matches WHERE tournament_id = ?1",
            params![tournament_id],
            |row| row.get(0),
        )
        .context("Failed to count tournament matches")?;
    Ok(count as usize)
}

pub fn save_result(conn: &Connection, id: MatchId, result: &MatchResult) -> Result<Match> {
    let sql = format!(
        "UPDATE matches SET
            player1_goals = ?2,
            player2_goals = ?3,
            team1 = ?4,
            team2 = ?5,
            half_length = ?6,
            completed = ?7,
            applied = ?8,
            player1_elo_change = ?9,
            player2_elo_change = ?10
         WHERE id = ?1 RETURNING {}",
        MATCH_COLUMNS
    );

    conn.query_row(
        &sql,
        params![
            id,
            result.player1_goals,
            result.player2_goals,
            result.team1,
            result.team2,
            result.half_length,
            result.completed,
            result.applied,
            result.player1_elo_change,
            result.player2_elo_change
        ],
        parse_match_row,
    )
    .context("Failed to save match result")
}

/// Stores the ELO changes a replay assigned to an applied match
pub fn save_elo_changes(
    conn: &Connection,
    id: MatchId,
    player1_elo_change: i32,
    player2_elo_change: i32,
) -> Result<()> {
    conn.execute(
        "UPDATE matches SET player1_elo_change = ?2, player2_elo_change = ?3 WHERE id = ?1",
        params![id, player1_elo_change, player2_elo_change],
    )
    .context("Failed to save match ELO changes")
    .map(|_| ())
}

/// Removes fixtures of a tournament that were never played
pub fn delete_unplayed_by_tournament(conn: &Connection, tournament_id: TournamentId) -> Result<usize> {
    conn.execute(
        "DELETE FROM matches WHERE tournament_id = ?1 AND completed = 0 AND applied = 0",
        params![tournament_id],
    )
    .context("Failed to delete unplayed fixtures")
}

pub fn delete_match(conn: &Connection, id: MatchId) -> Result<bool> {
    let deleted = conn
        .execute("DELETE FROM matches WHERE id = ?1", params![id])
        .context("Failed to delete match")?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewUser;
    use crate::database::{create_memory_pool, get_connection, setup, users};
    use chrono::{Duration, NaiveDateTime};

    fn seed_users(conn: &Connection) -> (UserId, UserId) {
        let now = NaiveDateTime::default();
        let mut ids = Vec::new();
        for name in ["lea", "tom"] {
            let user = users::insert_user(
                conn,
                &NewUser {
                    username: name.to_string(),
                    email: format!("{}@example.com", name),
                    first_name: None,
                    last_name: None,
                    elo_rating: 1200,
                },
                now,
            )
            .unwrap();
            ids.push(user.id);
        }
        (ids[0], ids[1])
    }

    fn new_match(p1: UserId, p2: UserId, minutes: i64) -> NewMatch {
        NewMatch {
            player1_id: p1,
            player2_id: p2,
            player1_goals: 2,
            player2_goals: 1,
            team1: "Roma".to_string(),
            team2: "Porto".to_string(),
            half_length: 4,
            completed: true,
            tournament_id: None,
            date: NaiveDateTime::default() + Duration::minutes(minutes),
        }
    }

    #[test]
    fn test_list_for_user_orders_newest_first() {
        let pool = create_memory_pool().unwrap();
        let conn = get_connection(&pool).unwrap();
        setup::init_schema(&conn).unwrap();
        let (lea, tom) = seed_users(&conn);

        let older = insert_match(&conn, &new_match(lea, tom, 0)).unwrap();
        let newer = insert_match(&conn, &new_match(tom, lea, 5)).unwrap();

        let listed = list_for_user(&conn, lea, false, None).unwrap();
        let ids: Vec<MatchId> = listed.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        let limited = list_for_user(&conn, lea, false, Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
        assert!(!older.applied);
    }

    #[test]
    fn test_save_result_and_delete() {
        let pool = create_memory_pool().unwrap();
        let conn = get_connection(&pool).unwrap();
        setup::init_schema(&conn).unwrap();
        let (lea, tom) = seed_users(&conn);

        let created = insert_match(&conn, &new_match(lea, tom, 0)).unwrap();
        let saved = save_result(
            &conn,
            created.id,
            &MatchResult {
                player1_goals: 0,
                player2_goals: 0,
                team1: "Roma".to_string(),
                team2: "Lyon".to_string(),
                half_length: 6,
                completed: true,
                applied: true,
                player1_elo_change: 0,
                player2_elo_change: 0,
            },
        )
        .unwrap();
        assert!(saved.applied);
        assert_eq!(saved.team2, "Lyon");
        assert_eq!(list_applied_chronological(&conn).unwrap().len(), 1);

        assert!(delete_match(&conn, created.id).unwrap());
        assert!(!delete_match(&conn, created.id).unwrap());
    }
}
