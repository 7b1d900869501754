use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{Friendship, FriendshipStatus, UserId};

const FRIENDSHIP_COLUMNS: &str = "requester_id, addressee_id, status, created_at";

fn parse_friendship_row(row: &rusqlite::Row) -> rusqlite::Result<Friendship> {
    let raw_status: String = row.get(2)?;
    let status = FriendshipStatus::parse(&raw_status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown friendship status '{}'", raw_status).into(),
        )
    })?;

    Ok(Friendship {
        requester_id: row.get(0)?,
        addressee_id: row.get(1)?,
        status,
        created_at: row.get(3)?,
    })
}

/// The friendship row between two users in either direction
pub fn find_between(conn: &Connection, a: UserId, b: UserId) -> Result<Option<Friendship>> {
    let sql = format!(
        "SELECT {} FROM friendships
         WHERE (requester_id = ?1 AND addressee_id = ?2) OR (requester_id = ?2 AND addressee_id = ?1)",
        FRIENDSHIP_COLUMNS
    );

    conn.query_row(&sql, params![a, b], parse_friendship_row)
        .optional()
        .context("Failed to query friendship")
}

pub fn insert_request(
    conn: &Connection,
    requester_id: UserId,
    addressee_id: UserId,
    now: NaiveDateTime,
) -> Result<Friendship> {
    let sql = format!(
        "INSERT INTO friendships (requester_id, addressee_id, status, created_at) VALUES (?1, ?2, ?3, ?4) RETURNING {}",
        FRIENDSHIP_COLUMNS
    );

    conn.query_row(
        &sql,
        params![
            requester_id,
            addressee_id,
            FriendshipStatus::Pending.as_str(),
            now
        ],
        parse_friendship_row,
    )
    .context("Failed to insert friend request")
}

/// Accepts a pending request sent by `requester_id`; false when none exists
pub fn accept_request(conn: &Connection, requester_id: UserId, addressee_id: UserId) -> Result<bool> {
    let updated = conn
        .execute(
            "UPDATE friendships SET status = ?3
             WHERE requester_id = ?1 AND addressee_id = ?2 AND status = ?4",
            params![
                requester_id,
                addressee_id,
                FriendshipStatus::Accepted.as_str(),
                FriendshipStatus::Pending.as_str()
            ],
        )
        .context("Failed to accept friend request")?;
    Ok(updated > 0)
}

pub fn delete_request(conn: &Connection, requester_id: UserId, addressee_id: UserId) -> Result<bool> {
    let deleted = conn
        .execute(
            "DELETE FROM friendships WHERE requester_id = ?1 AND addressee_id = ?2 AND status = ?3",
            params![requester_id, addressee_id, FriendshipStatus::Pending.as_str()],
        )
        .context("Failed to delete friend request")?;
    Ok(deleted > 0)
}

pub fn delete_friendship(conn: &Connection, a: UserId, b: UserId) -> Result<bool> {
    let deleted = conn
        .execute(
            "DELETE FROM friendships
             WHERE ((requester_id = ?1 AND addressee_id = ?2) OR (requester_id = ?2 AND addressee_id = ?1))
               AND status = ?3",
            params![a, b, FriendshipStatus::Accepted.as_str()],
        )
        .context("Failed to delete friendship")?;
    Ok(deleted > 0)
}

fn list_ids(conn: &Connection, sql: &str, user_id: UserId, status: FriendshipStatus) -> Result<Vec<UserId>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![user_id, status.as_str()], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn list_friend_ids(conn: &Connection, user_id: UserId) -> Result<Vec<UserId>> {
    list_ids(
        conn,
        "SELECT CASE WHEN requester_id = ?1 THEN addressee_id ELSE requester_id END
         FROM friendships
         WHERE (requester_id = ?1 OR addressee_id = ?1) AND status = ?2
         ORDER BY created_at",
        user_id,
        FriendshipStatus::Accepted,
    )
}

pub fn list_sent_request_ids(conn: &Connection, user_id: UserId) -> Result<Vec<UserId>> {
    list_ids(
        conn,
        "SELECT addressee_id FROM friendships WHERE requester_id = ?1 AND status = ?2 ORDER BY created_at",
        user_id,
        FriendshipStatus::Pending,
    )
}

pub fn list_received_request_ids(conn: &Connection, user_id: UserId) -> Result<Vec<UserId>> {
    list_ids(
        conn,
        "SELECT requester_id FROM friendships WHERE addressee_id = ?1 AND status = ?2 ORDER BY created_at",
        user_id,
        FriendshipStatus::Pending,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewUser;
    use crate::database::{create_memory_pool, get_connection, setup, users};

    fn seed_user(conn: &Connection, name: &str) -> UserId {
        users::insert_user(
            conn,
            &NewUser {
                username: name.to_string(),
                email: format!("{}@example.com", name),
                first_name: None,
                last_name: None,
                elo_rating: 1200,
            },
            NaiveDateTime::default(),
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_request_lifecycle() {
        let pool = create_memory_pool().unwrap();
        let conn = get_connection(&pool).unwrap();
        setup::init_schema(&conn).unwrap();
        let ana = seed_user(&conn, "ana");
        let ben = seed_user(&conn, "ben");

        insert_request(&conn, ana, ben, NaiveDateTime::default()).unwrap();
        assert_eq!(list_sent_request_ids(&conn, ana).unwrap(), vec![ben]);
        assert_eq!(list_received_request_ids(&conn, ben).unwrap(), vec![ana]);
        assert!(list_friend_ids(&conn, ana).unwrap().is_empty());

        assert!(!accept_request(&conn, ben, ana).unwrap());
        assert!(accept_request(&conn, ana, ben).unwrap());

        let found = find_between(&conn, ben, ana).unwrap().unwrap();
        assert_eq!(found.status, FriendshipStatus::Accepted);
        assert_eq!(list_friend_ids(&conn, ben).unwrap(), vec![ana]);

        assert!(delete_friendship(&conn, ben, ana).unwrap());
        assert!(find_between(&conn, ana, ben).unwrap().is_none());
    }

    #[test]
    fn test_reject_only_touches_pending() {
        let pool = create_memory_pool().unwrap();
        let conn = get_connection(&pool).unwrap();
        setup::init_schema(&conn).unwrap();
        let ana = seed_user(&conn, "ana");
        let ben = seed_user(&conn, "ben");

        insert_request(&conn, ana, ben, NaiveDateTime::default()).unwrap();
        assert!(!delete_friendship(&conn, ana, ben).unwrap());
        assert!(delete_request(&conn, ana, ben).unwrap());
        assert!(list_received_request_ids(&conn, ben).unwrap().is_empty());
    }
}
