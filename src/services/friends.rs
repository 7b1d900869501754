use std::collections::HashSet;

use log::info;
use rusqlite::Connection;

use crate::api::models::{FriendRequests, FriendView, RecentOpponent};
use crate::database::models::{FriendshipStatus, User, UserId};
use crate::database::{self, friendships, matches, users, DbPool};
use crate::errors::{bad_request, conflict, not_found, ServiceResult};

const RECENT_MATCH_WINDOW: usize = 10;

pub struct FriendService<'a> {
    pool: &'a DbPool,
}

impl<'a> FriendService<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    pub fn send_request(&self, from: UserId, to: UserId) -> ServiceResult<()> {
        if from == to {
            return Err(bad_request("You cannot send a friend request to yourself"));
        }

        let conn = database::get_connection(self.pool)?;
        active_user(&conn, from)?;
        active_user(&conn, to)?;

        if let Some(existing) = friendships::find_between(&conn, from, to)? {
            return Err(match existing.status {
                FriendshipStatus::Accepted => conflict("You are already friends with this user"),
                FriendshipStatus::Pending if existing.requester_id == from => {
                    conflict("Friend request already sent")
                }
                FriendshipStatus::Pending => {
                    conflict("This user has already sent you a friend request")
                }
            });
        }

        friendships::insert_request(&conn, from, to, database::now())?;
        info!("User {} sent a friend request to {}", from, to);
        Ok(())
    }

    pub fn accept_request(&self, user_id: UserId, from: UserId) -> ServiceResult<()> {
        let conn = database::get_connection(self.pool)?;
        if !friendships::accept_request(&conn, from, user_id)? {
            return Err(not_found("Friend request not found"));
        }
        info!("User {} accepted the friend request from {}", user_id, from);
        Ok(())
    }

    pub fn reject_request(&self, user_id: UserId, from: UserId) -> ServiceResult<()> {
        let conn = database::get_connection(self.pool)?;
        if !friendships::delete_request(&conn, from, user_id)? {
            return Err(not_found("Friend request not found"));
        }
        info!("User {} rejected the friend request from {}", user_id, from);
        Ok(())
    }

    pub fn remove_friend(&self, user_id: UserId, friend_id: UserId) -> ServiceResult<()> {
        let conn = database::get_connection(self.pool)?;
        if !friendships::delete_friendship(&conn, user_id, friend_id)? {
            return Err(not_found("Friend not found"));
        }
        info!("User {} removed friend {}", user_id, friend_id);
        Ok(())
    }

    pub fn list_friends(&self, user_id: UserId) -> ServiceResult<Vec<FriendView>> {
        let conn = database::get_connection(self.pool)?;
        let ids = friendships::list_friend_ids(&conn, user_id)?;
        Ok(friend_views(&conn, &ids)?)
    }

    pub fn list_requests(&self, user_id: UserId) -> ServiceResult<FriendRequests> {
        let conn = database::get_connection(self.pool)?;
        let sent = friendships::list_sent_request_ids(&conn, user_id)?;
        let received = friendships::list_received_request_ids(&conn, user_id)?;
        Ok(FriendRequests {
            sent: friend_views(&conn, &sent)?,
            received: friend_views(&conn, &received)?,
        })
    }

    /// Opponents from the caller's latest matches who are not yet friends
    pub fn recent_opponents(&self, user_id: UserId) -> ServiceResult<Vec<RecentOpponent>> {
        let conn = database::get_connection(self.pool)?;
        let recent = matches::list_for_user(&conn, user_id, false, Some(RECENT_MATCH_WINDOW))?;
        let friends: HashSet<UserId> = friendships::list_friend_ids(&conn, user_id)?.into_iter().collect();
        let sent: HashSet<UserId> = friendships::list_sent_request_ids(&conn, user_id)?.into_iter().collect();

        let mut seen = HashSet::new();
        let mut opponents = Vec::new();
        for m in &recent {
            let (_, _, opponent_id) = m.perspective(user_id);
            if friends.contains(&opponent_id) || !seen.insert(opponent_id) {
                continue;
            }
            let Some(opponent) = users::find_by_id(&conn, opponent_id)? else {
                continue;
            };
            if opponent.is_deleted {
                continue;
            }
            opponents.push(RecentOpponent {
                id: opponent.id,
                username: opponent.username,
                first_name: opponent.first_name,
                last_name: opponent.last_name,
                friend_request_sent: sent.contains(&opponent_id),
            });
        }

        Ok(opponents)
    }
}

fn active_user(conn: &Connection, id: UserId) -> ServiceResult<User> {
    match users::find_by_id(conn, id)? {
        Some(user) if !user.is_deleted => Ok(user),
        _ => Err(not_found("User not found")),
    }
}

fn friend_views(conn: &Connection, ids: &[UserId]) -> anyhow::Result<Vec<FriendView>> {
    let mut views = Vec::with_capacity(ids.len());
    for &id in ids {
        if let Some(user) = users::find_by_id(conn, id)? {
            views.push(FriendView::from(&user));
        }
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::RecordMatchRequest;
    use crate::config::settings::AppConfig;
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

    #[test]
    fn test_request_conflicts() {
        let (pool, ids) = setup_pool(&["amy", "bob"]);
        let service = FriendService::new(&pool);
        let (amy, bob) = (ids[0], ids[1]);

        assert!(matches!(service.send_request(amy, amy), Err(ServiceError::BadRequest(_))));
        assert!(matches!(service.send_request(amy, 404), Err(ServiceError::NotFound(_))));

        service.send_request(amy, bob).unwrap();
        assert!(matches!(service.send_request(amy, bob), Err(ServiceError::Conflict(_))));
        assert!(matches!(service.send_request(bob, amy), Err(ServiceError::Conflict(_))));

        service.accept_request(bob, amy).unwrap();
        assert!(matches!(service.send_request(bob, amy), Err(ServiceError::Conflict(_))));
        assert_eq!(service.list_friends(amy).unwrap()[0].id, bob);
    }

    #[test]
    fn test_reject_and_remove() {
        let (pool, ids) = setup_pool(&["amy", "bob"]);
        let service = FriendService::new(&pool);
        let (amy, bob) = (ids[0], ids[1]);

        assert!(matches!(service.accept_request(bob, amy), Err(ServiceError::NotFound(_))));
        service.send_request(amy, bob).unwrap();
        let requests = service.list_requests(bob).unwrap();
        assert_eq!(requests.received.len(), 1);
        assert!(requests.sent.is_empty());

        service.reject_request(bob, amy).unwrap();
        assert!(service.list_requests(bob).unwrap().received.is_empty());
        assert!(matches!(service.remove_friend(amy, bob), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_recent_opponents_skip_friends() {
        let (pool, ids) = setup_pool(&["amy", "bob", "cal"]);
        let (amy, bob, cal) = (ids[0], ids[1], ids[2]);
        let config = AppConfig::new();
        let match_service = MatchService::new(&pool, &config);
        for opponent in [bob, cal, bob] {
            match_service
                .record(&RecordMatchRequest {
                    player1_id: amy,
                    player2_id: opponent,
                    player1_goals: 1,
                    player2_goals: 0,
                    team1: String::new(),
                    team2: String::new(),
                    half_length: 4,
                    tournament_id: None,
                    completed: true,
                })
                .unwrap();
        }

        let service = FriendService::new(&pool);
        service.send_request(amy, bob).unwrap();
        service.accept_request(bob, amy).unwrap();
        service.send_request(amy, cal).unwrap();

        let opponents = service.recent_opponents(amy).unwrap();
        assert_eq!(opponents.len(), 1);
        assert_eq!(opponents[0].id, cal);
        assert!(opponents[0].friend_request_sent);
    }
}
