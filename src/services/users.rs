use std::collections::HashSet;

use log::info;
use rusqlite::Connection;

use crate::api::models::{RegisterUserRequest, UpdateUserRequest, UserSearchResult, UserView};
use crate::config::settings::AppConfig;
use crate::database::models::{NewUser, User, UserChanges, UserId};
use crate::database::{self, friendships, users, DbPool};
use crate::errors::{bad_request, conflict, not_found, ServiceResult};

pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const MAX_QUERY_LENGTH: usize = 100;

pub struct UserService<'a> {
    pool: &'a DbPool,
    config: &'a AppConfig,
}

impl<'a> UserService<'a> {
    pub fn new(pool: &'a DbPool, config: &'a AppConfig) -> Self {
        Self { pool, config }
    }

    pub fn register(&self, request: &RegisterUserRequest) -> ServiceResult<UserView> {
        let username = request.username.trim();
        let email = request.email.trim();
        self.validate_username(username)?;
        validate_email(email)?;

        let conn = database::get_connection(self.pool)?;
        ensure_unique(&conn, Some(username), Some(email), None)?;

        let user = users::insert_user(
            &conn,
            &NewUser {
                username: username.to_string(),
                email: email.to_string(),
                first_name: clean_name(request.first_name.as_deref()),
                last_name: clean_name(request.last_name.as_deref()),
                elo_rating: self.config.elo.default_rating,
            },
            database::now(),
        )?;

        info!("Registered user {} ({})", user.username, user.id);
        Ok(UserView::from(&user))
    }

    pub fn list(&self) -> ServiceResult<Vec<UserView>> {
        let conn = database::get_connection(self.pool)?;
        let active = users::list_active(&conn)?;
        Ok(active.iter().map(UserView::from).collect())
    }

    pub fn get(&self, id: UserId) -> ServiceResult<UserView> {
        let conn = database::get_connection(self.pool)?;
        let user = users::find_by_id(&conn, id)?.ok_or_else(|| not_found("User not found"))?;
        Ok(UserView::from(&user))
    }

    pub fn update(&self, id: UserId, request: &UpdateUserRequest) -> ServiceResult<UserView> {
        let changes = UserChanges {
            username: request.username.as_deref().map(|s| s.trim().to_string()),
            email: request.email.as_deref().map(|s| s.trim().to_string()),
            first_name: request.first_name.as_deref().map(|s| s.trim().to_string()),
            last_name: request.last_name.as_deref().map(|s| s.trim().to_string()),
        };
        if changes.is_empty() {
            return Err(bad_request("No fields to update"));
        }
        if let Some(username) = &changes.username {
            self.validate_username(username)?;
        }
        if let Some(email) = &changes.email {
            validate_email(email)?;
        }

        let conn = database::get_connection(self.pool)?;
        let user = users::find_by_id(&conn, id)?.ok_or_else(|| not_found("User not found"))?;
        if user.is_deleted {
            return Err(bad_request("Cannot update a deleted user"));
        }
        ensure_unique(
            &conn,
            changes.username.as_deref(),
            changes.email.as_deref(),
            Some(id),
        )?;

        let updated = users::update_profile(&conn, id, &changes, database::now())?;
        info!("Updated profile of user {}", id);
        Ok(UserView::from(&updated))
    }

    pub fn delete(&self, id: UserId) -> ServiceResult<()> {
        let conn = database::get_connection(self.pool)?;
        match users::find_by_id(&conn, id)? {
            Some(user) if !user.is_deleted => {
                users::soft_delete(&conn, id, database::now())?;
                info!("Soft deleted user {}", id);
                Ok(())
            }
            _ => Err(not_found("User not found")),
        }
    }

    pub fn search(
        &self,
        caller_id: UserId,
        query: &str,
        limit: Option<usize>,
    ) -> ServiceResult<Vec<UserSearchResult>> {
        let query = query.trim();
        if query.is_empty() || query.chars().count() > MAX_QUERY_LENGTH {
            return Err(bad_request(format!(
                "Search query must be between 1 and {} characters",
                MAX_QUERY_LENGTH
            )));
        }
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        if limit == 0 || limit > self.config.users.search_limit_max {
            return Err(bad_request(format!(
                "Limit must be between 1 and {}",
                self.config.users.search_limit_max
            )));
        }

        let conn = database::get_connection(self.pool)?;
        let found = users::search(&conn, query, caller_id, limit)?;

        let friends: HashSet<UserId> = friendships::list_friend_ids(&conn, caller_id)?.into_iter().collect();
        let sent: HashSet<UserId> = friendships::list_sent_request_ids(&conn, caller_id)?.into_iter().collect();
        let received: HashSet<UserId> = friendships::list_received_request_ids(&conn, caller_id)?
            .into_iter()
            .collect();

        Ok(found
            .iter()
            .map(|user| UserSearchResult {
                id: user.id,
                username: user.username.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                full_name: user.full_name(),
                elo_rating: user.elo_rating,
                is_friend: friends.contains(&user.id),
                friend_request_sent: sent.contains(&user.id),
                friend_request_received: received.contains(&user.id),
            })
            .collect())
    }

    fn validate_username(&self, username: &str) -> ServiceResult<()> {
        let settings = &self.config.users;
        let length = username.chars().count();
        if length < settings.username_min_length || length > settings.username_max_length {
            return Err(bad_request(format!(
                "Username must be between {} and {} characters",
                settings.username_min_length, settings.username_max_length
            )));
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> ServiceResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(bad_request("Invalid email address")),
    }
}

fn clean_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

fn ensure_unique(
    conn: &Connection,
    username: Option<&str>,
    email: Option<&str>,
    current_id: Option<UserId>,
) -> ServiceResult<()> {
    let taken_by_other = |user: Option<User>| user.is_some_and(|u| Some(u.id) != current_id);

    if let Some(username) = username {
        if taken_by_other(users::find_by_username(conn, username)?) {
            return Err(conflict("Username already registered"));
        }
    }
    if let Some(email) = email {
        if taken_by_other(users::find_by_email(conn, email)?) {
            return Err(conflict("Email already registered"));
        }
    }
    Ok(())
}
