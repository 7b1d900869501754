use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers::{friends, health, matches, stats, tournaments, users, AppState};

pub const API_PREFIX: &str = "/api/v1";

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(API_PREFIX, get(health::health))
        .route(&path("/"), get(health::health))
        .route(&path("/users"), get(users::list_users).post(users::register_user))
        .route(&path("/users/search"), get(users::search_users))
        .route(
            &path("/users/:id"),
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(&path("/users/:id/matches"), get(users::get_user_matches))
        .route(&path("/users/:id/stats"), get(users::get_user_stats))
        .route(&path("/friends"), get(friends::list_friends))
        .route(&path("/friends/:id"), axum::routing::delete(friends::remove_friend))
        .route(
            &path("/friends/requests"),
            get(friends::list_requests).post(friends::send_request),
        )
        .route(&path("/friends/requests/:id/accept"), post(friends::accept_request))
        .route(&path("/friends/requests/:id/reject"), post(friends::reject_request))
        .route(&path("/friends/recent-opponents"), get(friends::recent_opponents))
        .route(&path("/matches"), get(matches::list_matches).post(matches::record_match))
        .route(
            &path("/matches/:id"),
            get(matches::get_match)
                .put(matches::update_match)
                .delete(matches::delete_match),
        )
        .route(
            &path("/tournaments"),
            get(tournaments::list_tournaments).post(tournaments::create_tournament),
        )
        .route(
            &path("/tournaments/:id"),
            get(tournaments::get_tournament)
                .put(tournaments::update_tournament)
                .delete(tournaments::delete_tournament),
        )
        .route(
            &path("/tournaments/:id/players"),
            get(tournaments::list_players).post(tournaments::add_player),
        )
        .route(
            &path("/tournaments/:id/players/:player_id"),
            axum::routing::delete(tournaments::remove_player),
        )
        .route(&path("/tournaments/:id/matches"), get(tournaments::list_matches))
        .route(&path("/tournaments/:id/standings"), get(tournaments::standings))
        .route(&path("/tournaments/:id/end"), post(tournaments::end_tournament))
        .route(&path("/stats"), get(stats::current_user_stats))
        .route(&path("/stats/leaderboard"), get(stats::leaderboard))
        .route(
            &path("/stats/head-to-head/:player1_id/:player2_id"),
            get(stats::head_to_head),
        )
        .with_state(state)
}

fn path(route: &str) -> String {
    format!("{}{}", API_PREFIX, route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::AppConfig;
    use crate::database::{create_memory_pool, get_connection, setup};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let pool = create_memory_pool().unwrap();
        setup::init_schema(&get_connection(&pool).unwrap()).unwrap();
        create_router(Arc::new(AppState {
            pool,
            config: AppConfig::new(),
        }))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        user: Option<i64>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = user {
            builder = builder.header("X-User-Id", id.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn register(app: &Router, username: &str) -> i64 {
        let (status, body) = send(
            app,
            "POST",
            "/api/v1/users",
            None,
            Some(json!({ "username": username, "email": format!("{}@example.com", username) })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_health_envelope() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/api/v1/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_record_match_updates_ratings() {
        let app = test_app();
        let ana = register(&app, "ana").await;
        let ben = register(&app, "ben").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/matches",
            Some(ana),
            Some(json!({
                "player1_id": ana,
                "player2_id": ben,
                "player1_goals": 2,
                "player2_goals": 0,
                "team1": "Roma",
                "team2": "Ajax"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["player1_elo_change"], 16);
        assert_eq!(body["data"]["player2_name"], "ben");

        let (_, user) = send(&app, "GET", &format!("/api/v1/users/{}", ana), None, None).await;
        assert_eq!(user["data"]["elo_rating"], 1216);
        assert_eq!(user["data"]["points"], 3);

        let (_, board) = send(&app, "GET", "/api/v1/stats/leaderboard?page_size=1", None, None).await;
        assert_eq!(board["data"]["items"][0]["id"], ana);
        assert_eq!(board["data"]["total"], 2);
        assert_eq!(board["data"]["has_next"], true);
    }

    #[tokio::test]
    async fn test_errors_use_envelope() {
        let app = test_app();
        let ana = register(&app, "ana").await;

        let (status, body) = send(&app, "GET", "/api/v1/matches/42", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["data"], Value::Null);

        let (status, _) = send(&app, "GET", "/api/v1/friends", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/users",
            None,
            Some(json!({ "username": "ana", "email": "other@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/v1/users/{}", ana),
            Some(ana + 1),
            Some(json!({ "first_name": "Anna" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_tournament_flow() {
        let app = test_app();
        let ana = register(&app, "ana").await;
        let ben = register(&app, "ben").await;

        let (status, created) = send(
            &app,
            "POST",
            "/api/v1/tournaments",
            Some(ana),
            Some(json!({ "name": "Spring Cup", "player_ids": [ana, ben], "rounds_per_matchup": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["data"]["id"].as_i64().unwrap();
        assert_eq!(created["data"]["matches_count"], 1);

        let (_, page) = send(&app, "GET", &format!("/api/v1/tournaments/{}/matches", id), None, None).await;
        assert_eq!(page["data"]["total"], 1);
        assert_eq!(page["data"]["page"], 1);

        let (_, table) = send(&app, "GET", &format!("/api/v1/tournaments/{}/standings", id), None, None).await;
        assert_eq!(table["data"]["items"][0]["last_5_matches"][0], "-");

        let (status, _) = send(&app, "POST", &format!("/api/v1/tournaments/{}/end", id), Some(ben), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, ended) = send(&app, "POST", &format!("/api/v1/tournaments/{}/end", id), Some(ana), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ended["data"]["completed"], true);
    }
}
