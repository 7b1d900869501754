use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Json;

use crate::api::errors::ApiError;
use crate::api::models::ApiResponse;
use crate::config::settings::AppConfig;
use crate::database::models::UserId;
use crate::database::DbPool;

pub mod friends;
pub mod health;
pub mod matches;
pub mod stats;
pub mod tournaments;
pub mod users;

pub const USER_ID_HEADER: &str = "x-user-id";

pub struct AppState {
    pub pool: DbPool,
    pub config: AppConfig,
}

pub type HandlerResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Caller identity passed in by the gateway in front of the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts.headers.get(USER_ID_HEADER).ok_or_else(|| {
            ApiError::new(StatusCode::UNAUTHORIZED, "Missing X-User-Id header")
        })?;

        raw.to_str()
            .ok()
            .and_then(|value| value.trim().parse::<UserId>().ok())
            .map(CurrentUser)
            .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Invalid X-User-Id header"))
    }
}

pub(crate) fn respond<T>(data: T, message: impl Into<String>) -> HandlerResult<T> {
    Ok(Json(ApiResponse::ok(data, message)))
}
