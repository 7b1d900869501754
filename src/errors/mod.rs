use thiserror::Error;

/// Failures surfaced by the service layer.
///
/// Every variant except `Internal` carries a message meant for the client.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<rusqlite::Error> for ServiceError {
    fn from(err: rusqlite::Error) -> Self {
        ServiceError::Internal(err.into())
    }
}

impl From<r2d2::Error> for ServiceError {
    fn from(err: r2d2::Error) -> Self {
        ServiceError::Internal(anyhow::Error::new(err).context("Failed to get database connection from pool"))
    }
}

pub fn not_found(what: impl Into<String>) -> ServiceError {
    ServiceError::NotFound(what.into())
}

pub fn bad_request(message: impl Into<String>) -> ServiceError {
    ServiceError::BadRequest(message.into())
}

pub fn forbidden(message: impl Into<String>) -> ServiceError {
    ServiceError::Forbidden(message.into())
}

pub fn conflict(message: impl Into<String>) -> ServiceError {
    ServiceError::Conflict(message.into())
}
