//! Error types surfaced by the game endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use skyhunt_common::GameResponse;

use crate::store::StoreError;

/// Every failure a game request can end in.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("User not found")]
    NotFound,

    #[error("Please wait {0} sec before generating a new prompt")]
    RateLimited(u64),

    #[error("Prompt expired. Please generate a new one.")]
    Expired,

    #[error("No active prompt found for the user")]
    NoActivePrompt,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Prompt was already completed")]
    Conflict,

    #[error("{0}")]
    UpstreamFailure(&'static str),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error")]
    Store(#[source] StoreError),

    #[error("Internal error")]
    Internal(String),
}

impl GameError {
    pub fn status(&self) -> StatusCode {
        match self {
            GameError::NotFound => StatusCode::NOT_FOUND,
            GameError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            GameError::Expired => StatusCode::BAD_REQUEST,
            GameError::NoActivePrompt => StatusCode::BAD_REQUEST,
            GameError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GameError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GameError::Conflict => StatusCode::CONFLICT,
            GameError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GameError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GameError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GameError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => GameError::NotFound,
            StoreError::Conflict => GameError::Conflict,
            other => GameError::Store(other),
        }
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            GameError::Store(source) => tracing::error!(error = %source, "store failure"),
            GameError::Internal(cause) => tracing::error!(error = %cause, "internal failure"),
            _ => {}
        }

        let body = Json(GameResponse::<String> {
            status: status.as_u16(),
            message: self.to_string(),
            totalpoints: None,
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GameError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(GameError::RateLimited(20).status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(GameError::Expired.status(), StatusCode::BAD_REQUEST);
        assert_eq!(GameError::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(
            GameError::UpstreamFailure("Failed to generate prompt").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GameError::Unauthorized("no token".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GameError::PayloadTooLarge(1024).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            GameError::Internal("worker panicked".into()).to_string(),
            "Internal error"
        );
    }

    #[test]
    fn test_store_errors_map_to_game_errors() {
        assert!(matches!(GameError::from(StoreError::NotFound), GameError::NotFound));
        assert!(matches!(GameError::from(StoreError::Conflict), GameError::Conflict));
        assert!(matches!(
            GameError::from(StoreError::Database("disk full".into())),
            GameError::Store(_)
        ));
    }

    #[test]
    fn test_store_failure_hides_cause() {
        let err = GameError::from(StoreError::Database("disk I/O error".into()));
        assert_eq!(err.to_string(), "Internal error");
    }

    #[test]
    fn test_rate_limit_message() {
        assert_eq!(
            GameError::RateLimited(20).to_string(),
            "Please wait 20 sec before generating a new prompt"
        );
    }
}
