pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod game;
pub mod llm;
pub mod logging;
pub mod models;
pub mod routes;
pub mod store;
pub mod test_util;

pub use auth::{AuthUser, SessionKeys};
pub use config::Config;
pub use error::GameError;
pub use game::{GameService, Submission};

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clock::SystemClock;
use crate::game::{OpenAiChallengeGenerator, OpenAiPhotoValidator};
use crate::llm::{LlmError, OpenAiClient};
use crate::store::{SqliteUserStore, StoreError};

/// Failures while wiring the application at startup.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Failed to open user store: {0}")]
    Store(#[from] StoreError),
    #[error("Failed to build OpenAI client: {0}")]
    Llm(#[from] LlmError),
}

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub session: SessionKeys,
    pub game: GameService,
}

impl AppState {
    pub fn new(config: Config, game: GameService) -> Self {
        let session = SessionKeys::new(&config.session);
        Self {
            config,
            session,
            game,
        }
    }

    /// Wire the production collaborators: SQLite store, OpenAI-backed
    /// generator and validator, wall clock.
    pub fn from_config(config: Config) -> Result<Self, InitError> {
        let store = Arc::new(SqliteUserStore::new(&config.database.url)?);
        let client = Arc::new(OpenAiClient::new(&config.openai)?);

        let generator = Arc::new(OpenAiChallengeGenerator::new(
            client.clone(),
            config.openai.challenge_max_tokens,
        ));
        let validator = Arc::new(OpenAiPhotoValidator::new(
            client,
            config.openai.validation_max_tokens,
        ));

        let game = GameService::new(
            store,
            generator,
            validator,
            Arc::new(SystemClock),
            &config.game,
        );

        Ok(Self::new(config, game))
    }
}

fn cors_layer(origins: &str) -> CorsLayer {
    if origins.trim() == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // session cookies only travel when credentials are allowed
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Build the full HTTP application.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors.origins);

    Router::new()
        .merge(routes::health::router(state.clone()))
        .nest("/game", routes::game::router(state))
        .layer(middleware::from_fn(logging::request_logger))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
