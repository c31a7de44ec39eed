//! Fakes and fixtures shared by unit and integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};

use crate::auth::{AuthUser, SessionKeys};
use crate::clock::Clock;
use crate::config::{
    Config, CorsConfig, DatabaseConfig, GameConfig, LoggingConfig, OpenAiConfig, SessionConfig,
};
use crate::game::{ChallengeGenerator, GameService, Photo, PhotoValidator, Verdict};
use crate::llm::LlmError;
use crate::store::SqliteUserStore;
use crate::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret";

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 8080,
        openai: OpenAiConfig {
            base_url: "http://localhost:9".to_string(),
            api_key: "sk-test".to_string(),
            model: "test-model".to_string(),
            challenge_max_tokens: 60,
            validation_max_tokens: 10,
            timeout_secs: 5,
        },
        database: DatabaseConfig {
            url: ":memory:".to_string(),
        },
        session: SessionConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            cookie_name: "access_token".to_string(),
        },
        game: GameConfig::default(),
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        cors: CorsConfig {
            origins: "*".to_string(),
        },
    }
}

/// A small solid-colour JPEG, base64-encoded.
pub fn jpeg_base64() -> String {
    let image = RgbImage::from_pixel(16, 16, Rgb([40, 160, 90]));
    let mut jpeg = Vec::new();
    JpegEncoder::new(&mut jpeg)
        .encode_image(&image)
        .expect("Failed to encode test JPEG");
    BASE64.encode(jpeg)
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(now_ms),
        }
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Generator that replays queued results; an empty queue is an upstream error.
/// Like the validator below, it yields once so concurrent callers interleave
/// the way they would around a network round trip.
#[derive(Default)]
pub struct ScriptedGenerator {
    results: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, challenge: &str) {
        self.lock().push_back(Ok(challenge.to_string()));
    }

    pub fn push_err(&self) {
        self.lock()
            .push_back(Err(LlmError::Upstream("scripted failure".to_string())));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, LlmError>>> {
        self.results.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl ChallengeGenerator for ScriptedGenerator {
    async fn generate(&self) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.lock()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyCompletion))
    }
}

/// Validator that replays queued verdicts and records what it was asked.
#[derive(Default)]
pub struct ScriptedValidator {
    results: Mutex<VecDeque<Result<Verdict, LlmError>>>,
    challenges: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: Result<Verdict, LlmError>) {
        self.results
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(result);
    }

    pub fn push_err(&self) {
        self.push(Err(LlmError::Upstream("scripted failure".to_string())));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn challenges(&self) -> Vec<String> {
        self.challenges
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

#[async_trait]
impl PhotoValidator for ScriptedValidator {
    async fn validate(&self, challenge: &str, _photo: &Photo) -> Result<Verdict, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.challenges
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(challenge.to_string());

        tokio::task::yield_now().await;

        self.results
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyCompletion))
    }
}

/// App state wired with scripted collaborators and an in-memory store.
pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<SqliteUserStore>,
    pub clock: Arc<ManualClock>,
    pub generator: Arc<ScriptedGenerator>,
    pub validator: Arc<ScriptedValidator>,
}

pub fn create_test_app(start_ms: i64) -> TestApp {
    let config = test_config();
    let store = Arc::new(SqliteUserStore::new(&config.database.url).expect("in-memory store"));
    let clock = Arc::new(ManualClock::new(start_ms));
    let generator = Arc::new(ScriptedGenerator::new());
    let validator = Arc::new(ScriptedValidator::new());

    let game = GameService::new(
        store.clone(),
        generator.clone(),
        validator.clone(),
        clock.clone(),
        &config.game,
    );

    TestApp {
        state: Arc::new(AppState::new(config, game)),
        store,
        clock,
        generator,
        validator,
    }
}

pub fn test_auth_user(id: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        username: format!("player-{}", id),
        avatar_url: String::new(),
    }
}

/// `Cookie` header value carrying a valid session for `id`.
pub fn session_cookie(keys: &SessionKeys, id: &str) -> String {
    let token = keys
        .issue(&test_auth_user(id))
        .expect("Failed to sign test token");
    format!("{}={}", keys.cookie_name(), token)
}
