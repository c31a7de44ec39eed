//! Per-request game orchestration.

use std::sync::Arc;

use super::challenge::ChallengeGenerator;
use super::metrics::GameMetrics;
use super::photo::{Photo, PhotoError};
use super::scoring::{GameRules, PromptState};
use super::validator::{PhotoValidator, Verdict};
use crate::clock::Clock;
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::models::UserRecord;
use crate::store::{StoreError, UserStore};

/// Result of a photo submission that reached the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Valid { awarded: u64, total: u64 },
    Invalid,
}

pub struct GameService {
    store: Arc<dyn UserStore>,
    generator: Arc<dyn ChallengeGenerator>,
    validator: Arc<dyn PhotoValidator>,
    clock: Arc<dyn Clock>,
    rules: GameRules,
    max_photo_bytes: usize,
    metrics: GameMetrics,
}

impl GameService {
    pub fn new(
        store: Arc<dyn UserStore>,
        generator: Arc<dyn ChallengeGenerator>,
        validator: Arc<dyn PhotoValidator>,
        clock: Arc<dyn Clock>,
        config: &GameConfig,
    ) -> Self {
        Self {
            store,
            generator,
            validator,
            clock,
            rules: GameRules::from(config),
            max_photo_bytes: config.max_photo_bytes,
            metrics: GameMetrics::default(),
        }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn metrics(&self) -> &GameMetrics {
        &self.metrics
    }

    /// Create the record for a player signing in for the first time.
    /// Returns `false` when the player already exists.
    pub async fn register_player(&self, id: &str, username: &str, avatar_url: &str) -> Result<bool> {
        let created = self
            .store
            .create_user(&UserRecord::new(id, username, avatar_url))
            .await?;
        Ok(created)
    }

    async fn user(&self, id: &str) -> Result<UserRecord> {
        self.store.get_user(id).await?.ok_or(GameError::NotFound)
    }

    pub async fn current_prompt(&self, id: &str) -> Result<String> {
        Ok(self.user(id).await?.prompt)
    }

    pub async fn points(&self, id: &str) -> Result<u64> {
        Ok(self.user(id).await?.points)
    }

    /// Issue a fresh challenge unless the previous one is too recent.
    /// The write only lands if no other request stamped the record since it
    /// was read, so overlapping calls issue at most one prompt.
    pub async fn make_prompt(&self, id: &str) -> Result<String> {
        let user = self.user(id).await?;
        let now = self.clock.now_ms();

        if let Some(wait) = self.rules.cooldown_remaining_secs(now, user.updated) {
            tracing::debug!(user_id = %id, wait_secs = wait, "Prompt requested during cooldown");
            self.metrics.record_rate_limited();
            return Err(GameError::RateLimited(wait));
        }

        let prompt = self.generator.generate().await.map_err(|e| {
            tracing::error!(user_id = %id, error = %e, "Challenge generation failed");
            self.metrics.record_upstream_failure();
            GameError::UpstreamFailure("Failed to generate prompt")
        })?;

        match self.store.update_prompt(id, &prompt, user.updated, now).await {
            Ok(()) => {}
            Err(StoreError::Conflict) => {
                let latest = self.user(id).await?;
                tracing::debug!(user_id = %id, "Lost prompt race to a concurrent request");
                self.metrics.record_rate_limited();
                return Err(match self.rules.cooldown_remaining_secs(now, latest.updated) {
                    Some(wait) => GameError::RateLimited(wait),
                    None => GameError::Conflict,
                });
            }
            Err(e) => return Err(e.into()),
        }

        self.metrics.record_prompt_issued();
        tracing::info!(user_id = %id, prompt = %prompt, "Issued new prompt");
        Ok(prompt)
    }

    /// Judge a photo against the active prompt and award time-decayed points
    /// on a match. A no-match or a validator failure leaves the prompt active.
    pub async fn submit_photo(&self, id: &str, raw_photo: Option<&str>) -> Result<Submission> {
        let photo = self.decode_photo(raw_photo).await?;

        let user = self.user(id).await?;
        let now = self.clock.now_ms();

        match self.rules.prompt_state(&user, now) {
            PromptState::NoPrompt => return Err(GameError::NoActivePrompt),
            PromptState::Expired => return Err(GameError::Expired),
            PromptState::Active { .. } => {}
        }

        let verdict = self.validator.validate(&user.prompt, &photo).await.map_err(|e| {
            tracing::error!(user_id = %id, error = %e, "Photo validation failed");
            self.metrics.record_upstream_failure();
            GameError::UpstreamFailure("Failed to validate photo (server error)")
        })?;

        match verdict {
            Verdict::NoMatch => {
                tracing::info!(user_id = %id, "Photo did not match prompt");
                self.metrics.record_invalid();
                Ok(Submission::Invalid)
            }
            Verdict::Match => {
                let awarded = self.rules.points(now, user.updated);
                let total = self
                    .store
                    .award_points(id, awarded, user.updated, now)
                    .await?;
                tracing::info!(user_id = %id, awarded, total, "Photo matched prompt");
                self.metrics.record_valid(awarded);
                Ok(Submission::Valid { awarded, total })
            }
        }
    }

    /// Decoding and re-encoding is CPU bound, so it runs off the async workers.
    async fn decode_photo(&self, raw_photo: Option<&str>) -> Result<Photo> {
        if raw_photo.map_or(true, |p| p.trim().is_empty()) {
            return Err(GameError::InvalidInput(PhotoError::Missing.to_string()));
        }

        let raw = raw_photo.map(str::to_owned);
        let max_bytes = self.max_photo_bytes;
        let decoded = tokio::task::spawn_blocking(move || Photo::decode(raw.as_deref(), max_bytes))
            .await
            .map_err(|e| GameError::Internal(format!("photo decoding task failed: {}", e)))?;

        decoded.map_err(|e| match e {
            PhotoError::Encode(cause) => GameError::Internal(cause),
            other => GameError::InvalidInput(other.to_string()),
        })
    }
}
