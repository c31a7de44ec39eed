//! Time-decayed scoring and the prompt windows derived from `updated`.

use crate::config::GameConfig;
use crate::models::UserRecord;

/// Timing and scoring rules, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRules {
    pub cooldown_ms: i64,
    pub expiry_ms: i64,
    pub max_points: u64,
}

impl Default for GameRules {
    fn default() -> Self {
        Self::from(&GameConfig::default())
    }
}

impl From<&GameConfig> for GameRules {
    fn from(config: &GameConfig) -> Self {
        Self {
            cooldown_ms: secs_to_ms(config.cooldown_secs),
            expiry_ms: secs_to_ms(config.expiry_secs),
            max_points: config.max_points,
        }
    }
}

fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}

/// Milliseconds since `issued_at`; a clock behind `issued_at` counts as zero.
pub fn elapsed_ms(now_ms: i64, issued_at_ms: i64) -> i64 {
    now_ms.saturating_sub(issued_at_ms).max(0)
}

impl GameRules {
    /// `max(0, max_points - floor(elapsed / 1s))`.
    pub fn points(&self, now_ms: i64, issued_at_ms: i64) -> u64 {
        let elapsed_secs = (elapsed_ms(now_ms, issued_at_ms) / 1000) as u64;
        self.max_points.saturating_sub(elapsed_secs)
    }

    /// Whole seconds still to wait before a new prompt may be issued,
    /// or `None` when the cooldown has passed.
    pub fn cooldown_remaining_secs(&self, now_ms: i64, updated_ms: i64) -> Option<u64> {
        let remaining = self.cooldown_ms - elapsed_ms(now_ms, updated_ms);
        if remaining > 0 {
            Some((remaining as u64).div_ceil(1000))
        } else {
            None
        }
    }

    pub fn is_expired(&self, now_ms: i64, updated_ms: i64) -> bool {
        elapsed_ms(now_ms, updated_ms) >= self.expiry_ms
    }

    /// Derive where a record stands right now.
    pub fn prompt_state(&self, user: &UserRecord, now_ms: i64) -> PromptState {
        if !user.has_prompt() {
            return PromptState::NoPrompt;
        }
        if self.is_expired(now_ms, user.updated) {
            PromptState::Expired
        } else {
            PromptState::Active {
                remaining_ms: self.expiry_ms - elapsed_ms(now_ms, user.updated),
            }
        }
    }
}

/// Prompt lifecycle, never stored: recomputed from `(prompt, updated, now)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    NoPrompt,
    Active { remaining_ms: i64 },
    Expired,
}
