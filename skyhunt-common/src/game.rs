//! Game API envelopes shared with clients.

use serde::{Deserialize, Serialize};

/// Every game endpoint answers with `{status, message}`, where `status`
/// mirrors the HTTP status code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResponse<T> {
    pub status: u16,
    pub message: T,
    /// Only present on a successful photo submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totalpoints: Option<u64>,
}

impl<T> GameResponse<T> {
    pub fn ok(message: T) -> Self {
        Self {
            status: 200,
            message,
            totalpoints: None,
        }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.totalpoints = Some(total);
        self
    }
}

/// Body of `POST /game/submitphoto`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitPhotoRequest {
    #[serde(default)]
    pub photo: Option<String>,
}

/// Outcome label returned by `POST /game/submitphoto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoVerdict {
    Valid,
    Invalid,
}
