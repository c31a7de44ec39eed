//! Challenge generation, photo validation and scoring.

pub mod challenge;
pub mod metrics;
pub mod photo;
pub mod scoring;
pub mod service;
pub mod validator;

pub use challenge::{ChallengeGenerator, OpenAiChallengeGenerator};
pub use metrics::{GameMetrics, MetricsSnapshot};
pub use photo::{Photo, PhotoError};
pub use scoring::{GameRules, PromptState};
pub use service::{GameService, Submission};
pub use validator::{OpenAiPhotoValidator, PhotoValidator, Verdict};
