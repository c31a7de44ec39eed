use std::sync::Arc;

use async_trait::async_trait;
use skyhunt_common::{ChatCompletionRequest, ChatMessage, ContentPart};

use super::photo::Photo;
use crate::llm::{LlmError, OpenAiClient};

/// The vision model's judgment of a photo against a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    NoMatch,
}

#[async_trait]
pub trait PhotoValidator: Send + Sync {
    async fn validate(&self, challenge: &str, photo: &Photo) -> Result<Verdict, LlmError>;
}

pub struct OpenAiPhotoValidator {
    client: Arc<OpenAiClient>,
    max_tokens: u32,
}

impl OpenAiPhotoValidator {
    pub fn new(client: Arc<OpenAiClient>, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    fn request(&self, challenge: &str, photo: &Photo) -> ChatCompletionRequest {
        let question = format!(
            "Does this image show: \"{}\"? Respond only with yes or no.",
            challenge
        );
        ChatCompletionRequest::new(
            self.client.model(),
            vec![ChatMessage::user_parts(vec![
                ContentPart::text(question),
                ContentPart::image_url(photo.to_data_url()),
            ])],
        )
        .with_max_tokens(self.max_tokens)
    }
}

#[async_trait]
impl PhotoValidator for OpenAiPhotoValidator {
    async fn validate(&self, challenge: &str, photo: &Photo) -> Result<Verdict, LlmError> {
        let answer = self.client.complete(&self.request(challenge, photo)).await?;
        let verdict = parse_verdict(&answer)?;
        tracing::debug!(?verdict, answer = %answer, "Photo validation answer");
        Ok(verdict)
    }
}

/// Reads a yes/no answer from its first word.
fn parse_verdict(answer: &str) -> Result<Verdict, LlmError> {
    let first = answer
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .unwrap_or_default();

    match first.as_str() {
        "yes" => Ok(Verdict::Match),
        "no" => Ok(Verdict::NoMatch),
        _ => Err(LlmError::InvalidResponse(format!(
            "expected yes or no, got {:?}",
            answer
        ))),
    }
}
