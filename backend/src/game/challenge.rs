use std::sync::Arc;

use async_trait::async_trait;
use skyhunt_common::{ChatCompletionRequest, ChatMessage};

use crate::llm::{LlmError, OpenAiClient};

const CHALLENGE_INSTRUCTIONS: &str = "Pretend you are responsible for coming up with creative \
scavenger hunt challenges for a user at an airport. Generate and return only a single item the \
user should search for and take a picture of at the airport. It should not include people and it \
should be generic and simple enough that people at any airport can play. Only include the item in \
your response, nothing else. Make sure the item is clear and easily understandable. The picture \
the user takes will be given back to you for validation, so pick something you can visually verify.";

/// Produces one-line photo challenges.
#[async_trait]
pub trait ChallengeGenerator: Send + Sync {
    async fn generate(&self) -> Result<String, LlmError>;
}

pub struct OpenAiChallengeGenerator {
    client: Arc<OpenAiClient>,
    max_tokens: u32,
}

impl OpenAiChallengeGenerator {
    pub fn new(client: Arc<OpenAiClient>, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    fn request(&self) -> ChatCompletionRequest {
        ChatCompletionRequest::new(
            self.client.model(),
            vec![ChatMessage::user_text(CHALLENGE_INSTRUCTIONS)],
        )
        .with_max_tokens(self.max_tokens)
    }
}

#[async_trait]
impl ChallengeGenerator for OpenAiChallengeGenerator {
    async fn generate(&self) -> Result<String, LlmError> {
        let text = self.client.complete(&self.request()).await?;
        let challenge = clean_challenge(&text);
        if challenge.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(challenge)
    }
}

/// First non-empty line, without wrapping quotes.
fn clean_challenge(text: &str) -> String {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    line.trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”' | '`'))
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiConfig;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_clean_challenge() {
        assert_eq!(clean_challenge("\"A red suitcase\""), "A red suitcase");
        assert_eq!(clean_challenge("\n  “A flight departures board”  \n"), "A flight departures board");
        assert_eq!(clean_challenge("A potted plant\nGood luck!"), "A potted plant");
        assert_eq!(clean_challenge("\"\""), "");
    }

    async fn generator_for(server: &MockServer) -> OpenAiChallengeGenerator {
        let client = OpenAiClient::new(&OpenAiConfig {
            base_url: server.uri(),
            api_key: "sk-test".to_string(),
            model: "gpt-4o-mini".to_string(),
            challenge_max_tokens: 60,
            validation_max_tokens: 10,
            timeout_secs: 5,
        })
        .unwrap();
        OpenAiChallengeGenerator::new(Arc::new(client), 60)
    }

    #[tokio::test]
    async fn test_generate_sends_instructions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "max_tokens": 60,
                "messages": [{"role": "user", "content": CHALLENGE_INSTRUCTIONS}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "\"A water fountain\""}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let challenge = generator_for(&server).await.generate().await.unwrap();
        assert_eq!(challenge, "A water fountain");
    }

    #[tokio::test]
    async fn test_quotes_only_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "\"\""}}]
            })))
            .mount(&server)
            .await;

        let err = generator_for(&server).await.generate().await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyCompletion));
    }
}
