mod openai;

pub use openai::{LlmError, OpenAiClient};
