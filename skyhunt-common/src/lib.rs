//! SkyHunt Common Types
//!
//! Shared types used by the backend and its clients.

pub mod chat;
pub mod game;

pub use chat::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, ContentPart, ImageUrl,
    MessageContent, Usage,
};
pub use game::{GameResponse, PhotoVerdict, SubmitPhotoRequest};
