pub mod client;
pub mod decoder;
pub mod session;

pub use client::ChatClient;
pub use decoder::{DecoderState, StreamDecoder};
pub use session::ChatSession;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Fallback reason when a failed response carries no `error` field.
pub const GENERIC_FAILURE: &str = "Failed to get response";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Stream error: {0}")]
    Stream(String),
}

impl ChatError {
    /// Text shown to the user when a send fails.
    pub fn reason(&self) -> String {
        match self {
            ChatError::Http(err) => err.to_string(),
            ChatError::Api { message, .. } => message.clone(),
            ChatError::Stream(message) => message.clone(),
        }
    }
}

impl Serialize for ChatError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
