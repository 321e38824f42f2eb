use super::{ChatError, ChatMessage, GENERIC_FAILURE};
use crate::config::Config;
use crate::crm::models::{Contact, Deal};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

/// Body posted to the deal-chat endpoint.
#[derive(Debug, Serialize)]
pub struct DealChatRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub deal: &'a Deal,
    pub contact: &'a Contact,
}

pub type ByteStream = BoxStream<'static, Result<Bytes, ChatError>>;

#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    chat_url: String,
    api_key: String,
}

impl ChatClient {
    pub fn new(chat_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            chat_url: chat_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.chat_url.clone(), config.api_key.clone())
    }

    /// Post the conversation and hand back the response body as it arrives.
    pub async fn open_stream(&self, request: &DealChatRequest<'_>) -> Result<ByteStream, ChatError> {
        let mut req = self
            .http
            .post(&self.chat_url)
            .header("Content-Type", "application/json")
            .json(request);

        if !self.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status,
                message: failure_reason(&text),
            });
        }

        debug!(status = resp.status().as_u16(), "chat stream opened");
        Ok(resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ChatError::Stream(e.to_string())))
            .boxed())
    }
}

/// The `error` field of a JSON error body, or the generic reason.
fn failure_reason(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_from_error_field() {
        assert_eq!(failure_reason(r#"{"error":"rate limited"}"#), "rate limited");
    }

    #[test]
    fn test_failure_reason_fallbacks() {
        assert_eq!(failure_reason(""), GENERIC_FAILURE);
        assert_eq!(failure_reason("<html>bad gateway</html>"), GENERIC_FAILURE);
        assert_eq!(failure_reason(r#"{"error":""}"#), GENERIC_FAILURE);
        assert_eq!(failure_reason(r#"{"error":{"code":42}}"#), GENERIC_FAILURE);
        assert_eq!(failure_reason(r#"{"message":"nope"}"#), GENERIC_FAILURE);
    }
}
