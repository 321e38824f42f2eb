use std::fmt;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Endpoints and credentials, passed explicitly to the clients.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub server_url: String,
    pub chat_url: String,
    pub api_key: String,
}

impl Config {
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self {
            chat_url: default_chat_url(&server_url),
            server_url,
            api_key: String::new(),
        }
    }

    pub fn with_chat_url(mut self, chat_url: impl Into<String>) -> Self {
        self.chat_url = chat_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Merge optional settings field by field. An explicit `chat_url` wins
    /// over the one derived from the server URL.
    pub fn resolve(
        server_url: Option<String>,
        chat_url: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        let mut config = Config::new(server_url.unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()));
        if let Some(chat_url) = chat_url {
            config.chat_url = chat_url;
        }
        if let Some(api_key) = api_key {
            config.api_key = api_key;
        }
        config
    }
}

fn default_chat_url(server_url: &str) -> String {
    format!("{}/functions/v1/deal-chat", server_url)
}

/// Shows only the first and last four characters of a key.
pub fn mask_key(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_url", &self.server_url)
            .field("chat_url", &self.chat_url)
            .field("api_key", &mask_key(&self.api_key))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_chat_url() {
        let config = Config::new("https://crm.example.com/");
        assert_eq!(config.server_url, "https://crm.example.com");
        assert_eq!(config.chat_url, "https://crm.example.com/functions/v1/deal-chat");
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_resolve_keeps_explicit_chat_url() {
        let config = Config::resolve(
            Some("http://127.0.0.1:9".into()),
            Some("http://chat.example/deal-chat".into()),
            None,
        );
        assert_eq!(config.server_url, "http://127.0.0.1:9");
        assert_eq!(config.chat_url, "http://chat.example/deal-chat");
    }

    #[test]
    fn test_resolve_defaults() {
        let config = Config::resolve(None, None, Some("key".into()));
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.chat_url, format!("{}/functions/v1/deal-chat", DEFAULT_SERVER_URL));
        assert_eq!(config.api_key, "key");
    }

    #[test]
    fn test_debug_masks_api_key() {
        let config = Config::new("http://x").with_api_key("sk-1234567890abcd");
        let debug = format!("{:?}", config);
        assert!(debug.contains("sk-1...abcd"));
        assert!(!debug.contains("567890"));
    }

    #[test]
    fn test_mask_short_key() {
        assert_eq!(mask_key("abc"), "***");
        assert_eq!(mask_key(""), "");
    }
}
