//! Configuration management for the device monitor

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Telegram bot token used to build the sendMessage URL
    pub telegram_bot_token: String,

    /// Chat that receives every alert
    pub telegram_chat_id: String,

    /// Token sent to the status API in the `token` header
    pub api_token: String,

    /// Path to the device roster CSV
    pub roster_path: String,

    /// Base URL of the device status API
    pub status_api_url: String,

    /// Base URL of the Telegram Bot API
    pub telegram_api_url: String,

    /// HTTP timeout for every outbound request
    pub http_timeout: Duration,

    /// Also alert when a status lookup fails outright
    pub notify_on_check_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
            api_token: String::new(),
            roster_path: "devices.csv".to_string(),
            status_api_url: "https://api.io.solutions".to_string(),
            telegram_api_url: "https://api.telegram.org".to_string(),
            http_timeout: Duration::from_secs(10),
            notify_on_check_error: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            config.telegram_bot_token = token;
        }

        if let Some(chat_id) = lookup("TELEGRAM_CHAT_ID") {
            config.telegram_chat_id = chat_id;
        }

        if let Some(token) = lookup("API_TOKEN") {
            config.api_token = token;
        }

        if let Some(path) = lookup("ROSTER_PATH") {
            config.roster_path = path;
        }

        if let Some(url) = lookup("STATUS_API_URL") {
            config.status_api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(url) = lookup("TELEGRAM_API_URL") {
            config.telegram_api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(timeout) = lookup("HTTP_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.http_timeout = Duration::from_secs(seconds);
            }
        }

        if let Some(notify) = lookup("NOTIFY_ON_CHECK_ERROR") {
            config.notify_on_check_error = notify.to_lowercase() == "true";
        }

        config
    }

    /// Validate the configuration
    ///
    /// Individual empty credentials pass; they fail later as authentication errors.
    /// All three being empty means nothing was configured at all.
    pub fn validate(&self) -> Result<(), String> {
        if self.telegram_bot_token.is_empty()
            && self.telegram_chat_id.is_empty()
            && self.api_token.is_empty()
        {
            return Err(
                "TELEGRAM_BOT_TOKEN, TELEGRAM_CHAT_ID and API_TOKEN are all unset".to_string(),
            );
        }

        if self.roster_path.is_empty() {
            return Err("roster_path cannot be empty".to_string());
        }

        if self.status_api_url.is_empty() {
            return Err("status_api_url cannot be empty".to_string());
        }

        if self.telegram_api_url.is_empty() {
            return Err("telegram_api_url cannot be empty".to_string());
        }

        if self.http_timeout.is_zero() {
            return Err("http_timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Names of credentials that are not set
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.telegram_bot_token.is_empty() {
            missing.push("TELEGRAM_BOT_TOKEN");
        }
        if self.telegram_chat_id.is_empty() {
            missing.push("TELEGRAM_CHAT_ID");
        }
        if self.api_token.is_empty() {
            missing.push("API_TOKEN");
        }
        missing
    }
}
