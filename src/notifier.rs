//! Outbound alert delivery

use crate::config::Config;
use crate::errors::{MonitorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info};

/// Sends one alert message to the configured destination
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Deliver a message without letting a failure escape
///
/// Returns whether the send succeeded. Failures are logged here and nowhere else,
/// so a broken notifier can never trigger another notification.
pub async fn deliver(notifier: &dyn Notifier, message: &str) -> bool {
    match notifier.notify(message).await {
        Ok(()) => {
            info!("Notification sent: {}", message);
            true
        }
        Err(e) => {
            error!("Error sending Telegram notification: {}", e);
            false
        }
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Telegram Bot API sender
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(format!("device_watch/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(MonitorError::Http)?;

        Ok(Self {
            client,
            api_url: config.telegram_api_url.clone(),
            bot_token: config.telegram_bot_token.clone(),
            chat_id: config.telegram_chat_id.clone(),
        })
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_url, self.bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: message,
        };

        // The URL embeds the bot token; keep it out of the error text.
        let response = self
            .client
            .post(self.send_message_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::NotifyRequest(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(MonitorError::NotifyRequest(format!(
                "Telegram API returned {}: {}",
                status, error_body
            )));
        }

        debug!("Telegram accepted message for chat {}", self.chat_id);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{RecordingNotifier, closed_port_url};
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier_at(api_url: String) -> TelegramNotifier {
        let config = Config {
            telegram_bot_token: "123:abc".to_string(),
            telegram_chat_id: "-100200".to_string(),
            telegram_api_url: api_url,
            ..Config::default()
        };
        TelegramNotifier::new(&config).unwrap()
    }

    fn notifier_for(server: &MockServer) -> TelegramNotifier {
        notifier_at(server.uri())
    }

    #[tokio::test]
    async fn test_posts_chat_id_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(json!({ "chat_id": "-100200", "text": "hello" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        notifier_for(&server).notify("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_message_is_notify_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string("{\"ok\":false,\"description\":\"chat not found\"}"),
            )
            .mount(&server)
            .await;

        let err = notifier_for(&server).notify("hello").await.unwrap_err();

        match err {
            MonitorError::NotifyRequest(msg) => assert!(msg.contains("chat not found")),
            other => panic!("expected notify error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_error_hides_bot_token() {
        let notifier = notifier_at(closed_port_url());

        let err = notifier.notify("hello").await.unwrap_err();

        match err {
            MonitorError::NotifyRequest(msg) => {
                assert!(msg.contains("error sending request"));
                assert!(!msg.contains("Telegram API returned"));
                assert!(!msg.contains("123:abc"));
            }
            other => panic!("expected notify error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deliver_swallows_failures() {
        let notifier = RecordingNotifier::failing();

        assert!(!deliver(&notifier, "first").await);
        assert!(!deliver(&notifier, "second").await);
        assert_eq!(notifier.messages().await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_deliver_reports_success() {
        let notifier = RecordingNotifier::default();

        assert!(deliver(&notifier, "ok").await);
        assert_eq!(notifier.messages().await, vec!["ok"]);
    }
}
