//! Telegram Bot API client
//!
//! Sends HTML messages to one chat and long-polls for incoming updates.

use super::Notifier;
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use std::time::Duration;

/// Telegram Bot API base URL
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Extra client-side time on top of the server long-poll timeout
const POLL_GRACE: Duration = Duration::from_secs(5);

/// Configuration for the Telegram client
#[derive(Debug, Clone)]
pub struct TelegramClientConfig {
    pub api_url: String,
    pub bot_token: String,
    pub chat_id: i64,
    /// Timeout for sendMessage
    pub request_timeout: Duration,
    /// Server-side long-poll timeout for getUpdates
    pub poll_timeout: Duration,
}

/// Client bound to one bot and one chat
pub struct TelegramClient {
    config: TelegramClientConfig,
    client: Client,
}

/// Envelope around every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// One incoming update
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl TelegramClient {
    pub fn new(config: TelegramClientConfig) -> anyhow::Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { config, client })
    }

    /// Chat this client sends to
    pub fn chat_id(&self) -> i64 {
        self.config.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_url, self.config.bot_token, method
        )
    }

    /// Send an HTML message with link previews disabled
    pub async fn send_message(&self, text: &str) -> anyhow::Result<()> {
        let body = json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(self.config.request_timeout)
            .json(&body)
            .send()
            .await?;

        let _: serde_json::Value = read_response(response).await?;
        Ok(())
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64) -> anyhow::Result<Vec<Update>> {
        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .timeout(self.config.poll_timeout + POLL_GRACE)
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", self.config.poll_timeout.as_secs().to_string()),
            ])
            .send()
            .await?;

        read_response(response).await
    }
}

async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> anyhow::Result<T> {
    let status = response.status();
    let envelope: ApiResponse<T> = response.json().await?;
    unwrap_envelope(status, envelope)
}

fn unwrap_envelope<T>(status: reqwest::StatusCode, envelope: ApiResponse<T>) -> anyhow::Result<T> {
    if !envelope.ok {
        anyhow::bail!(
            "Telegram API error: {} - {}",
            status,
            envelope.description.unwrap_or_default()
        );
    }
    envelope
        .result
        .ok_or_else(|| anyhow::anyhow!("Telegram API returned no result"))
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        self.send_message(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn client() -> TelegramClient {
        TelegramClient::new(TelegramClientConfig {
            api_url: TELEGRAM_API_URL.to_string(),
            bot_token: "123:abc".to_string(),
            chat_id: 42,
            request_timeout: Duration::from_secs(10),
            poll_timeout: Duration::from_secs(30),
        })
        .unwrap()
    }

    #[test]
    fn test_method_url() {
        assert_eq!(
            client().method_url("getUpdates"),
            "https://api.telegram.org/bot123:abc/getUpdates"
        );
    }

    #[test]
    fn test_parse_updates() {
        let json = r#"{"ok": true, "result": [
            {"update_id": 10, "message": {"message_id": 1, "chat": {"id": 42, "type": "private"},
             "text": "/status"}},
            {"update_id": 11, "edited_message": {"message_id": 1}}
        ]}"#;
        let envelope: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        let updates = unwrap_envelope(StatusCode::OK, envelope).unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].update_id, 10);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.text.as_deref(), Some("/status"));
        assert!(updates[1].message.is_none());
    }

    #[test]
    fn test_error_envelope() {
        let json = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let envelope: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        let err = unwrap_envelope(StatusCode::UNAUTHORIZED, envelope).unwrap_err();
        assert!(err.to_string().contains("Unauthorized"));
    }
}
