//! Telegram Bot API `sendMessage`.

use serde::Serialize;

use crate::integrations::{IntegrationError, check_status, http_client};
use crate::models::config::ServerConfig;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[cfg_attr(feature = "test-mocks", mockall::automock)]
pub trait ChatSender {
    fn send_message(&self, chat_id: &str, text: &str) -> Result<(), IntegrationError>;
}

pub struct TelegramClient {
    http: reqwest::blocking::Client,
    api_url: String,
    bot_token: String,
}

impl TelegramClient {
    pub fn new(config: &ServerConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            http: http_client()?,
            api_url: config.telegram_api_url.trim_end_matches('/').to_string(),
            bot_token: config.telegram_bot_token.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_url, self.bot_token)
    }
}

impl ChatSender for TelegramClient {
    /// Sends an HTML-formatted message. Callers escape user content.
    fn send_message(&self, chat_id: &str, text: &str) -> Result<(), IntegrationError> {
        if self.bot_token.is_empty() {
            return Err(IntegrationError::NotConfigured("telegram_bot_token"));
        }
        if chat_id.trim().is_empty() {
            return Err(IntegrationError::InvalidRequest("empty chat id".to_string()));
        }
        let response = self
            .http
            .post(self.endpoint())
            .json(&SendMessage {
                chat_id,
                text,
                parse_mode: "HTML",
            })
            .send()?;
        check_status(response)?;
        Ok(())
    }
}
