use std::time::Duration;

use async_trait::async_trait;
use eyre::{eyre, Result};
use reqwest::Client;
use serde_json::{json, Value};

use super::Notifier;
use crate::config::TelegramSettings;

/// Telegram Bot API root
const API_ROOT: &str = "https://api.telegram.org";

/// Telegram notifier
#[derive(Debug)]
pub struct TelegramNotifier {
    /// Bot token and target chat
    settings: TelegramSettings,
    /// The HTTP client
    client: Client,
}

impl TelegramNotifier {
    /// Create a new Telegram notifier
    ///
    /// # Errors
    /// * If the HTTP client cannot be built
    pub fn new(settings: TelegramSettings) -> Result<Self> {
        // Create a client with a timeout
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            settings,
            client,
        })
    }

    /// Endpoint for `sendMessage`
    fn endpoint(&self) -> String {
        format!("{API_ROOT}/bot{}/sendMessage", self.settings.token)
    }

    /// JSON body for `sendMessage`
    fn payload(&self, text: &str) -> Value {
        json!({
            "chat_id": self.settings.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&self.payload(text))
            .send()
            .await?
            .json::<Value>()
            .await?;

        // Check if Telegram API returned success
        if !response["ok"].as_bool().unwrap_or(false) {
            return Err(eyre!(
                "Telegram API error: {}",
                response["description"].as_str().unwrap_or("unknown error")
            ));
        }

        Ok(())
    }
}
