use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use super::commands::CallbackReply;
use super::interface::{ChatPlatform, BOT_USERNAME};
use crate::error::{BotError, BotResult};

/// Slack Web API client used for replies
#[derive(Debug, Clone)]
pub struct SlackClient {
    client: Client,
    api_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(client: Client, api_url: String, token: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl ChatPlatform for SlackClient {
    async fn reply_via_callback(&self, response_url: &str, reply: &CallbackReply) -> BotResult<()> {
        debug!("Sending delayed response to: {}", response_url);

        let resp = self
            .client
            .post(response_url)
            .json(reply)
            .send()
            .await
            .map_err(|e| BotError::DeliveryFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!("Failed to send delayed response: {} - {}", status, body);
            return Err(BotError::DeliveryFailed(format!("{} - {}", status, body)));
        }

        debug!("Delayed response sent successfully");
        Ok(())
    }

    async fn post_to_channel(&self, text: &str, channel: &str) -> BotResult<()> {
        let url = format!("{}/chat.postMessage", self.api_url);
        let form = [
            ("token", self.token.as_str()),
            ("channel", channel),
            ("text", text),
            ("as_user", "false"),
            ("username", BOT_USERNAME),
        ];

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .form(&form)
            .send()
            .await
            .map_err(|e| BotError::DeliveryFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            error!("chat.postMessage returned HTTP {}", status);
            return Err(BotError::DeliveryFailed(format!("HTTP {}", status)));
        }

        let response: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| BotError::DeliveryFailed(e.to_string()))?;

        if response.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let error = response
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown");
            error!("chat.postMessage to {} failed: {}", channel, error);
            return Err(BotError::DeliveryFailed(error.to_string()));
        }

        debug!("Posted message to {}: {}", channel, response);
        Ok(())
    }
}
