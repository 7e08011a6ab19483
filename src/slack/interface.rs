use async_trait::async_trait;

use super::commands::CallbackReply;
use crate::error::BotResult;

/// Display name used for channel posts.
pub const BOT_USERNAME: &str = "Watson Bot";

/// Outbound side of the chat platform
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Post `reply` to a one-time slash command response URL.
    async fn reply_via_callback(&self, response_url: &str, reply: &CallbackReply) -> BotResult<()>;

    /// Post `text` to `channel` as the bot.
    async fn post_to_channel(&self, text: &str, channel: &str) -> BotResult<()>;
}
