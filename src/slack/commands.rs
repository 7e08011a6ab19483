//! Slash command handling.
//!
//! Two commands are recognised, both translating their text:
//! - the public command replies in the channel for everyone to see
//! - the private command replies only to the invoking user
//!
//! The result is delivered later through the command's `response_url`.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Slash command payload as posted by Slack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashCommandPayload {
    /// The command (e.g. "/translate").
    pub command: String,
    /// Text after the command.
    #[serde(default)]
    pub text: String,
    /// User who invoked the command.
    #[serde(default)]
    pub user_id: String,
    /// URL for the delayed reply.
    pub response_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

/// Who can see a callback reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Only visible to the user who invoked the command.
    Ephemeral,
    /// Visible to everyone in the channel.
    InChannel,
}

/// Legacy message attachment carrying the translated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub text: String,
}

/// Body posted to a `response_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackReply {
    pub text: String,
    /// Omitted for private replies, which Slack then treats as ephemeral.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// Parsed slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCommand {
    /// Translate `text` and reply through `response_url`.
    Translate {
        text: String,
        user_id: String,
        response_url: String,
        response_type: Option<ResponseType>,
    },
    Unknown {
        command: String,
    },
}

/// Match the payload against the configured public and private commands.
pub fn parse_command(
    payload: &SlashCommandPayload,
    public_command: &str,
    private_command: &str,
) -> ParsedCommand {
    let response_type = if payload.command == public_command {
        Some(ResponseType::InChannel)
    } else if payload.command == private_command {
        None
    } else {
        warn!("Unknown command {} for request {:?}", payload.command, payload);
        return ParsedCommand::Unknown {
            command: payload.command.clone(),
        };
    };

    ParsedCommand::Translate {
        text: payload.text.clone(),
        user_id: payload.user_id.clone(),
        response_url: payload.response_url.clone(),
        response_type,
    }
}

/// Heading shown above the translation, e.g.
/// `:-watson-: <@U1>: 'Hello' in Japanese would be`.
pub fn reply_label(user_id: &str, text: &str, language_name: &str) -> String {
    format!(
        ":-watson-: <@{}>: '{}' in {} would be",
        user_id, text, language_name
    )
}

/// Assemble the callback reply for a finished translation.
pub fn build_reply(
    user_id: &str,
    original: &str,
    language_name: &str,
    translation: &str,
    response_type: Option<ResponseType>,
) -> CallbackReply {
    CallbackReply {
        text: reply_label(user_id, original, language_name),
        response_type,
        attachments: vec![Attachment {
            text: translation.to_string(),
        }],
    }
}
