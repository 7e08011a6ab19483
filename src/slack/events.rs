//! Event API callbacks.
//!
//! Handles the envelope kinds Slack posts to the event endpoint:
//! - `url_verification` - ownership handshake, the challenge is echoed
//! - `event_callback` carrying an `app_mention` - the mention is translated
//!
//! Every other kind is acknowledged and ignored.

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// Outer envelope of an Events API request.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        #[serde(default)]
        event: Option<InnerEvent>,
        #[serde(default)]
        authed_users: Vec<String>,
        #[serde(default)]
        authorizations: Vec<Authorization>,
    },
    /// Unknown envelope type (for forward compatibility).
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InnerEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Authorization {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// What the event endpoint should do with an envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum EventAction {
    /// Answer the handshake with this body.
    Challenge(String),
    /// Translate `text` and post the result to `channel`.
    TranslateMention { text: String, channel: String },
    Ignore(&'static str),
}

/// Decide how to handle an envelope. `fallback_bot_id` is used when the
/// envelope does not say which user the bot is.
pub fn route_event(envelope: EventEnvelope, fallback_bot_id: Option<&str>) -> EventAction {
    match envelope {
        EventEnvelope::UrlVerification { challenge } => EventAction::Challenge(challenge),
        EventEnvelope::EventCallback {
            event,
            authed_users,
            authorizations,
        } => {
            let Some(event) = event else {
                return EventAction::Ignore("callback without event");
            };
            let Some(text) = event.text.filter(|t| !t.is_empty()) else {
                return EventAction::Ignore("event without text");
            };
            if event.event_type != "app_mention" {
                debug!("Ignoring event type {}", event.event_type);
                return EventAction::Ignore("unhandled event type");
            }
            let Some(channel) = event.channel else {
                return EventAction::Ignore("mention without channel");
            };

            let bot_id = authed_users
                .first()
                .cloned()
                .or_else(|| authorizations.into_iter().find_map(|a| a.user_id))
                .or_else(|| fallback_bot_id.map(str::to_string));

            let text = strip_mention(&text, bot_id.as_deref());
            if text.is_empty() {
                return EventAction::Ignore("mention without text");
            }
            EventAction::TranslateMention { text, channel }
        }
        EventEnvelope::Unknown => EventAction::Ignore("unhandled envelope type"),
    }
}

/// Remove the first mention of `bot_id` (`<@ID>` or `<@ID|name>`) and trim.
pub fn strip_mention(text: &str, bot_id: Option<&str>) -> String {
    let Some(id) = bot_id else {
        return text.trim().to_string();
    };

    let pattern = format!(r"<@{}(\|[^>]*)?>", regex::escape(id));
    match Regex::new(&pattern) {
        Ok(re) => re.replacen(text, 1, "").trim().to_string(),
        Err(_) => text.replacen(&format!("<@{}>", id), "", 1).trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: serde_json::Value) -> EventEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_strip_mention() {
        assert_eq!(
            strip_mention("<@BOTID> translate this", Some("BOTID")),
            "translate this"
        );
        assert_eq!(
            strip_mention("<@BOTID|watson>   hola  ", Some("BOTID")),
            "hola"
        );
    }

    #[test]
    fn test_strip_mention_keeps_other_users() {
        assert_eq!(
            strip_mention("<@BOTID> ask <@U999> please", Some("BOTID")),
            "ask <@U999> please"
        );
        assert_eq!(strip_mention(" <@U999> hi ", None), "<@U999> hi");
    }

    #[test]
    fn test_url_verification_echoes_challenge() {
        let envelope = parse(serde_json::json!({
            "type": "url_verification",
            "token": "ignored",
            "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
        }));

        assert_eq!(
            route_event(envelope, None),
            EventAction::Challenge(
                "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P".to_string()
            )
        );
    }

    #[test]
    fn test_app_mention_is_translated() {
        let envelope = parse(serde_json::json!({
            "type": "event_callback",
            "authed_users": ["BOTID"],
            "event": {
                "type": "app_mention",
                "text": "<@BOTID> translate this",
                "channel": "C123",
                "user": "U1"
            }
        }));

        assert_eq!(
            route_event(envelope, None),
            EventAction::TranslateMention {
                text: "translate this".to_string(),
                channel: "C123".to_string()
            }
        );
    }

    #[test]
    fn test_authorizations_and_fallback_bot_id() {
        let envelope = parse(serde_json::json!({
            "type": "event_callback",
            "authorizations": [{"user_id": "UBOT"}],
            "event": {"type": "app_mention", "text": "<@UBOT> bonjour", "channel": "C1"}
        }));
        assert!(matches!(
            route_event(envelope, None),
            EventAction::TranslateMention { ref text, .. } if text == "bonjour"
        ));

        let envelope = parse(serde_json::json!({
            "type": "event_callback",
            "event": {"type": "app_mention", "text": "<@UCFG> hallo", "channel": "C1"}
        }));
        assert!(matches!(
            route_event(envelope, Some("UCFG")),
            EventAction::TranslateMention { ref text, .. } if text == "hallo"
        ));
    }

    #[test]
    fn test_event_without_text_is_ignored() {
        let envelope = parse(serde_json::json!({
            "type": "event_callback",
            "authed_users": ["BOTID"],
            "event": {"type": "app_mention", "channel": "C123"}
        }));
        assert!(matches!(route_event(envelope, None), EventAction::Ignore(_)));

        let envelope = parse(serde_json::json!({
            "type": "event_callback",
            "authed_users": ["BOTID"],
            "event": {"type": "app_mention", "text": "<@BOTID>  ", "channel": "C123"}
        }));
        assert!(matches!(route_event(envelope, None), EventAction::Ignore(_)));
    }

    #[test]
    fn test_other_events_are_ignored() {
        let envelope = parse(serde_json::json!({
            "type": "event_callback",
            "event": {"type": "message", "text": "hello", "channel": "C123"}
        }));
        assert!(matches!(route_event(envelope, None), EventAction::Ignore(_)));

        let envelope = parse(serde_json::json!({"type": "app_rate_limited"}));
        assert!(matches!(envelope, EventEnvelope::Unknown));
        assert!(matches!(route_event(envelope, None), EventAction::Ignore(_)));
    }

    #[test]
    fn test_url_verification_without_challenge_is_malformed() {
        let result: Result<EventEnvelope, _> =
            serde_json::from_value(serde_json::json!({"type": "url_verification"}));
        assert!(result.is_err());
    }
}
