//! Error types shared by the translation and chat clients.

use thiserror::Error;

/// Errors raised while serving a chat request.
#[derive(Error, Debug)]
pub enum BotError {
    /// Identification, language listing or the transport to the
    /// translation service failed.
    #[error("Translation service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The translate call itself failed or returned nothing usable.
    #[error("Translation failed: {0}")]
    TranslationFailed(String),

    /// A reply could not be delivered to the chat platform.
    #[error("Reply delivery failed: {0}")]
    DeliveryFailed(String),

    /// An inbound webhook body did not have the expected shape.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BotError::ServiceUnavailable(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            BotError::ServiceUnavailable(format!("Connection failed: {}", err))
        } else {
            BotError::ServiceUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::MalformedPayload(err.to_string())
    }
}

impl From<::config::ConfigError> for BotError {
    fn from(err: ::config::ConfigError) -> Self {
        BotError::Config(err.to_string())
    }
}

pub type BotResult<T> = std::result::Result<T, BotError>;
