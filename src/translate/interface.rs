//! Translate interface - implemented against the Watson Language Translator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BotResult;

/// A language the service can identify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    #[serde(rename = "language")]
    pub code: String,
    pub name: String,
}

/// One identification candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedLanguage {
    pub language: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: Vec<String>,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub translation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translations: Vec<Translation>,
    #[serde(default)]
    pub word_count: Option<u64>,
    #[serde(default)]
    pub character_count: Option<u64>,
}

/// Language identification and translation backend
#[async_trait]
pub trait TranslatorInterface: Send + Sync {
    /// List every language the identifier knows about.
    async fn list_identifiable_languages(&self) -> BotResult<Vec<LanguageEntry>>;

    /// Identify `text`, returning candidates in service order.
    async fn identify(&self, text: &str) -> BotResult<Vec<IdentifiedLanguage>>;

    /// Translate `text` from `source` to `target`.
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> BotResult<TranslateResponse>;
}
