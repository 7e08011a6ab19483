use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde::Deserialize;
use tracing::{debug, error};

use super::interface::{
    IdentifiedLanguage, LanguageEntry, TranslateRequest, TranslateResponse, TranslatorInterface,
};
use crate::error::{BotError, BotResult};

/// API version date sent with every request.
pub const API_VERSION: &str = "2018-05-01";

#[derive(Debug, Deserialize)]
struct IdentifiableLanguagesResponse {
    languages: Vec<LanguageEntry>,
}

#[derive(Debug, Deserialize)]
struct IdentifyResponse {
    #[serde(default)]
    languages: Vec<IdentifiedLanguage>,
}

/// Client for the Watson Language Translator v3 REST API
#[derive(Debug, Clone)]
pub struct WatsonTranslatorClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WatsonTranslatorClient {
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/v3/{}", self.base_url, endpoint)
    }

    /// Turn a non-2xx response into a message carrying status and body.
    async fn failure_message(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("{} - {}", status, body)
    }
}

#[async_trait]
impl TranslatorInterface for WatsonTranslatorClient {
    async fn list_identifiable_languages(&self) -> BotResult<Vec<LanguageEntry>> {
        let response = self
            .client
            .get(self.url("identifiable_languages"))
            .query(&[("version", API_VERSION)])
            .basic_auth("apikey", Some(&self.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::failure_message(response).await;
            error!("Listing identifiable languages failed: {}", message);
            return Err(BotError::ServiceUnavailable(message));
        }

        let result: IdentifiableLanguagesResponse = response.json().await?;
        debug!("Service lists {} identifiable languages", result.languages.len());
        Ok(result.languages)
    }

    async fn identify(&self, text: &str) -> BotResult<Vec<IdentifiedLanguage>> {
        let response = self
            .client
            .post(self.url("identify"))
            .query(&[("version", API_VERSION)])
            .basic_auth("apikey", Some(&self.api_key))
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(text.to_string())
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::failure_message(response).await;
            error!("Language identification failed: {}", message);
            return Err(BotError::ServiceUnavailable(message));
        }

        let result: IdentifyResponse = response.json().await?;
        Ok(result.languages)
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> BotResult<TranslateResponse> {
        let request = TranslateRequest {
            text: vec![text.to_string()],
            source: source.to_string(),
            target: target.to_string(),
        };

        let response = self
            .client
            .post(self.url("translate"))
            .query(&[("version", API_VERSION)])
            .basic_auth("apikey", Some(&self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::TranslationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let message = Self::failure_message(response).await;
            error!("Translation {} -> {} failed: {}", source, target, message);
            return Err(BotError::TranslationFailed(message));
        }

        let result: TranslateResponse = response
            .json()
            .await
            .map_err(|e| BotError::TranslationFailed(e.to_string()))?;
        debug!(
            "Translated {} -> {} ({} words, {} characters)",
            source,
            target,
            result.word_count.unwrap_or_default(),
            result.character_count.unwrap_or_default()
        );
        Ok(result)
    }
}
