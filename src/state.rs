use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::config::Config;
use crate::error::BotResult;
use crate::languages::LanguageDirectory;
use crate::slack::{ChatPlatform, SlackClient};
use crate::translate::{AutoTranslator, TranslatorInterface, WatsonTranslatorClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub translator: Arc<dyn TranslatorInterface>,
    pub auto_translator: AutoTranslator,
    pub chat: Arc<dyn ChatPlatform>,
    pub languages: Arc<LanguageDirectory>,
    /// Background translation jobs, awaited on shutdown.
    pub jobs: TaskTracker,
}

impl AppState {
    /// Build the state with HTTP clients for the configured services.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        let translator = Arc::new(WatsonTranslatorClient::new(
            http.clone(),
            config.service_url.clone(),
            config.api_key.clone(),
        ));
        let chat = Arc::new(SlackClient::new(
            http,
            config.slack_api_url.clone(),
            config.chat_token.clone(),
        ));

        Ok(Self::with_services(config, translator, chat))
    }

    pub fn with_services(
        config: Config,
        translator: Arc<dyn TranslatorInterface>,
        chat: Arc<dyn ChatPlatform>,
    ) -> Self {
        Self {
            config,
            auto_translator: AutoTranslator::new(translator.clone()),
            translator,
            chat,
            languages: Arc::new(LanguageDirectory::new()),
            jobs: TaskTracker::new(),
        }
    }

    /// Fill the language directory. Failure means the service must not
    /// report ready.
    pub async fn load_languages(&self) -> BotResult<usize> {
        self.languages.load(self.translator.as_ref()).await
    }

    pub fn generate_job_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
