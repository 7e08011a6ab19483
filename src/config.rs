use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::{BotError, BotResult};

const DEFAULT_SERVICE_NAME: &str = "Language Translator-bk";

/// Resolved runtime configuration.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the translator service instance.
    pub service_url: String,
    pub api_key: String,
    /// Bot OAuth token used for `chat.postMessage`.
    pub chat_token: String,
    pub host: String,
    pub port: u16,
    pub is_production: bool,
    pub slack_api_url: String,
    /// Slash command replying in channel.
    pub public_command: String,
    /// Slash command replying only to the invoking user.
    pub private_command: String,
    /// Mention id stripped when an event carries no `authed_users`.
    pub bot_user_id: Option<String>,
    pub http_timeout_secs: u64,
}

/// Flat settings as read from the config file and the environment.
#[derive(Debug, Deserialize)]
struct Settings {
    #[serde(default)]
    app_env: Option<String>,
    #[serde(default)]
    watson_translator_api_url: Option<String>,
    #[serde(default)]
    watson_translator_api_key: Option<String>,
    #[serde(default)]
    slack_oauth_access_token: Option<String>,
    #[serde(default)]
    vcap_services: Option<String>,
    #[serde(default = "default_service_name")]
    translator_service_name: String,
    #[serde(default = "default_host")]
    listen_host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_slack_api_url")]
    slack_api_url: String,
    #[serde(default = "default_public_command")]
    public_command: String,
    #[serde(default = "default_private_command")]
    private_command: String,
    #[serde(default)]
    bot_user_id: Option<String>,
    #[serde(default = "default_http_timeout_secs")]
    http_timeout_secs: u64,
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_slack_api_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_public_command() -> String {
    "/translate".to_string()
}

fn default_private_command() -> String {
    "/translatep".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

/// One bound service instance inside `VCAP_SERVICES`.
#[derive(Debug, Deserialize)]
struct VcapServiceInstance {
    name: String,
    #[serde(default)]
    credentials: Option<VcapCredentials>,
}

#[derive(Debug, Deserialize)]
struct VcapCredentials {
    url: Option<String>,
    apikey: Option<String>,
}

/// Read `.env` into the process environment unless running in production.
///
/// Returns `None` in production. Must run before logging is initialised so
/// that `RUST_LOG` from the file applies.
pub fn load_dotenv() -> Option<Result<PathBuf, dotenvy::Error>> {
    let production = std::env::var("APP_ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false);

    if production {
        None
    } else {
        Some(dotenvy::dotenv())
    }
}

impl Config {
    /// Configuration with defaults for everything except credentials.
    #[cfg(test)]
    pub fn new(service_url: String, api_key: String, chat_token: String) -> Self {
        Self {
            service_url,
            api_key,
            chat_token,
            host: default_host(),
            port: default_port(),
            is_production: false,
            slack_api_url: default_slack_api_url(),
            public_command: default_public_command(),
            private_command: default_private_command(),
            bot_user_id: None,
            http_timeout_secs: default_http_timeout_secs(),
        }
    }

    /// Load configuration from an optional config file overlaid by the
    /// process environment.
    pub fn load() -> BotResult<Self> {
        let file = std::env::var("CONFIG_PATH").ok();
        Self::from_sources(file.as_deref(), None)
    }

    /// Build configuration from a config file and an environment map.
    ///
    /// `env` replaces the process environment when given.
    fn from_sources(file: Option<&str>, env: Option<HashMap<String, String>>) -> BotResult<Self> {
        let file_source = match file {
            Some(path) => ::config::File::with_name(path).required(true),
            None => ::config::File::with_name("conf").required(false),
        };

        let settings: Settings = ::config::Config::builder()
            .add_source(file_source)
            .add_source(::config::Environment::default().source(env))
            .build()?
            .try_deserialize()?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: Settings) -> BotResult<Self> {
        let is_production = settings
            .app_env
            .as_deref()
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let (service_url, api_key) = if is_production {
            let vcap = settings.vcap_services.as_deref().ok_or_else(|| {
                BotError::Config("VCAP_SERVICES must be set in production".to_string())
            })?;
            find_service_credentials(vcap, &settings.translator_service_name)?
        } else {
            (
                required(settings.watson_translator_api_url, "WATSON_TRANSLATOR_API_URL")?,
                required(settings.watson_translator_api_key, "WATSON_TRANSLATOR_API_KEY")?,
            )
        };

        let chat_token = required(settings.slack_oauth_access_token, "SLACK_OAUTH_ACCESS_TOKEN")?;

        let bot_user_id = settings
            .bot_user_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            service_url: service_url.trim_end_matches('/').to_string(),
            api_key,
            chat_token,
            host: settings.listen_host,
            port: settings.port,
            is_production,
            slack_api_url: settings.slack_api_url.trim_end_matches('/').to_string(),
            public_command: settings.public_command,
            private_command: settings.private_command,
            bot_user_id,
            http_timeout_secs: settings.http_timeout_secs,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("service_url", &self.service_url)
            .field("api_key", &"<redacted>")
            .field("chat_token", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("is_production", &self.is_production)
            .field("slack_api_url", &self.slack_api_url)
            .field("public_command", &self.public_command)
            .field("private_command", &self.private_command)
            .field("bot_user_id", &self.bot_user_id)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

fn required(value: Option<String>, name: &str) -> BotResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BotError::Config(format!("{} must be set", name)))
}

/// Find the translator credentials of the bound service called `name`.
fn find_service_credentials(vcap: &str, name: &str) -> BotResult<(String, String)> {
    let services: HashMap<String, Vec<VcapServiceInstance>> = serde_json::from_str(vcap)
        .map_err(|e| BotError::Config(format!("VCAP_SERVICES is not valid JSON: {}", e)))?;

    let instance = services
        .values()
        .flatten()
        .find(|s| s.name == name)
        .ok_or_else(|| BotError::Config(format!("No bound service named '{}'", name)))?;

    let credentials = instance
        .credentials
        .as_ref()
        .ok_or_else(|| BotError::Config(format!("Service '{}' has no credentials", name)))?;

    match (&credentials.url, &credentials.apikey) {
        (Some(url), Some(apikey)) => Ok((url.clone(), apikey.clone())),
        _ => Err(BotError::Config(format!(
            "Service '{}' credentials need both url and apikey",
            name
        ))),
    }
}
