use anyhow::Result;
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub backend: BackendConfig,
    pub messaging: MessagingConfig,
    pub conversation: ConversationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// OpenAI-compatible chat completion endpoint. Defaults target Cohere's
/// compatibility API.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cohere.ai/compatibility".to_string(),
            api_key: String::new(),
            model: "command-r".to_string(),
            timeout_seconds: 30,
            max_tokens: 200,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Persistence is disabled while this is unset.
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            api_key: None,
            timeout_seconds: 10,
        }
    }
}

/// Messaging-provider account. Replies go back inline as TwiML, so these are
/// only reported at startup.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct MessagingConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub phone_number: Option<String>,
}

impl MessagingConfig {
    pub fn is_configured(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ConversationConfig {
    pub max_history: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self { max_history: 20 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub app_log_prefix: String,
    pub max_log_files: usize,
    pub max_message_log_bytes: u64,
    pub queue_capacity: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            app_log_prefix: "ai_agent".to_string(),
            max_log_files: 7,
            max_message_log_bytes: 10 * 1024 * 1024,
            queue_capacity: 1024,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::with_legacy_env(Self::builder(None), |key| std::env::var(key).ok())?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// `config/settings.toml` (relative to the working directory), then
    /// `APP_<SECTION>__<KEY>` variables. `env` replaces the process
    /// environment when given.
    fn builder(env: Option<Map<String, String>>) -> ConfigBuilder<DefaultState> {
        Config::builder()
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
    }

    /// Flat variables used by existing deployments (`COHERE_API_KEY`, `PORT`, ...)
    /// take precedence over everything else.
    fn with_legacy_env<F>(
        builder: ConfigBuilder<DefaultState>,
        lookup: F,
    ) -> Result<ConfigBuilder<DefaultState>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = var("PORT")
            .map(|p| p.parse::<u16>())
            .transpose()?
            .map(i64::from);

        let builder = builder
            .set_override_option("llm.api_key", var("COHERE_API_KEY"))?
            .set_override_option("messaging.account_sid", var("TWILIO_ACCOUNT_SID"))?
            .set_override_option("messaging.auth_token", var("TWILIO_AUTH_TOKEN"))?
            .set_override_option("messaging.phone_number", var("TWILIO_PHONE_NUMBER"))?
            .set_override_option("backend.base_url", var("BACKEND_API_URL"))?
            .set_override_option("backend.api_key", var("BACKEND_API_KEY"))?
            .set_override_option("server.port", port)?;

        Ok(builder)
    }

    /// Persistence is only attempted with a backend key.
    pub fn persistence_enabled(&self) -> bool {
        self.backend.api_key.is_some()
    }
}
