use std::path::PathBuf;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use super::Environment;

/// Process configuration, built once in `main` and handed to constructors.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub messaging: MessagingSettings,
    pub transcription: TranscriptionSettings,
    pub worker: WorkerSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub provider: StorageProviderSetting,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: String,
    pub use_ssl: bool,
    pub local_path: String,
    pub max_retries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProviderSetting {
    S3,
    Local,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingSettings {
    pub enabled: bool,
    pub bootstrap_servers: String,
    pub group_id: String,
    pub inbound_topic: String,
    pub outbound_topic: String,
    pub connect_timeout_secs: u64,
    pub publish_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionSettings {
    pub provider: TranscriptionProviderSetting,
    pub default_model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub remote_model: Option<String>,
    pub scratch_dir: Option<String>,
}

impl TranscriptionSettings {
    /// Directory for materialized audio; the system temp dir when unset.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .as_deref()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProviderSetting {
    Local,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    pub shutdown_timeout_secs: u64,
    pub receive_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Settings {
    /// Layers built-in defaults, `appsettings.<env>.toml` (optional) and
    /// `APP__SECTION__KEY` environment variables.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        Self::builder(environment)?
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Defaults plus the environment overlay file, without process variables.
    pub fn builder(
        environment: Environment,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("storage.provider", "s3")?
            .set_default("storage.region", "us-east-1")?
            .set_default("storage.use_ssl", true)?
            .set_default("storage.local_path", "./data")?
            .set_default("storage.max_retries", 3)?
            .set_default("messaging.enabled", true)?
            .set_default("messaging.bootstrap_servers", "localhost:9092")?
            .set_default("messaging.group_id", "whisper-transcriber")?
            .set_default("messaging.inbound_topic", "send-data")?
            .set_default("messaging.outbound_topic", "recognition")?
            .set_default("messaging.connect_timeout_secs", 10)?
            .set_default("messaging.publish_timeout_secs", 5)?
            .set_default("transcription.provider", "local")?
            .set_default("transcription.default_model", "medium")?
            .set_default("worker.shutdown_timeout_secs", 10)?
            .set_default("worker.receive_backoff_ms", 1000)?
            .set_default("logging.level", "info,whisper_relay=debug,tower_http=debug")?
            .set_default("logging.enable_json", false)?
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.config_name()))
                    .required(false),
            ))
    }
}
