//! # configs
//!
//! Layered runtime settings. Sources, lowest priority first:
//! built-in defaults, `config/default.toml`, `config/local.toml`, then
//! `OCR_CHECKIN__SECTION__KEY` environment variables (a `.env` file is
//! loaded into the environment beforehand).

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_PREFIX: &str = "OCR_CHECKIN";
const ENV_SEPARATOR: &str = "__";
const CONFIG_DIR: &str = "config";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub upload: UploadSettings,
    pub ocr: OcrSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    /// `host:port`, ready for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct StorageSettings {
    /// The submission log
    pub path: PathBuf,
    /// Directory served for every path the API does not claim
    pub static_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct UploadSettings {
    pub max_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct OcrSettings {
    pub endpoint: String,
    #[serde(deserialize_with = "secret_string")]
    pub api_key: SecretString,
    pub timeout_secs: u64,
}

impl OcrSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().is_empty()
    }
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    /// Fallback filter when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

fn secret_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

impl Settings {
    /// Loads `.env`, then every source from the working directory.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::build(Path::new(CONFIG_DIR), env_source())
    }

    fn build(config_dir: &Path, env: Environment) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000_i64)?
            .set_default("storage.path", "u.nickname")?
            .set_default("storage.static_dir", "public")?
            .set_default("upload.max_bytes", 10_i64 * 1024 * 1024)?
            .set_default("ocr.endpoint", "https://vision.googleapis.com/v1/images:annotate")?
            .set_default("ocr.api_key", "")?
            .set_default("ocr.timeout_secs", 15_i64)?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?
            .add_source(File::with_name(&config_dir.join("default").to_string_lossy()).required(false))
            .add_source(File::with_name(&config_dir.join("local").to_string_lossy()).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("storage.path must not be empty".into()));
        }
        if self.ocr.timeout_secs == 0 {
            return Err(ConfigError::Invalid("ocr.timeout_secs must be at least 1".into()));
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Invalid("upload.max_bytes must be non-zero".into()));
        }
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}
