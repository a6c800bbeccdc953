//! Handles settings for the application. Configuration is read from
//! `settings.toml` (optional) and `CHANCHITO__*` environment variables, the
//! latter winning.
//!
//! See `settings.example.toml` for every key.
use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use interpreter::{InterpreterConfig, LlmConfig};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
    /// IANA name used to compute "today" for every message.
    pub timezone: String,
    /// How often expired conversations are swept while the bot runs.
    pub sweep_interval_secs: u64,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            timezone: "America/Argentina/Buenos_Aires".to_string(),
            sweep_interval_secs: 300,
        }
    }
}

impl App {
    pub fn timezone(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| format!("invalid timezone {}: {err}", self.timezone))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Database::Sqlite("chanchito.db".to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
    #[serde(default)]
    pub allowed_users: Vec<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub telegram: Option<Telegram>,
    pub interpreter: InterpreterConfig,
    pub llm: LlmConfig,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("CHANCHITO").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
