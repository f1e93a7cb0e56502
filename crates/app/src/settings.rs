//! Settings for the application.
//!
//! Read from an optional `fintrack.toml` (or the file passed with `--config`),
//! then overridden by `FINTRACK_*` environment variables, e.g.
//! `FINTRACK_APP__LEVEL=debug` or `FINTRACK_DATABASE__SQLITE=/tmp/ledger.db`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "fintrack";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Where the ledger is stored.
///
/// ```toml
/// database = "memory"
/// # or
/// [database]
/// sqlite = "fintrack.db"
/// ```
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("fintrack.db".to_string())
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
}

impl Settings {
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(false))
            .add_source(Environment::with_prefix("FINTRACK").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Filter directives for the tracing subscriber.
    pub fn log_filter(&self) -> String {
        format!(
            "fintrack={level},engine={level},migration={level}",
            level = self.app.level
        )
    }
}
