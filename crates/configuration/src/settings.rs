use analytics::FormulaVariant;
use core_types::{FixedExpenses, ProcessingLimits};
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section is optional in `config.toml`; missing sections fall back to their
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    /// Formula conventions used whenever metrics are (re)computed.
    pub formula: FormulaVariant,
    pub recalculation: RecalculationSettings,
    /// Seed for the default-expenses setting.
    pub default_expenses: Option<FixedExpenses>,
    /// Seed for the processing-limits setting.
    pub limits: Option<ProcessingLimits>,
}

/// Parameters for the HTTP API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. Empty means any origin.
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            body_limit_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Parameters for the PostgreSQL connection pool.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Connection string. When absent, `DATABASE_URL` is used.
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, e.g. "info" or "web_server=debug,info".
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "abatedouro.log".to_string(),
        }
    }
}

/// Parameters for batch recomputation of stored metrics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecalculationSettings {
    /// Records recomputed in parallel.
    pub concurrency: usize,
}

impl Default for RecalculationSettings {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

/// Named formula presets, selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum FormulaPreset {
    Canonical,
    Legacy,
}

impl FormulaPreset {
    pub fn variant(self) -> FormulaVariant {
        match self {
            FormulaPreset::Canonical => FormulaVariant::canonical(),
            FormulaPreset::Legacy => FormulaVariant::legacy(),
        }
    }
}
