use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod registry;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use registry::{SettingSlot, SettingsRegistry, Versioned};
pub use settings::{
    AppConfig, DatabaseSettings, FormulaPreset, LoggingSettings, RecalculationSettings,
    ServerSettings,
};

/// Prefix of environment variables overriding file settings, e.g.
/// `ABATEDOURO__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "ABATEDOURO";

/// Loads the application configuration.
///
/// Reads `path` when it exists (a missing file is not an error), overlays
/// `ABATEDOURO__*` environment variables, falls back to `DATABASE_URL` for the
/// database connection string, and validates the result.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config = builder.try_deserialize::<AppConfig>()?;

    if config.database.url.is_none() {
        config.database.url = std::env::var("DATABASE_URL").ok();
    }

    config.validate()?;
    Ok(config)
}

impl AppConfig {
    /// Checks cross-field rules that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be greater than zero".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        if self.recalculation.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "recalculation.concurrency must be greater than zero".to_string(),
            ));
        }
        if let Some(limits) = &self.limits {
            limits
                .validate()
                .map_err(|e| ConfigError::ValidationError(format!("limits: {e}")))?;
        }
        if let Some(expenses) = &self.default_expenses {
            expenses
                .validate()
                .map_err(|e| ConfigError::ValidationError(format!("default_expenses: {e}")))?;
        }
        Ok(())
    }
}
