//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Ledger runtime settings.
    #[serde(default)]
    pub ledger: LedgerSettings,
}

/// Ledger runtime settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerSettings {
    /// Description template used for monthly batch transactions.
    #[serde(default = "default_batch_description")]
    pub monthly_batch_description: String,
    /// Prefix for cache invalidation patterns.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,
    /// Whether lifecycle transitions emit notifications.
    #[serde(default = "default_notify")]
    pub notifications_enabled: bool,
}

fn default_batch_description() -> String {
    "Monthly rent".to_string()
}

fn default_cache_prefix() -> String {
    "ledger".to_string()
}

fn default_notify() -> bool {
    true
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            monthly_batch_description: default_batch_description(),
            cache_prefix: default_cache_prefix(),
            notifications_enabled: default_notify(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("QUADRA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
