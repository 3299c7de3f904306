//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod cleanup;
pub mod limits;
pub mod logging;
pub mod queue;
pub mod remover;
pub mod server;
pub mod storage;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::cleanup::CleanupConfig;
pub use self::limits::LimitsConfig;
pub use self::logging::LoggingConfig;
pub use self::queue::QueueConfig;
pub use self::remover::RemoverConfig;
pub use self::server::ServerConfig;
pub use self::storage::StorageConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Submission and rate limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Durable queue settings.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Object storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Periodic cleanup settings.
    #[serde(default)]
    pub cleanup: CleanupConfig,
    /// Background-remover capability settings.
    #[serde(default)]
    pub remover: RemoverConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `CUTOUT`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CUTOUT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            limits: LimitsConfig::default(),
            queue: QueueConfig::default(),
            storage: StorageConfig::default(),
            worker: WorkerConfig::default(),
            cleanup: CleanupConfig::default(),
            remover: RemoverConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
