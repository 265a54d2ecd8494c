//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! an optional TOML file and `DOCHUB__*` environment variables. Each
//! sub-module represents a logical configuration section; every field has a
//! default so an empty source yields a usable configuration.

pub mod client;
pub mod logging;
pub mod session;
pub mod tree;

use serde::{Deserialize, Serialize};

use self::client::ClientConfig;
use self::logging::LoggingConfig;
use self::session::SessionConfig;
use self::tree::{BreadcrumbConfig, FeedConfig, PrefetchConfig};

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend HTTP client settings.
    pub client: ClientConfig,
    /// Persisted session settings.
    pub session: SessionConfig,
    /// Folder fan-out bounds.
    pub prefetch: PrefetchConfig,
    /// Recent-activity feed settings.
    pub feed: FeedConfig,
    /// Breadcrumb resolution settings.
    pub breadcrumb: BreadcrumbConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges `config/default` (if present), the optional file at `path`,
    /// and environment variables prefixed with `DOCHUB` using `__` as the
    /// section separator (e.g. `DOCHUB__CLIENT__BASE_URL`).
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("DOCHUB")
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
