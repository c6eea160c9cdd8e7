//! # Natlabb Configuration System
//!
//! Hierarchical configuration for the emulation-job execution layer.
//!
//! ## Features
//! - **Unified Configuration**: single source of truth for broker, worker,
//!   and telemetry settings
//! - **Validation**: runtime validation of endpoints, queue names, and
//!   probability ranges
//! - **Environment Awareness**: `NATLABB_*` variables override file values

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod broker;
mod error;
mod telemetry;
mod validation;
mod worker;

pub use broker::BrokerConfig;
pub use error::ConfigError;
pub use telemetry::TelemetryConfig;
pub use worker::EngineConfig;
pub use worker::WorkerConfig;

/// Top-level configuration container for the job layer.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct NatlabbConfig {
    /// Broker connection and queue-fleet settings.
    #[validate(nested)]
    pub broker: BrokerConfig,

    /// Worker pool and reference-engine settings.
    #[validate(nested)]
    pub worker: WorkerConfig,

    /// Telemetry and observability settings.
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl NatlabbConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/natlabb.yaml` - base settings. If missing, defaults are used.
    /// 3. `config/<environment>.yaml` - environment-specific overrides.
    /// 4. `NATLABB_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(NatlabbConfig::default()));

        if Path::new("config/natlabb.yaml").exists() {
            figment = figment.merge(Yaml::file("config/natlabb.yaml"));
        }

        let env = std::env::var("NATLABB_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        figment
            .merge(Env::prefixed("NATLABB_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Load configuration from a specific path for testing/validation.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(
                path.to_string_lossy().to_string(),
            )));
        }

        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("NATLABB_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}
