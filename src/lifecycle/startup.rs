//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: a config that does not load or validate aborts startup
//! - Environment overrides are applied after the file is parsed

use std::path::Path;

use thiserror::Error;

use crate::config::{load_config, ConfigError, ToonConfig};
use crate::observability::{logging, metrics};

/// Environment variable selecting the deployment environment.
pub const TOON_ENV: &str = "TOON_ENV";

/// Errors that stop the binaries.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("metrics error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid address {0:?}")]
    Address(String),

    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Load the config file if one is given, otherwise use defaults.
pub fn load_startup_config(path: Option<&Path>) -> Result<ToonConfig, ServerError> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => ToonConfig::default(),
    };
    let env = std::env::var(TOON_ENV).ok();
    Ok(apply_environment(config, env.as_deref()))
}

/// `TOON_ENV=production` turns on production mode.
pub fn apply_environment(mut config: ToonConfig, toon_env: Option<&str>) -> ToonConfig {
    if toon_env.is_some_and(|env| env.eq_ignore_ascii_case("production")) {
        config.toon.production = true;
    }
    config
}

/// Initialize tracing and, when enabled, the metrics exporter.
pub fn init_observability(config: &ToonConfig) -> Result<(), ServerError> {
    logging::init_tracing(Some(&config.observability.log_level));

    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| ServerError::Address(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }
    Ok(())
}
