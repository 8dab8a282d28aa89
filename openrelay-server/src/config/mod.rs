//! Configuration for openrelay-server.
//!
//! Handles loading configuration from the TOML file, CLI arguments, and
//! environment variables, and turning it into runtime wiring (pools,
//! directories, pipeline tuning).

pub mod file;
pub mod runtime;

pub use file::FileConfig;
pub use runtime::{build_directories, build_pool_map, build_pools, RelayTuning};

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0} environment variable not set")]
    MissingEnv(&'static str),
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read the TOML file, apply CLI overrides, and validate.
    pub fn load(&self) -> Result<FileConfig, ConfigError> {
        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: FileConfig = toml::from_str(&content)?;

        if let Some(listen) = self.listen_override {
            config.server.listen = listen;
        }

        self.validate(&config)?;
        Ok(config)
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let mut names = std::collections::HashSet::new();
        for pool in &config.pools {
            if pool.name.is_empty() {
                return Err(ConfigError::Validation("pool name must not be empty".into()));
            }
            if !names.insert(pool.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate pool name: {}",
                    pool.name
                )));
            }
        }
        Ok(())
    }
}

/// Build the Postgres connection string from the environment.
///
/// Reads `POSTGRES_HOST`, `POSTGRES_USER`, and `POSTGRES_PASSWORD`; the
/// password may be empty for trust-authenticated local databases.
pub fn get_database_url() -> Result<String, ConfigError> {
    let host =
        std::env::var("POSTGRES_HOST").map_err(|_| ConfigError::MissingEnv("POSTGRES_HOST"))?;
    let user =
        std::env::var("POSTGRES_USER").map_err(|_| ConfigError::MissingEnv("POSTGRES_USER"))?;
    let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_default();
    Ok(format!("postgres://{user}:{password}@{host}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_pool_names_are_rejected() {
        let loader = ConfigLoader::new("unused.toml", None);
        let config: FileConfig = toml::from_str(
            r#"
[[pools]]
name = "premium"

[[pools]]
name = "premium"
"#,
        )
        .unwrap();
        assert!(matches!(
            loader.validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
