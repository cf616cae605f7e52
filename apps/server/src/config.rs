//! # Server Configuration
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`INNKEEP_*`)
//! 2. Config file (`INNKEEP_CONFIG`, else `<config dir>/innkeep.toml`)
//! 3. Defaults (this file)
//!
//! Configuration is read once at startup and shared read-only.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use innkeep_db::DbConfig;
use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to listen on
    pub bind_addr: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// HS256 secret shared with the login service that issues tokens
    pub jwt_secret: String,

    /// Allow any origin. Development only.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let database_path = project_dirs()
            .map(|dirs| dirs.data_dir().join("innkeep.db"))
            .unwrap_or_else(|| PathBuf::from("./innkeep.db"));

        ServerConfig {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            database_path,
            max_connections: 5,
            jwt_secret: "innkeep-dev-secret-change-in-production".to_string(),
            cors_permissive: false,
        }
    }
}

impl ServerConfig {
    /// Loads defaults, then the config file if one exists, then `INNKEEP_*`
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("INNKEEP_CONFIG")
            .map(PathBuf::from)
            .or_else(|| project_dirs().map(|dirs| dirs.config_dir().join("innkeep.toml")));

        let config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => ServerConfig::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parses TOML; missing keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies `INNKEEP_*` overrides read through `lookup`.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(addr) = lookup("INNKEEP_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(port) = lookup("INNKEEP_PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue("INNKEEP_PORT".to_string()))?;
        }
        if let Some(path) = lookup("INNKEEP_DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(max) = lookup("INNKEEP_MAX_CONNECTIONS") {
            self.max_connections = max
                .parse()
                .map_err(|_| ConfigError::InvalidValue("INNKEEP_MAX_CONNECTIONS".to_string()))?;
        }
        if let Some(secret) = lookup("INNKEEP_JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(flag) = lookup("INNKEEP_CORS_PERMISSIVE") {
            self.cors_permissive = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }

        Ok(self)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("bind_addr".to_string()))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "innkeep", "innkeep")
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_toml_keeps_defaults_for_missing_keys() {
        let config = ServerConfig::from_toml("port = 9090\ncors_permissive = true\n").unwrap();
        assert_eq!(config.port, 9090);
        assert!(config.cors_permissive);
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [("INNKEEP_PORT", "7000"), ("INNKEEP_JWT_SECRET", "s3cret")]
            .into_iter()
            .collect();

        let config = ServerConfig::from_toml("port = 9090")
            .unwrap()
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.port, 7000);
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.socket_addr().unwrap().port(), 7000);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = ServerConfig::default()
            .apply_env(|key| (key == "INNKEEP_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
