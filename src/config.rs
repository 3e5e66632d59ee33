//! Configuration loading and management
//!
//! Handles parsing of `taskboard.toml` configuration files.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default file name looked up when no `--config` is given
pub const CONFIG_FILE_NAME: &str = "taskboard.toml";

/// File name of the task store inside the data directory
pub const STORE_FILE_NAME: &str = "tasks.json";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Task storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3333
}

fn default_body_limit_bytes() -> usize {
    10 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which repository backs the board
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

/// Task storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Task file location; the platform data directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Location of the JSON task file.
    pub fn resolve_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        ProjectDirs::from("", "", "taskboard")
            .map(|dirs| dirs.data_dir().join(STORE_FILE_NAME))
            .ok_or_else(|| {
                Error::InvalidConfig(
                    "storage.path is unset and no home directory was found".to_string(),
                )
            })
    }
}

impl Config {
    /// Load configuration from a `taskboard.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config");
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    #[cfg(test)]
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "server.host cannot be empty".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(Error::InvalidConfig("server.port must be > 0".to_string()));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(Error::InvalidConfig(
                "server.body_limit_bytes must be > 0".to_string(),
            ));
        }
        if let Some(path) = &self.storage.path {
            if path.as_os_str().is_empty() {
                return Err(Error::InvalidConfig(
                    "storage.path cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 3333);
        assert_eq!(cfg.server.body_limit_bytes, 10240);
        assert_eq!(cfg.server.bind_address(), "127.0.0.1:3333");
        assert_eq!(cfg.storage.backend, StorageBackend::File);
        assert!(cfg.storage.path.is_none());
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        let content = r#"
[server]
host = "0.0.0.0"
port = 8080

[storage]
backend = "memory"
path = "/srv/board/tasks.json"
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.body_limit_bytes, 10240);
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(
            cfg.storage.resolve_path().expect("path"),
            PathBuf::from("/srv/board/tasks.json")
        );
    }

    #[test]
    fn invalid_server_config_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[server]\nport = 0").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            Error::InvalidConfig(message) => assert!(message.contains("server.port")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_backend_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[storage]\nbackend = \"postgres\"").expect("write config");

        let err = Config::load(&path).expect_err("invalid backend");
        assert!(matches!(err, Error::TomlParse(_)));
    }

    #[test]
    fn load_or_default_when_missing_or_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert_eq!(Config::load_or_default(&path), Config::default());

        fs::write(&path, "[server]\nhost = \"\"").expect("write config");
        assert_eq!(Config::load_or_default(&path), Config::default());

        fs::write(&path, "[server]\nport = 4000").expect("write config");
        assert_eq!(Config::load_or_default(&path).server.port, 4000);
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        let cfg = Config::default();
        cfg.save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("port = 3333"));
        assert!(written.contains("backend = \"file\""));
        assert_eq!(Config::load(&path).expect("reload"), cfg);
    }
}
