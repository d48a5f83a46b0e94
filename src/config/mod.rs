//! Service configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file
//! (`tickefic.toml` in the working directory or the path given with
//! `--config`), then `TICKEFIC__SECTION__KEY` environment variables.

use crate::error::Result;
use ::config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "tickefic.toml";
const ENV_PREFIX: &str = "TICKEFIC";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub rest: RestSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// YAML snapshot; `None` keeps everything in memory
    pub data_file: Option<PathBuf>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_file: ProjectDirs::from("org", "tickefic", "tickefic")
                .map(|dirs| dirs.data_dir().join("tickefic.yaml")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestSettings {
    /// Path prefix of the REST surface
    pub prefix: String,
    /// Namespace of the session routes
    pub namespace: String,
}

impl Default for RestSettings {
    fn default() -> Self {
        Self {
            prefix: "wp-json".to_string(),
            namespace: "tickefic/v1".to_string(),
        }
    }
}

impl RestSettings {
    /// `/wp-json/`, the base URL handed to the dashboard
    #[must_use]
    pub fn base_path(&self) -> String {
        format!("/{}/", self.prefix.trim_matches('/'))
    }

    /// Absolute path of `route` within the REST surface
    #[must_use]
    pub fn route(&self, route: &str) -> String {
        format!("{}{}", self.base_path(), route.trim_start_matches('/'))
    }

    #[must_use]
    pub fn namespaced(&self, route: &str) -> String {
        self.route(&format!(
            "{}/{}",
            self.namespace.trim_matches('/'),
            route.trim_start_matches('/')
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub cookie_name: String,
    /// Lifetime of a remembered login
    pub remember_days: i64,
    pub nonce_lifetime_secs: u64,
    /// Nonce signing key; a random key is drawn at startup when unset
    pub secret: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: "tickefic_logged_in".to_string(),
            remember_days: 14,
            nonce_lifetime_secs: 86_400,
            secret: None,
        }
    }
}

impl Settings {
    /// Load settings, reading `path` if given or `tickefic.toml` if present
    ///
    /// An explicitly given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings: Self = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        debug!(server = ?settings.server, data_file = ?settings.storage.data_file, "settings loaded");
        Ok(settings)
    }

    /// Address the server binds to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| {
                crate::error::TickeficError::invalid_param(
                    "server.host",
                    format!("'{}' is not a valid listen address: {e}", self.server.host),
                )
            })
    }

    /// Nonce signing key, drawing a random one when none is configured
    #[must_use]
    pub fn nonce_secret(&self) -> String {
        self.session
            .secret
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.session.remember_days, 14);
        assert_eq!(settings.rest.base_path(), "/wp-json/");
        assert_eq!(settings.rest.namespaced("login"), "/wp-json/tickefic/v1/login");
        assert_eq!(
            settings.rest.route("wp/v2/tickefic/tickets"),
            "/wp-json/wp/v2/tickefic/tickets"
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tickefic.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9090\n\n[session]\nsecret = \"s3cret\"\n\n[storage]\ndata_file = \"/tmp/t.yaml\"\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.nonce_secret(), "s3cret");
        assert_eq!(settings.storage.data_file, Some(PathBuf::from("/tmp/t.yaml")));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = Settings::load(Some(&temp_dir.path().join("absent.toml")));
        assert!(result.unwrap_err().is_config_error());
    }

    #[test]
    fn test_random_secret_when_unset() {
        let settings = Settings::default();
        assert_ne!(settings.nonce_secret(), settings.nonce_secret());
    }

    #[test]
    fn test_bind_addr() {
        let mut settings = Settings::default();
        assert_eq!(settings.bind_addr().unwrap().port(), 8080);
        settings.server.host = "not a host".to_string();
        assert!(settings.bind_addr().is_err());
    }
}
