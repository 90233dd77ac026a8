use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use seedbank_client::ClientConfig;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 443;

pub const ENV_HOST: &str = "SEEDBANK_HOST";
pub const ENV_PORT: &str = "SEEDBANK_PORT";
pub const ENV_API_KEY: &str = "SEEDBANK_API_KEY";
pub const ENV_VERIFY_KEY: &str = "SEEDBANK_VERIFY_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
}

/// Connection settings for the seed bank.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    /// PEM file holding the bank's credential-signing public key.
    pub verify_key: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    host: Option<String>,
    port: Option<u16>,
    api_key: Option<String>,
    verify_key: Option<PathBuf>,
}

impl Config {
    /// Read `path` (if it exists), then let `SEEDBANK_*` environment variables override it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    target: "seedbank::config",
                    path = %path.display(),
                    "config file not found; relying on environment"
                );
                RawConfig::default()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::resolve(raw, |name| std::env::var(name).ok())
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::resolve(toml::from_str(text)?, |_| None)
    }

    fn resolve(
        mut raw: RawConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env = |name: &str| env(name).filter(|value| !value.trim().is_empty());
        if let Some(host) = env(ENV_HOST) {
            raw.host = Some(host);
        }
        if let Some(port) = env(ENV_PORT) {
            let port = port.trim().parse().map_err(|err| ConfigError::Invalid {
                name: ENV_PORT,
                reason: format!("{err}"),
            })?;
            raw.port = Some(port);
        }
        if let Some(api_key) = env(ENV_API_KEY) {
            raw.api_key = Some(api_key);
        }
        if let Some(path) = env(ENV_VERIFY_KEY) {
            raw.verify_key = Some(PathBuf::from(path));
        }

        let host = raw
            .host
            .filter(|host| !host.trim().is_empty())
            .ok_or(ConfigError::Missing("host"))?;
        let port = raw.port.unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(ConfigError::Invalid {
                name: "port",
                reason: "must be non-zero".into(),
            });
        }
        let api_key = raw
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("api_key"))?;
        let verify_key = raw.verify_key.ok_or(ConfigError::Missing("verify_key"))?;

        Ok(Self {
            host,
            port,
            api_key,
            verify_key,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.host.clone(), self.port, self.api_key.clone())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .field("verify_key", &self.verify_key)
            .finish()
    }
}
