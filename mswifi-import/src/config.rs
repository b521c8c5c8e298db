use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::importer::CollisionPolicy;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "mswifi-import.toml";

/// Tool settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name of the group that receives imported profiles.
    pub group: String,
    pub create_group: bool,
    pub on_collision: CollisionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        fallback_config()
    }
}

/// Built-in settings, read from the embedded `config/default.toml`.
pub fn default_config() -> Config {
    let embedded = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml"));
    parse_config(embedded, "embedded config".to_string()).unwrap_or_else(|_| fallback_config())
}

/// Errors returned when loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Load a config file. Keys it leaves out keep their defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&raw, path.display().to_string())
}

/// Load `path` if given, else [`DEFAULT_CONFIG_FILE`] if present, else the
/// defaults.
pub fn resolve_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let local = Path::new(DEFAULT_CONFIG_FILE);
            if local.is_file() {
                load_config(local)
            } else {
                Ok(default_config())
            }
        }
    }
}

fn parse_config(raw: &str, path: String) -> Result<Config, ConfigError> {
    toml::from_str(raw).map_err(|source| ConfigError::Parse { path, source })
}

fn fallback_config() -> Config {
    Config {
        group: "WLan".to_string(),
        create_group: true,
        on_collision: CollisionPolicy::AskUser,
    }
}
