//! Runtime configuration.
//!
//! # Responsibility
//! - Load settings from a JSON file or from `CREWBOARD_*` environment variables.
//! - Fill defaults for everything but the database path.
//!
//! # Invariants
//! - `db_path` is required and non-blank.
//! - Blank environment values count as unset.

use crate::binding::render::DEFAULT_EMBED_COLOR;
use crate::binding::BindingConfig;
use crate::logging::default_log_level;
use crate::model::ids::ChannelId;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "CREWBOARD_DB_PATH";
pub const ENV_LOG_DIR: &str = "CREWBOARD_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "CREWBOARD_LOG_LEVEL";
pub const ENV_PROJECTS_CATEGORY_ID: &str = "CREWBOARD_PROJECTS_CATEGORY_ID";
pub const ENV_EMBED_COLOR: &str = "CREWBOARD_EMBED_COLOR";

const DEFAULT_LOG_DIR_NAME: &str = "crewboard-logs";

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    InvalidValue { key: &'static str, value: String },
    Io { path: PathBuf, message: String },
    Parse(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required setting `{key}`"),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for `{key}`")
            }
            Self::Io { path, message } => {
                write!(f, "failed to read config `{}`: {message}", path.display())
            }
            Self::Parse(message) => write!(f, "invalid config JSON: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Settings shared by the CLI and embedding hosts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_level")]
    pub log_level: String,
    #[serde(default)]
    pub projects_category_id: Option<ChannelId>,
    #[serde(default = "default_embed_color")]
    pub embed_color: u32,
}

impl CoreConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validated()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = get(ENV_DB_PATH)
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing(ENV_DB_PATH))?;
        let projects_category_id = get(ENV_PROJECTS_CATEGORY_ID)
            .map(|value| {
                ChannelId::parse_mention(&value).map_err(|_| ConfigError::InvalidValue {
                    key: ENV_PROJECTS_CATEGORY_ID,
                    value,
                })
            })
            .transpose()?;
        let embed_color = get(ENV_EMBED_COLOR)
            .map(|value| parse_color(&value).ok_or(ConfigError::InvalidValue {
                key: ENV_EMBED_COLOR,
                value,
            }))
            .transpose()?
            .unwrap_or(DEFAULT_EMBED_COLOR);

        Self {
            db_path,
            log_dir: get(ENV_LOG_DIR).map_or_else(default_log_dir, PathBuf::from),
            log_level: get(ENV_LOG_LEVEL).unwrap_or_else(default_level),
            projects_category_id,
            embed_color,
        }
        .validated()
    }

    pub fn binding(&self) -> BindingConfig {
        BindingConfig {
            projects_category: self.projects_category_id,
            embed_color: self.embed_color,
        }
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Missing("db_path"));
        }
        if self.embed_color > 0xFF_FF_FF {
            return Err(ConfigError::InvalidValue {
                key: "embed_color",
                value: self.embed_color.to_string(),
            });
        }
        Ok(self)
    }
}

/// Decimal or `#RRGGBB`/`0xRRGGBB` hex.
fn parse_color(value: &str) -> Option<u32> {
    let hex = value
        .strip_prefix('#')
        .or_else(|| value.strip_prefix("0x"));
    match hex {
        Some(digits) => u32::from_str_radix(digits, 16).ok(),
        None => value.parse().ok(),
    }
}

fn default_log_dir() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME)
}

fn default_level() -> String {
    default_log_level().to_string()
}

fn default_embed_color() -> u32 {
    DEFAULT_EMBED_COLOR
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_DB_PATH, ENV_EMBED_COLOR, ENV_PROJECTS_CATEGORY_ID};
    use crate::model::ids::ChannelId;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn env_lookup_requires_db_path() {
        let err = CoreConfig::from_lookup(lookup(&[(ENV_DB_PATH, "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_DB_PATH)));
    }

    #[test]
    fn env_lookup_parses_category_and_hex_color() {
        let config = CoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/var/lib/crewboard.db"),
            (ENV_PROJECTS_CATEGORY_ID, "<#4242>"),
            (ENV_EMBED_COLOR, "#47CDFF"),
        ]))
        .unwrap();
        assert_eq!(config.projects_category_id, Some(ChannelId(4242)));
        assert_eq!(config.embed_color, 0x47CDFF);
        assert_eq!(config.binding().projects_category, Some(ChannelId(4242)));
    }

    #[test]
    fn json_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"db_path": "/tmp/crewboard.db"}}"#).unwrap();

        let config = CoreConfig::load(file.path()).unwrap();
        assert_eq!(config.embed_color, 4_705_791);
        assert!(config.projects_category_id.is_none());
        assert!(CoreConfig::from_json_str(r#"{"db_path": "x", "bogus": 1}"#).is_err());
    }
}
