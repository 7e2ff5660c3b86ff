//! Configuration loading and resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument / environment variable (merged by the binary)
//! 2. TOML config file
//! 3. Compiled default
//!
//! A missing config file is not an error; the service starts on defaults.
//! A config file that exists but does not parse is.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ledger::TitleFormat;
use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TALLY_CONFIG";

/// Opaque platform identifier (channel, post)
///
/// Platforms hand these out as large integers; config files and gateways
/// write them either way, so both forms are accepted and kept as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawPlatformId", into = "String")]
pub struct PlatformId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPlatformId {
    Number(u64),
    Text(String),
}

impl From<RawPlatformId> for PlatformId {
    fn from(raw: RawPlatformId) -> Self {
        match raw {
            RawPlatformId::Number(n) => PlatformId(n.to_string()),
            RawPlatformId::Text(s) => PlatformId(s.trim().to_string()),
        }
    }
}

impl From<PlatformId> for String {
    fn from(id: PlatformId) -> String {
        id.0
    }
}

impl PlatformId {
    pub fn new(id: impl Into<String>) -> Self {
        PlatformId(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &str) -> bool {
        self.0 == other.trim()
    }
}

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "tally_bot=debug"
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// On-disk configuration; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub intake_channel_id: Option<PlatformId>,
    pub data_file: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub season_label: Option<String>,
    pub episode_marker: Option<String>,
    pub logging: LoggingConfig,
}

/// Values supplied on the command line or through `TALLY_*` variables
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub intake_channel_id: Option<String>,
    pub data_file: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub season_label: Option<String>,
    pub episode_marker: Option<String>,
    pub log_level: Option<String>,
}

/// Compiled defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub data_file: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub titles: TitleFormat,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            data_file: default_data_file(),
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            titles: TitleFormat::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub intake_channel_id: PlatformId,
    pub data_file: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub titles: TitleFormat,
    pub log_level: String,
}

impl Settings {
    /// Merge overrides, the optional file config and compiled defaults
    ///
    /// The intake channel has no default: without it no post could ever
    /// qualify, so its absence is a configuration error.
    pub fn resolve(overrides: ConfigOverrides, file: Option<TomlConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();
        let defaults = CompiledDefaults::for_current_platform();

        let intake_channel_id = overrides
            .intake_channel_id
            .map(PlatformId::new)
            .or(file.intake_channel_id)
            .filter(|id| !id.as_str().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "intake channel id is required (--intake-channel, TALLY_INTAKE_CHANNEL or intake_channel_id)"
                        .to_string(),
                )
            })?;

        let titles = TitleFormat::new(
            overrides
                .season_label
                .or(file.season_label)
                .unwrap_or(defaults.titles.season_label),
            overrides
                .episode_marker
                .or(file.episode_marker)
                .unwrap_or(defaults.titles.episode_marker),
        );
        if titles.episode_marker.trim().is_empty() {
            return Err(Error::Config("episode_marker must not be empty".to_string()));
        }

        Ok(Self {
            intake_channel_id,
            data_file: overrides.data_file.or(file.data_file).unwrap_or(defaults.data_file),
            bind_address: overrides
                .bind_address
                .or(file.bind_address)
                .unwrap_or(defaults.bind_address),
            port: overrides.port.or(file.port).unwrap_or(defaults.port),
            titles,
            log_level: overrides.log_level.unwrap_or(file.logging.level),
        })
    }
}

/// Locate the config file
///
/// Priority: explicit path, `TALLY_CONFIG`, user config dir, `/etc/tally`.
/// Explicit locations are returned even if they do not exist so the caller
/// can warn about them; discovered locations only if they exist.
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("tally").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/tally/config.toml");
    if cfg!(unix) && system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Read and parse a TOML config file
///
/// Returns `Ok(None)` (with a warning) when the file does not exist.
pub fn load_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(Error::Config(format!("Failed to read {}: {}", path.display(), e)));
        }
    };

    let config = toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    info!("Loaded configuration from {}", path.display());
    Ok(Some(config))
}

/// OS-dependent default location of the ledger document
pub fn default_data_file() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tally"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ratings.json")
}
