//! Configuration management
//!
//! Everything persistent lives in one TOML file, `~/.querybook/config.toml`:
//! the active connection, settings, and per-connection saved queries.

pub mod connections;
pub mod library;
pub mod settings;

pub use connections::{ConnectionConfig, Endpoint, SslMode};
pub use library::{FileLibrary, InMemoryLibrary, QueryLibrary, SavedQuery, Selector};
pub use settings::Settings;

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.querybook/)
pub fn config_dir() -> ConfigResult<PathBuf> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".querybook"))
}

/// Get the config file path
pub fn config_file() -> ConfigResult<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// On-disk configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Connection used when none is named on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,

    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

impl ConfigFile {
    /// Load from the default location; a missing file yields defaults
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&config_file()?)
    }

    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)?;
        Ok(file)
    }

    /// Write atomically: temp file in the same directory, then rename
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)?;
        let content = toml::to_string_pretty(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(path).map_err(|e| ConfigError::Io(e.error))?;
        Ok(())
    }

    /// Find a connection by name
    pub fn connection(&self, name: &str) -> ConfigResult<&ConnectionConfig> {
        self.connections
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))
    }

    /// Pick the connection to use: the named one, else `current`, else the only one
    pub fn resolve_connection(&self, name: Option<&str>) -> ConfigResult<&ConnectionConfig> {
        if let Some(name) = name.or(self.current.as_deref()) {
            return self.connection(name);
        }
        match self.connections.as_slice() {
            [only] => Ok(only),
            [] => Err(ConfigError::NotFound(
                "no connections configured; pass --url".into(),
            )),
            _ => Err(ConfigError::Invalid(
                "several connections configured; pick one with -c".into(),
            )),
        }
    }
}
