use crate::{KoboldError, OptionsOverride};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "kobold.toml";

/// Nesting depth at which a comparison gives up.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Comparator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparatorConfig {
    /// Maximum nesting depth of expected/actual structures
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Options applied beneath every comparison unless overridden
    #[serde(default)]
    pub defaults: OptionsOverride,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            defaults: OptionsOverride::default(),
        }
    }
}

impl ComparatorConfig {
    pub fn from_toml_str(data: &str) -> Result<Self, KoboldError> {
        toml::from_str(data).map_err(|e| KoboldError::Serialization(e.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ComparatorConfig,
    pub path: PathBuf,
    pub exists: bool,
    pub portable: bool,
}

/// Load the configuration from `explicit`, or from the resolved default
/// location. A missing file yields the defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, KoboldError> {
    let (path, portable) = match explicit {
        Some(path) => (path.to_path_buf(), false),
        None => resolve_config_path()?,
    };
    let exists = path.exists();

    let config = if exists {
        let data = fs::read_to_string(&path)?;
        ComparatorConfig::from_toml_str(&data)?
    } else {
        ComparatorConfig::default()
    };

    Ok(LoadedConfig {
        config,
        path,
        exists,
        portable,
    })
}

pub fn ensure_config(explicit: Option<&Path>) -> Result<LoadedConfig, KoboldError> {
    let loaded = load_config(explicit)?;
    if !loaded.exists {
        save_config(&loaded.path, &loaded.config)?;
    }
    Ok(loaded)
}

pub fn save_config(path: &Path, config: &ComparatorConfig) -> Result<(), KoboldError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| KoboldError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

fn resolve_config_path() -> Result<(PathBuf, bool), KoboldError> {
    if let Some(portable_path) = portable_config_path() {
        if portable_path.exists() {
            return Ok((portable_path, true));
        }
    }

    let dirs = ProjectDirs::from("", "kobold", "kobold")
        .ok_or_else(|| KoboldError::Config("Unable to determine config directory".to_string()))?;
    Ok((dirs.config_dir().join(CONFIG_FILE_NAME), false))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}
