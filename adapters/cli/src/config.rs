use std::{
    fs,
    path::{Path, PathBuf},
};

use deck_tally_persistence::{SchemaPolicy, STORAGE_KEY};
use serde::Deserialize;

const APP_DIR: &str = "deck-tally";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_LEVEL_MAX: u32 = 15;

/// Settings read from the optional TOML configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TallyConfig {
    pub(crate) storage: StorageConfig,
    pub(crate) persistence: PersistenceConfig,
    pub(crate) display: DisplayConfig,
}

/// Where the tally is stored.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct StorageConfig {
    /// Directory holding the store files. Defaults to the platform data directory.
    pub(crate) dir: Option<PathBuf>,
    /// Key under which the aggregate is written.
    pub(crate) key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            key: STORAGE_KEY.to_owned(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PersistenceConfig {
    /// Reject stored payloads that lack the modifier field.
    pub(crate) require_modifier_field: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DisplayConfig {
    /// Highest level reachable with `level-up`.
    pub(crate) level_max: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            level_max: DEFAULT_LEVEL_MAX,
        }
    }
}

impl TallyConfig {
    /// Loads the configuration, falling back to defaults when it is absent or invalid.
    pub(crate) fn load(explicit: Option<&Path>) -> Self {
        let Some(path) = explicit.map(Path::to_path_buf).or_else(default_config_path) else {
            return Self::default();
        };
        if !path.exists() {
            if explicit.is_some() {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
            }
            return Self::default();
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "failed to read config");
                return Self::default();
            }
        };

        match Self::parse(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "failed to parse config");
                Self::default()
            }
        }
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub(crate) fn schema_policy(&self) -> SchemaPolicy {
        if self.persistence.require_modifier_field {
            SchemaPolicy::Strict
        } else {
            SchemaPolicy::Lenient
        }
    }

    pub(crate) fn storage_dir(&self) -> Option<PathBuf> {
        self.storage
            .dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR)))
    }

    pub(crate) fn level_max(&self) -> u32 {
        self.display.level_max.max(1)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}
