//! Registry bootstrap settings: naming overrides applied by `MetadataRegistry::from_config`.

use crate::error::ConfigError;
use crate::naming::DEFAULT_DATABASE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_database")]
    pub default_database: String,
    /// Entity type -> table name.
    #[serde(default)]
    pub tables: BTreeMap<String, String>,
    /// Entity type -> database name.
    #[serde(default)]
    pub databases: BTreeMap<String, String>,
    /// Entity type -> record display name.
    #[serde(default)]
    pub display_names: BTreeMap<String, String>,
    /// Entity type -> column -> column display name.
    #[serde(default)]
    pub column_display_names: BTreeMap<String, BTreeMap<String, String>>,
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            default_database: default_database(),
            tables: BTreeMap::new(),
            databases: BTreeMap::new(),
            display_names: BTreeMap::new(),
            column_display_names: BTreeMap::new(),
        }
    }
}

pub fn load_registry_config_from_str(json: &str) -> Result<RegistryConfig, ConfigError> {
    let config: RegistryConfig = serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))?;
    if config.default_database.trim().is_empty() {
        return Err(ConfigError::Validation("default_database must not be empty".into()));
    }
    Ok(config)
}

pub fn load_registry_config_from_path(path: impl AsRef<Path>) -> Result<RegistryConfig, ConfigError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    load_registry_config_from_str(&json)
}
