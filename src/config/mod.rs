use serde::{Deserialize, Serialize};

use crate::errors::{CatalogError, CatalogResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
}

/// Policy knobs for the fetch engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Records requested per page when the caller does not say otherwise
    pub default_page_size: usize,
    /// Ceiling on records retrievable by walking one query's cursors.
    /// Policy constant bounding pathological memory growth, not a
    /// protocol rule.
    pub max_total_records: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_total_records: 300,
        }
    }
}

impl Config {
    pub fn load() -> CatalogResult<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(&config_file)
                .map_err(|e| CatalogError::configuration(e.to_string()))?;
            toml::from_str(&contents).map_err(|e| CatalogError::configuration(e.to_string()))
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)
                .map_err(|e| CatalogError::configuration(e.to_string()))?;
            std::fs::write(&config_file, contents)
                .map_err(|e| CatalogError::configuration(e.to_string()))?;
            Ok(default_config)
        }
    }
}

/// Read-only per-session snapshot of app-wide state.
///
/// Captured once at session creation and injected explicitly, in place
/// of the ambient signed-in-user globals the UI layer keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: String,
    pub display_name: String,
}

impl SessionContext {
    pub fn new<U: Into<String>, D: Into<String>>(user_id: U, display_name: D) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}
