// src/config.rs
//
// Catalog configuration
//
// Stored as JSON next to the database. A missing file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::events::DEFAULT_LOG_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory under the platform data dir
    pub data_dir_name: String,
    pub database_file_name: String,
    pub pool_max_size: u32,
    pub busy_timeout_ms: u32,

    /// Year of the first component added to an empty series
    pub default_series_year: i32,

    /// `{}` is replaced by the season number
    pub season_title_template: String,
    pub season_original_title_template: String,

    /// Notifications kept for inspection, 0 keeps none
    pub event_log_capacity: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir_name: "cinecatalog".to_string(),
            database_file_name: "catalog.db".to_string(),
            pool_max_size: 15,
            busy_timeout_ms: 5000,
            default_series_year: 2000,
            season_title_template: "Season {}".to_string(),
            season_original_title_template: "Season {}".to_string(),
            event_log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl CatalogConfig {
    /// Read a configuration file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            log::debug!("[CONFIG] {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Directory holding the database, created on demand
    pub fn data_dir(&self) -> AppResult<PathBuf> {
        let base = dirs::data_dir()
            .ok_or_else(|| AppError::Other("Could not determine app data directory".to_string()))?;

        let dir = base.join(&self.data_dir_name);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Database file path: {DATA_DIR}/{data_dir_name}/{database_file_name}
    pub fn database_path(&self) -> AppResult<PathBuf> {
        Ok(self.data_dir()?.join(&self.database_file_name))
    }

    pub fn season_title(&self, number: usize) -> String {
        self.season_title_template.replace("{}", &number.to_string())
    }

    pub fn season_original_title(&self, number: usize) -> String {
        self.season_original_title_template
            .replace("{}", &number.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = CatalogConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, CatalogConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = CatalogConfig {
            default_series_year: 1987,
            season_title_template: "Staffel {}".to_string(),
            ..CatalogConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = CatalogConfig::load(&path).unwrap();
        assert_eq!(loaded.default_series_year, 1987);
        assert_eq!(loaded.season_title(3), "Staffel 3");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "pool_max_size": 4 }"#).unwrap();

        let config = CatalogConfig::load(&path).unwrap();
        assert_eq!(config.pool_max_size, 4);
        assert_eq!(config.database_file_name, "catalog.db");
        assert_eq!(config.event_log_capacity, DEFAULT_LOG_CAPACITY);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            CatalogConfig::load(&path),
            Err(AppError::Serialization(_))
        ));
    }
}
