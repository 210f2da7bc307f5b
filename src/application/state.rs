// src/application/state.rs

use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::config::CatalogConfig;
use crate::db::{
    create_connection_pool, create_memory_pool, create_pool_at, initialize_database,
    verify_database_integrity, ConnectionPool,
};
use crate::domain::Catalog;
use crate::error::AppResult;
use crate::events::EventBus;
use crate::repositories::{
    FranchiseRepository, SeriesRepository, SqliteFranchiseRepository, SqliteSeriesRepository,
};
use crate::services::{FranchiseService, SeriesService};

/// Application state shared by every command.
/// All fields are Arc-wrapped for thread-safe sharing across commands.
pub struct AppState {
    pub config: CatalogConfig,
    pub event_bus: Arc<EventBus>,
    pub catalog: Arc<RwLock<Catalog>>,
    pub franchise_service: Arc<FranchiseService>,
    pub series_service: Arc<SeriesService>,
}

impl AppState {
    /// Open the on-disk catalog described by `config`
    pub fn initialize(config: CatalogConfig) -> AppResult<Self> {
        let pool = create_connection_pool(&config)?;
        Self::with_pool(config, pool)
    }

    /// Open a catalog stored at an explicit database path
    pub fn open_at(config: CatalogConfig, db_path: &Path) -> AppResult<Self> {
        let pool = create_pool_at(db_path, &config)?;
        Self::with_pool(config, pool)
    }

    /// Throwaway catalog backed by an in-memory database
    pub fn in_memory(config: CatalogConfig) -> AppResult<Self> {
        let pool = create_memory_pool()?;
        Self::with_pool(config, pool)
    }

    fn with_pool(config: CatalogConfig, pool: ConnectionPool) -> AppResult<Self> {
        // 1. INFRASTRUCTURE
        let pool = Arc::new(pool);
        let event_bus = Arc::new(EventBus::with_log_capacity(config.event_log_capacity));
        let catalog = Arc::new(RwLock::new(Catalog::new()));

        // Initialize schema (idempotent)
        {
            let conn = pool.get()?;
            initialize_database(&conn)?;
            verify_database_integrity(&conn)?;
        }

        // 2. REPOSITORIES
        let franchise_repo: Arc<dyn FranchiseRepository> =
            Arc::new(SqliteFranchiseRepository::new(pool.clone()));
        let series_repo: Arc<dyn SeriesRepository> =
            Arc::new(SqliteSeriesRepository::new(pool.clone()));

        // 3. SERVICES
        let franchise_service = Arc::new(FranchiseService::new(
            franchise_repo,
            catalog.clone(),
            event_bus.clone(),
        ));
        let series_service = Arc::new(SeriesService::new(
            series_repo,
            catalog.clone(),
            event_bus.clone(),
            config.clone(),
        ));

        log::info!("[CATALOG] Application state ready");

        Ok(Self {
            config,
            event_bus,
            catalog,
            franchise_service,
            series_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_catalog_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        let franchise_id = {
            let state = AppState::open_at(CatalogConfig::default(), &path).unwrap();
            state
                .franchise_service
                .create_franchise("Mission: Impossible".to_string())
                .unwrap()
        };

        let state = AppState::open_at(CatalogConfig::default(), &path).unwrap();
        assert_eq!(state.franchise_service.load_tree(franchise_id).unwrap(), franchise_id);
        assert_eq!(
            state.franchise_service.get_franchise(franchise_id).unwrap().title,
            "Mission: Impossible"
        );
    }

    #[test]
    fn test_services_share_one_catalog() {
        let state = AppState::in_memory(CatalogConfig::default()).unwrap();
        let series_id = state.series_service.create_series("Sherlock".to_string()).unwrap();

        assert!(state.catalog.read().unwrap().series(series_id).is_ok());
    }

    #[test]
    fn test_event_log_capacity_comes_from_config() {
        let config = CatalogConfig {
            event_log_capacity: 0,
            ..CatalogConfig::default()
        };
        let state = AppState::in_memory(config).unwrap();
        state.series_service.create_series("Shogun".to_string()).unwrap();

        assert!(state.event_bus.get_event_log().is_empty());
    }
}
