// src/db/connection.rs
//
// Database connection management
//
// PRINCIPLES:
// - Explicit connection pooling
// - No hidden connection creation
// - Clear error propagation

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::config::CatalogConfig;
use crate::error::{AppError, AppResult};

/// Type alias for connection pool
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled connection
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Create a connection pool on the configured database file
pub fn create_connection_pool(config: &CatalogConfig) -> AppResult<ConnectionPool> {
    let db_path = config.database_path()?;
    create_pool_at(&db_path, config)
}

/// Create a connection pool on an explicit database file
///
/// - WAL mode
/// - Foreign keys enabled
/// - Busy timeout from the configuration
pub fn create_pool_at(db_path: &Path, config: &CatalogConfig) -> AppResult<ConnectionPool> {
    let busy_timeout = config.busy_timeout_ms;
    let manager = SqliteConnectionManager::file(db_path).with_init(move |conn| {
        conn.execute_batch(&format!(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = {};",
            busy_timeout
        ))?;
        Ok(())
    });

    let pool = Pool::builder()
        .max_size(config.pool_max_size)
        .build(manager)
        .map_err(|e| AppError::Pool(format!("Failed to create connection pool: {}", e)))?;

    log::info!("[DB] Opened {}", db_path.display());
    Ok(pool)
}

/// Single-connection pool over an in-memory database
///
/// Every in-memory connection is its own database, so the pool is capped at one.
pub fn create_memory_pool() -> AppResult<ConnectionPool> {
    let manager = SqliteConnectionManager::memory().with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    });

    Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| AppError::Pool(format!("Failed to create memory pool: {}", e)))
}

/// Get a connection from the pool
pub fn get_connection(pool: &ConnectionPool) -> AppResult<PooledConn> {
    pool.get()
        .map_err(|e| AppError::Pool(format!("Failed to get database connection: {}", e)))
}

/// Create a standalone in-memory connection (for testing)
pub fn create_test_connection() -> AppResult<Connection> {
    let conn = Connection::open_in_memory().map_err(AppError::Database)?;

    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(AppError::Database)?;

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_pool_creation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        let pool = create_pool_at(&path, &CatalogConfig::default()).unwrap();
        let conn = get_connection(&pool).unwrap();

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);
        assert!(path.exists());
    }

    #[test]
    fn test_memory_pool() {
        let pool = create_memory_pool().unwrap();
        let conn = get_connection(&pool).unwrap();

        let result: i32 = conn.query_row("SELECT 1 + 1", [], |row| row.get(0)).unwrap();
        assert_eq!(result, 2);
    }

    #[test]
    fn test_test_connection() {
        let conn = create_test_connection().unwrap();

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);
    }
}
