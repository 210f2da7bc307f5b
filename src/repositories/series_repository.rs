// src/repositories/series_repository.rs

use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::franchise_repository::{conversion_error, parse_timestamp, parse_uuid};
use crate::db::ConnectionPool;
use crate::domain::{ComponentKind, DomainError, Series, SeriesComponent};
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
pub trait SeriesRepository: Send + Sync {
    /// Write the series row and replace its components
    fn save(&self, series: &Series) -> AppResult<()>;
    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Series>>;
    fn list_all(&self) -> AppResult<Vec<Series>>;
    fn delete(&self, id: Uuid) -> AppResult<()>;
}

pub struct SqliteSeriesRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteSeriesRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_series(row: &Row) -> Result<Series, rusqlite::Error> {
        Ok(Series {
            id: parse_uuid(row, "id")?,
            title: row.get("title")?,
            components: Vec::new(),
            is_miniseries: row.get("is_miniseries")?,
            created_at: parse_timestamp(row, "created_at")?,
            updated_at: parse_timestamp(row, "updated_at")?,
        })
    }

    fn row_to_component(row: &Row) -> Result<SeriesComponent, rusqlite::Error> {
        let stored_kind: String = row.get("kind")?;
        let payload: String = row.get("payload")?;
        let kind: ComponentKind = serde_json::from_str(&payload).map_err(conversion_error)?;

        if kind.as_str() != stored_kind {
            return Err(conversion_error(DomainError::DataIntegrity(format!(
                "Component stored as '{}' holds a {} payload",
                stored_kind,
                kind.as_str()
            ))));
        }

        Ok(SeriesComponent {
            id: parse_uuid(row, "id")?,
            series_id: parse_uuid(row, "series_id")?,
            sequence_number: row.get("sequence_number")?,
            kind,
        })
    }

    fn complete(conn: &Connection, mut series: Series) -> AppResult<Series> {
        let mut stmt = conn.prepare("SELECT * FROM series_components WHERE series_id = ?1")?;
        series.components = stmt
            .query_map(params![series.id.to_string()], Self::row_to_component)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(series)
    }
}

impl SeriesRepository for SqliteSeriesRepository {
    fn save(&self, series: &Series) -> AppResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO series (id, title, is_miniseries, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                is_miniseries = excluded.is_miniseries,
                updated_at = excluded.updated_at",
            params![
                series.id.to_string(),
                series.title,
                series.is_miniseries,
                series.created_at.to_rfc3339(),
                series.updated_at.to_rfc3339(),
            ],
        )?;

        tx.execute(
            "DELETE FROM series_components WHERE series_id = ?1",
            params![series.id.to_string()],
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO series_components (id, series_id, kind, sequence_number, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for component in &series.components {
                insert.execute(params![
                    component.id.to_string(),
                    component.series_id.to_string(),
                    component.kind.as_str(),
                    component.sequence_number,
                    serde_json::to_string(&component.kind)?,
                ])?;
            }
        }

        tx.commit()?;
        log::debug!(
            "[DB] Saved series {} with {} components",
            series.id,
            series.components.len()
        );
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Series>> {
        let conn = self.pool.get()?;

        let series = conn
            .query_row(
                "SELECT * FROM series WHERE id = ?1",
                params![id.to_string()],
                Self::row_to_series,
            )
            .optional()?;

        match series {
            Some(series) => Ok(Some(Self::complete(&conn, series)?)),
            None => Ok(None),
        }
    }

    fn list_all(&self) -> AppResult<Vec<Series>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare("SELECT * FROM series ORDER BY title")?;
        let rows: Vec<Series> = stmt
            .query_map([], Self::row_to_series)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|series| Self::complete(&conn, series))
            .collect()
    }

    fn delete(&self, id: Uuid) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM series WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, get_connection, initialize_database};
    use crate::domain::sequence::insert;
    use crate::domain::{Period, Season, SpecialEpisode};

    fn repository() -> SqliteSeriesRepository {
        let pool = create_memory_pool().unwrap();
        initialize_database(&get_connection(&pool).unwrap()).unwrap();
        SqliteSeriesRepository::new(Arc::new(pool))
    }

    fn sample() -> Series {
        let mut series = Series::new("Twin Peaks".to_string());
        let season = ComponentKind::Season(Season {
            title: "Season 1".to_string(),
            original_title: "Season 1".to_string(),
            channel: "ABC".to_string(),
            periods: vec![Period {
                start_month: 4,
                start_year: 1990,
                end_month: 5,
                end_year: 1990,
                episode_count: 8,
            }],
        });
        let special = ComponentKind::SpecialEpisode(SpecialEpisode {
            title: "Fire Walk with Me".to_string(),
            original_title: "Fire Walk with Me".to_string(),
            channel: "ABC".to_string(),
            month: 8,
            year: 1992,
        });
        insert(&mut series.components, SeriesComponent::new(series.id, season));
        insert(&mut series.components, SeriesComponent::new(series.id, special));
        series
    }

    #[test]
    fn test_save_and_load() {
        let repo = repository();
        let series = sample();

        repo.save(&series).unwrap();
        let loaded = repo.get_by_id(series.id).unwrap().unwrap();

        assert_eq!(loaded.title, "Twin Peaks");
        assert_eq!(loaded.components.len(), 2);
        for component in &series.components {
            assert_eq!(loaded.component(component.id), Some(component));
        }
        assert_eq!(loaded.end_year(), Some(1992));
    }

    #[test]
    fn test_save_replaces_components() {
        let repo = repository();
        let mut series = sample();
        repo.save(&series).unwrap();

        series.components.pop();
        series.is_miniseries = true;
        repo.save(&series).unwrap();

        let loaded = repo.get_by_id(series.id).unwrap().unwrap();
        assert_eq!(loaded.components.len(), 1);
        assert!(loaded.is_miniseries);
    }

    #[test]
    fn test_delete_cascades() {
        let repo = repository();
        let series = sample();
        repo.save(&series).unwrap();

        repo.delete(series.id).unwrap();

        assert!(repo.get_by_id(series.id).unwrap().is_none());
        assert!(repo.list_all().unwrap().is_empty());
    }
}
