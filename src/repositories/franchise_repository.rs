// src/repositories/franchise_repository.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::ConnectionPool;
use crate::domain::{DomainError, EntryKind, Franchise, FranchiseEntry, ParentLink};
use crate::error::{AppError, AppResult};

#[cfg_attr(test, mockall::automock)]
pub trait FranchiseRepository: Send + Sync {
    /// Write the franchise row and replace its entries
    fn save(&self, franchise: &Franchise) -> AppResult<()>;
    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Franchise>>;
    fn list_all(&self) -> AppResult<Vec<Franchise>>;
    fn delete(&self, id: Uuid) -> AppResult<()>;
    /// Entry of another franchise referencing `id`, if any
    fn find_parent(&self, id: Uuid) -> AppResult<Option<ParentLink>>;
}

pub struct SqliteFranchiseRepository {
    pool: Arc<ConnectionPool>,
}

pub(crate) fn conversion_error<E>(err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
}

pub(crate) fn parse_uuid(row: &Row, column: &str) -> Result<Uuid, rusqlite::Error> {
    Uuid::parse_str(&row.get::<_, String>(column)?).map_err(conversion_error)
}

pub(crate) fn parse_timestamp(row: &Row, column: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    Ok(DateTime::parse_from_rfc3339(&row.get::<_, String>(column)?)
        .map_err(conversion_error)?
        .with_timezone(&Utc))
}

impl SqliteFranchiseRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_franchise(row: &Row) -> Result<Franchise, rusqlite::Error> {
        Ok(Franchise {
            id: parse_uuid(row, "id")?,
            title: row.get("title")?,
            entries: Vec::new(),
            merge_display_numbers: row.get("merge_display_numbers")?,
            is_loosely_connected: row.get("is_loosely_connected")?,
            parent: None,
            created_at: parse_timestamp(row, "created_at")?,
            updated_at: parse_timestamp(row, "updated_at")?,
        })
    }

    fn row_to_entry(row: &Row) -> Result<FranchiseEntry, rusqlite::Error> {
        let kind: String = row.get("kind")?;
        let target_id = parse_uuid(row, "target_id")?;
        let kind = EntryKind::from_parts(&kind, target_id).ok_or_else(|| {
            conversion_error(DomainError::DataIntegrity(format!(
                "Unknown entry kind '{}'",
                kind
            )))
        })?;

        Ok(FranchiseEntry {
            id: parse_uuid(row, "id")?,
            franchise_id: parse_uuid(row, "franchise_id")?,
            kind,
            sequence_number: row.get("sequence_number")?,
            display_number: row.get("display_number")?,
        })
    }

    fn load_entries(conn: &Connection, franchise_id: Uuid) -> AppResult<Vec<FranchiseEntry>> {
        let mut stmt = conn.prepare("SELECT * FROM franchise_entries WHERE franchise_id = ?1")?;

        let entries = stmt
            .query_map(params![franchise_id.to_string()], Self::row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn parent_link(conn: &Connection, id: Uuid) -> AppResult<Option<ParentLink>> {
        let mut stmt = conn.prepare(
            "SELECT franchise_id, id FROM franchise_entries
             WHERE kind = 'franchise' AND target_id = ?1",
        )?;

        let links: Vec<ParentLink> = stmt
            .query_map(params![id.to_string()], |row| {
                Ok(ParentLink {
                    franchise_id: parse_uuid(row, "franchise_id")?,
                    entry_id: parse_uuid(row, "id")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if links.len() > 1 {
            return Err(AppError::Domain(DomainError::DataIntegrity(format!(
                "Franchise {} is referenced by {} entries",
                id,
                links.len()
            ))));
        }

        Ok(links.into_iter().next())
    }

    fn complete(conn: &Connection, mut franchise: Franchise) -> AppResult<Franchise> {
        franchise.entries = Self::load_entries(conn, franchise.id)?;
        franchise.parent = Self::parent_link(conn, franchise.id)?;
        Ok(franchise)
    }
}

impl FranchiseRepository for SqliteFranchiseRepository {
    fn save(&self, franchise: &Franchise) -> AppResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO franchises (id, title, merge_display_numbers, is_loosely_connected, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                merge_display_numbers = excluded.merge_display_numbers,
                is_loosely_connected = excluded.is_loosely_connected,
                updated_at = excluded.updated_at",
            params![
                franchise.id.to_string(),
                franchise.title,
                franchise.merge_display_numbers,
                franchise.is_loosely_connected,
                franchise.created_at.to_rfc3339(),
                franchise.updated_at.to_rfc3339(),
            ],
        )?;

        tx.execute(
            "DELETE FROM franchise_entries WHERE franchise_id = ?1",
            params![franchise.id.to_string()],
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO franchise_entries (id, franchise_id, kind, target_id, sequence_number, display_number)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for entry in &franchise.entries {
                insert.execute(params![
                    entry.id.to_string(),
                    entry.franchise_id.to_string(),
                    entry.kind.as_str(),
                    entry.kind.target_id().to_string(),
                    entry.sequence_number,
                    entry.display_number,
                ])?;
            }
        }

        tx.commit()?;
        log::debug!(
            "[DB] Saved franchise {} with {} entries",
            franchise.id,
            franchise.entries.len()
        );
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Franchise>> {
        let conn = self.pool.get()?;

        let franchise = conn
            .query_row(
                "SELECT * FROM franchises WHERE id = ?1",
                params![id.to_string()],
                Self::row_to_franchise,
            )
            .optional()?;

        match franchise {
            Some(franchise) => Ok(Some(Self::complete(&conn, franchise)?)),
            None => Ok(None),
        }
    }

    fn list_all(&self) -> AppResult<Vec<Franchise>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare("SELECT * FROM franchises ORDER BY title")?;
        let rows: Vec<Franchise> = stmt
            .query_map([], Self::row_to_franchise)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|franchise| Self::complete(&conn, franchise))
            .collect()
    }

    fn delete(&self, id: Uuid) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "DELETE FROM franchises WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    fn find_parent(&self, id: Uuid) -> AppResult<Option<ParentLink>> {
        let conn = self.pool.get()?;
        Self::parent_link(&conn, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, get_connection, initialize_database};
    use crate::domain::sequence::insert;

    fn repository() -> SqliteFranchiseRepository {
        let pool = create_memory_pool().unwrap();
        initialize_database(&get_connection(&pool).unwrap()).unwrap();
        SqliteFranchiseRepository::new(Arc::new(pool))
    }

    fn with_movies(title: &str, count: usize) -> Franchise {
        let mut franchise = Franchise::new(title.to_string());
        for index in 0..count {
            let mut entry = FranchiseEntry::new(franchise.id, EntryKind::movie(Uuid::new_v4()));
            entry.display_number = Some(index as u32 + 1);
            insert(&mut franchise.entries, entry);
        }
        franchise
    }

    #[test]
    fn test_save_and_load() {
        let repo = repository();
        let mut franchise = with_movies("Back to the Future", 3);
        franchise.entries[1].display_number = None;
        franchise.merge_display_numbers = true;

        repo.save(&franchise).unwrap();
        let loaded = repo.get_by_id(franchise.id).unwrap().unwrap();

        assert_eq!(loaded.title, "Back to the Future");
        assert!(loaded.merge_display_numbers);
        assert!(loaded.parent.is_none());
        assert_eq!(loaded.entries.len(), 3);
        for entry in &franchise.entries {
            assert_eq!(loaded.entry(entry.id), Some(entry));
        }
    }

    #[test]
    fn test_save_replaces_entries() {
        let repo = repository();
        let mut franchise = with_movies("Terminator", 3);
        repo.save(&franchise).unwrap();

        franchise.entries.truncate(1);
        franchise.title = "The Terminator".to_string();
        repo.save(&franchise).unwrap();

        let loaded = repo.get_by_id(franchise.id).unwrap().unwrap();
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.title, "The Terminator");
    }

    #[test]
    fn test_parent_is_resolved_from_entries() {
        let repo = repository();
        let inner = Franchise::new("Inner".to_string());
        let mut outer = Franchise::new("Outer".to_string());
        let entry = FranchiseEntry::new(outer.id, EntryKind::franchise(inner.id));
        let entry_id = entry.id;
        insert(&mut outer.entries, entry);

        repo.save(&inner).unwrap();
        repo.save(&outer).unwrap();

        let expected = ParentLink {
            franchise_id: outer.id,
            entry_id,
        };
        assert_eq!(repo.find_parent(inner.id).unwrap(), Some(expected));
        assert_eq!(
            repo.get_by_id(inner.id).unwrap().unwrap().parent,
            Some(expected)
        );
        assert_eq!(repo.find_parent(outer.id).unwrap(), None);
    }

    #[test]
    fn test_loading_does_not_repair() {
        let repo = repository();
        let mut franchise = with_movies("Broken", 2);
        franchise.entries[1].sequence_number = 7;
        repo.save(&franchise).unwrap();

        let loaded = repo.get_by_id(franchise.id).unwrap().unwrap();
        let positions: Vec<u32> = loaded.entries.iter().map(|e| e.sequence_number).collect();
        assert!(positions.contains(&7));
    }

    #[test]
    fn test_delete_and_list() {
        let repo = repository();
        let first = with_movies("A", 1);
        let second = with_movies("B", 0);
        repo.save(&first).unwrap();
        repo.save(&second).unwrap();

        assert_eq!(repo.list_all().unwrap().len(), 2);

        repo.delete(first.id).unwrap();
        assert!(repo.get_by_id(first.id).unwrap().is_none());
        assert_eq!(repo.list_all().unwrap().len(), 1);
    }
}
