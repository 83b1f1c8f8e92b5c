// src/repositories/mirror_repository.rs
//
// Mirror Repository
//
// CRITICAL RULES:
// - Dumb data mapper: no business logic, no events
// - Attach order is persisted in the posicao column; list_by_work
//   returns rows in that order
// - All parse failures are explicit errors, not silent defaults

use crate::db::ConnectionPool;
use crate::domain::mirror::Mirror;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use std::sync::Arc;
use uuid::Uuid;

pub struct SqliteMirrorRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteMirrorRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_mirror(row: &Row) -> rusqlite::Result<Mirror> {
        let id_str: String = row.get("id")?;
        let work_id_str: String = row.get("work_id")?;
        let criado_em_str: String = row.get("criado_em")?;
        let atualizado_em_str: String = row.get("atualizado_em")?;

        let id = Uuid::parse_str(&id_str)
            .map_err(|e| conversion_err(0, format!("Invalid UUID '{}': {}", id_str, e)))?;

        let work_id = Uuid::parse_str(&work_id_str)
            .map_err(|e| conversion_err(1, format!("Invalid work UUID '{}': {}", work_id_str, e)))?;

        let criado_em = parse_timestamp(4, "criado_em", &criado_em_str)?;
        let atualizado_em = parse_timestamp(5, "atualizado_em", &atualizado_em_str)?;

        Ok(Mirror {
            id,
            work_id,
            fonte: row.get("fonte")?,
            criado_em,
            atualizado_em,
        })
    }
}

fn conversion_err(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

fn parse_timestamp(
    index: usize,
    column: &str,
    value: &str,
) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(index, format!("Invalid {} timestamp '{}': {}", column, value, e)))
}

// ---------------------------------------------------------------------
// Repository contract
// ---------------------------------------------------------------------
#[cfg_attr(test, mockall::automock)]
pub trait MirrorRepository: Send + Sync {
    /// Persist a mirror at its attach position within the work
    fn save(&self, mirror: &Mirror, posicao: i64) -> AppResult<()>;

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Mirror>>;

    /// Mirrors of a work, in attach order
    fn list_by_work(&self, work_id: Uuid) -> AppResult<Vec<Mirror>>;

    fn delete(&self, id: Uuid) -> AppResult<()>;
}

// ---------------------------------------------------------------------
// SQLite Implementation
// ---------------------------------------------------------------------
impl MirrorRepository for SqliteMirrorRepository {
    fn save(&self, mirror: &Mirror, posicao: i64) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR REPLACE INTO mirrors (
                id, work_id, fonte, posicao, criado_em, atualizado_em
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                mirror.id.to_string(),
                mirror.work_id.to_string(),
                mirror.fonte,
                posicao,
                mirror.criado_em.to_rfc3339(),
                mirror.atualizado_em.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Mirror>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, work_id, fonte, posicao, criado_em, atualizado_em
             FROM mirrors WHERE id = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![id.to_string()], Self::row_to_mirror);

        match result {
            Ok(mirror) => Ok(Some(mirror)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list_by_work(&self, work_id: Uuid) -> AppResult<Vec<Mirror>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, work_id, fonte, posicao, criado_em, atualizado_em
             FROM mirrors WHERE work_id = ?1 ORDER BY posicao",
        )?;

        let mirrors = stmt
            .query_map(rusqlite::params![work_id.to_string()], Self::row_to_mirror)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(mirrors)
    }

    fn delete(&self, id: Uuid) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "DELETE FROM mirrors WHERE id = ?1",
            rusqlite::params![id.to_string()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_connection_pool_at, get_connection, initialize_database};
    use crate::domain::work::Work;
    use crate::repositories::work_repository::{SqliteWorkRepository, WorkRepository};

    fn test_repos() -> (tempfile::TempDir, SqliteWorkRepository, SqliteMirrorRepository) {
        let dir = tempfile::tempdir().unwrap();
        let pool = Arc::new(create_connection_pool_at(&dir.path().join("test.db")).unwrap());
        initialize_database(&get_connection(&pool).unwrap()).unwrap();
        (
            dir,
            SqliteWorkRepository::new(Arc::clone(&pool)),
            SqliteMirrorRepository::new(pool),
        )
    }

    #[test]
    fn test_list_by_work_preserves_attach_order() {
        let (_dir, works, mirrors) = test_repos();

        let work = Work::new("Berserk".to_string());
        works.save(&work).unwrap();

        let a = Mirror::new(work.id, "mangasee".to_string());
        let b = Mirror::new(work.id, "mangadex".to_string());
        mirrors.save(&a, 0).unwrap();
        mirrors.save(&b, 1).unwrap();

        let listed = mirrors.list_by_work(work.id).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, a.id);
        assert_eq!(listed[1].id, b.id);
    }

    #[test]
    fn test_delete_cascades_from_work() {
        let (_dir, works, mirrors) = test_repos();

        let work = Work::new("Berserk".to_string());
        works.save(&work).unwrap();
        let mirror = Mirror::new(work.id, "mangasee".to_string());
        mirrors.save(&mirror, 0).unwrap();

        works.delete(work.id).unwrap();
        assert!(mirrors.get_by_id(mirror.id).unwrap().is_none());
    }
}
