// src/repositories/work_repository.rs
//
// Work Repository
//
// CRITICAL RULES:
// - Dumb data mapper: no business logic, no events
// - All parse failures are explicit errors, not silent defaults
// - Policy, priority table, and free metadata are JSON columns
// - Uses ConnectionPool for thread safety

use crate::db::ConnectionPool;
use crate::domain::work::Work;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use std::sync::Arc;
use uuid::Uuid;

pub struct SqliteWorkRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteWorkRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Convert a database row to a Work entity.
    ///
    /// All parse failures are explicit errors, not silent defaults.
    fn row_to_work(row: &Row) -> rusqlite::Result<Work> {
        let id_str: String = row.get("id")?;
        let titulos_str: String = row.get("titulos_alternativos")?;
        let politica_str: String = row.get("politica")?;
        let prioridades_str: String = row.get("prioridades")?;
        let metadados_str: String = row.get("metadados_livres")?;
        let criado_em_str: String = row.get("criado_em")?;
        let atualizado_em_str: String = row.get("atualizado_em")?;

        let id = Uuid::parse_str(&id_str)
            .map_err(|e| conversion_err(0, format!("Invalid UUID '{}': {}", id_str, e)))?;

        let titulos_alternativos: Vec<String> = serde_json::from_str(&titulos_str)
            .map_err(|e| conversion_err(2, format!("Invalid titulos_alternativos JSON: {}", e)))?;

        let politica = serde_json::from_str(&politica_str)
            .map_err(|e| conversion_err(3, format!("Invalid politica JSON: {}", e)))?;

        let prioridades = serde_json::from_str(&prioridades_str)
            .map_err(|e| conversion_err(4, format!("Invalid prioridades JSON: {}", e)))?;

        let metadados_livres = serde_json::from_str(&metadados_str)
            .map_err(|e| conversion_err(6, format!("Invalid metadados_livres JSON: {}", e)))?;

        let criado_em = parse_timestamp(7, "criado_em", &criado_em_str)?;
        let atualizado_em = parse_timestamp(8, "atualizado_em", &atualizado_em_str)?;

        Ok(Work {
            id,
            titulo_principal: row.get("titulo_principal")?,
            titulos_alternativos,
            politica,
            prioridades,
            precisa_reconciliacao: row.get::<_, i64>("precisa_reconciliacao")? != 0,
            metadados_livres,
            criado_em,
            atualizado_em,
        })
    }
}

/// Wrap a parse failure in an explicit conversion error
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
pub trait WorkRepository: Send + Sync {
    fn save(&self, work: &Work) -> AppResult<()>;

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Work>>;

    fn list_all(&self) -> AppResult<Vec<Work>>;

    fn delete(&self, id: Uuid) -> AppResult<()>;
}

// ---------------------------------------------------------------------
// SQLite Implementation
// ---------------------------------------------------------------------
impl WorkRepository for SqliteWorkRepository {
    fn save(&self, work: &Work) -> AppResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT OR REPLACE INTO works (
                id, titulo_principal, titulos_alternativos, politica,
                prioridades, precisa_reconciliacao, metadados_livres,
                criado_em, atualizado_em
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                work.id.to_string(),
                work.titulo_principal,
                serde_json::to_string(&work.titulos_alternativos)?,
                serde_json::to_string(&work.politica)?,
                serde_json::to_string(&work.prioridades)?,
                work.precisa_reconciliacao as i64,
                serde_json::to_string(&work.metadados_livres)?,
                work.criado_em.to_rfc3339(),
                work.atualizado_em.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Work>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, titulo_principal, titulos_alternativos, politica,
                    prioridades, precisa_reconciliacao, metadados_livres,
                    criado_em, atualizado_em
             FROM works WHERE id = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![id.to_string()], Self::row_to_work);

        match result {
            Ok(work) => Ok(Some(work)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list_all(&self) -> AppResult<Vec<Work>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, titulo_principal, titulos_alternativos, politica,
                    prioridades, precisa_reconciliacao, metadados_livres,
                    criado_em, atualizado_em
             FROM works ORDER BY criado_em",
        )?;

        let works = stmt
            .query_map([], Self::row_to_work)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(works)
    }

    fn delete(&self, id: Uuid) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "DELETE FROM works WHERE id = ?1",
            rusqlite::params![id.to_string()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_connection_pool_at, get_connection, initialize_database};
    use crate::domain::work::{DisplayPolicy, SortDirection, SortKey};

    fn test_repo() -> (tempfile::TempDir, SqliteWorkRepository) {
        let dir = tempfile::tempdir().unwrap();
        let pool = Arc::new(create_connection_pool_at(&dir.path().join("test.db")).unwrap());
        initialize_database(&get_connection(&pool).unwrap()).unwrap();
        (dir, SqliteWorkRepository::new(pool))
    }

    #[test]
    fn test_save_and_get_roundtrip() {
        let (_dir, repo) = test_repo();

        let mut work = Work::new("Berserk".to_string());
        work.titulos_alternativos = vec!["Kenpuu Denki Berserk".to_string()];
        work.politica = DisplayPolicy {
            mostrar_duplicatas: true,
            incluir_meios_capitulos: false,
            chave_ordenacao: SortKey::Data,
            direcao_ordenacao: SortDirection::Ascendente,
        };
        work.precisa_reconciliacao = true;

        repo.save(&work).unwrap();
        let loaded = repo.get_by_id(work.id).unwrap().unwrap();

        assert_eq!(loaded.titulo_principal, "Berserk");
        assert_eq!(loaded.titulos_alternativos, work.titulos_alternativos);
        assert_eq!(loaded.politica, work.politica);
        assert!(loaded.precisa_reconciliacao);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let (_dir, repo) = test_repo();
        assert!(repo.get_by_id(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let (_dir, repo) = test_repo();
        let work = Work::new("Vagabond".to_string());
        repo.save(&work).unwrap();

        repo.delete(work.id).unwrap();
        assert!(repo.get_by_id(work.id).unwrap().is_none());
    }
}
