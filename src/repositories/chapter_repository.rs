// src/repositories/chapter_repository.rs
//
// Chapter Repository
//
// CRITICAL RULES:
// - Dumb data mapper: no business logic, no events
// - Ingest replaces a mirror's rows atomically; ingestion order is
//   persisted in the posicao column
// - Chapter numbers are stored in thousandths (exact integers)
// - All parse failures are explicit errors, not silent defaults

use crate::db::ConnectionPool;
use crate::domain::chapter::{ChapterNumber, ChapterRecord};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use std::sync::Arc;
use uuid::Uuid;

pub struct SqliteChapterRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteChapterRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_chapter(row: &Row) -> rusqlite::Result<ChapterRecord> {
        let id_str: String = row.get("id")?;
        let mirror_id_str: String = row.get("mirror_id")?;
        let publicado_em_str: String = row.get("publicado_em")?;
        let criado_em_str: String = row.get("criado_em")?;
        let atualizado_em_str: String = row.get("atualizado_em")?;

        let id = Uuid::parse_str(&id_str)
            .map_err(|e| conversion_err(0, format!("Invalid UUID '{}': {}", id_str, e)))?;

        let mirror_id = Uuid::parse_str(&mirror_id_str).map_err(|e| {
            conversion_err(1, format!("Invalid mirror UUID '{}': {}", mirror_id_str, e))
        })?;

        let publicado_em = parse_timestamp(5, "publicado_em", &publicado_em_str)?;
        let criado_em = parse_timestamp(8, "criado_em", &criado_em_str)?;
        let atualizado_em = parse_timestamp(9, "atualizado_em", &atualizado_em_str)?;

        Ok(ChapterRecord {
            id,
            mirror_id,
            numero: ChapterNumber::from_millis(row.get::<_, i64>("numero_milesimos")?),
            titulo: row.get("titulo")?,
            scanlator: row.get("scanlator")?,
            publicado_em,
            progresso_leitura: row.get::<_, f64>("progresso_leitura")? as f32,
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
pub trait ChapterRepository: Send + Sync {
    /// Atomically replace a mirror's chapter rows, in ingestion order
    fn replace_for_mirror(&self, mirror_id: Uuid, chapters: &[ChapterRecord]) -> AppResult<()>;

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<ChapterRecord>>;

    /// Chapters of a mirror, in ingestion order
    fn list_by_mirror(&self, mirror_id: Uuid) -> AppResult<Vec<ChapterRecord>>;

    fn update_progress(&self, chapter_id: Uuid, progresso: f32) -> AppResult<()>;
}

// ---------------------------------------------------------------------
// SQLite Implementation
// ---------------------------------------------------------------------
impl ChapterRepository for SqliteChapterRepository {
    fn replace_for_mirror(&self, mirror_id: Uuid, chapters: &[ChapterRecord]) -> AppResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM chapters WHERE mirror_id = ?1",
            rusqlite::params![mirror_id.to_string()],
        )?;

        for (posicao, chapter) in chapters.iter().enumerate() {
            tx.execute(
                "INSERT INTO chapters (
                    id, mirror_id, numero_milesimos, titulo, scanlator,
                    publicado_em, progresso_leitura, posicao, criado_em, atualizado_em
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    chapter.id.to_string(),
                    chapter.mirror_id.to_string(),
                    chapter.numero.millis(),
                    chapter.titulo,
                    chapter.scanlator,
                    chapter.publicado_em.to_rfc3339(),
                    chapter.progresso_leitura as f64,
                    posicao as i64,
                    chapter.criado_em.to_rfc3339(),
                    chapter.atualizado_em.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<ChapterRecord>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, mirror_id, numero_milesimos, titulo, scanlator,
                    publicado_em, progresso_leitura, posicao, criado_em, atualizado_em
             FROM chapters WHERE id = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![id.to_string()], Self::row_to_chapter);

        match result {
            Ok(chapter) => Ok(Some(chapter)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list_by_mirror(&self, mirror_id: Uuid) -> AppResult<Vec<ChapterRecord>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, mirror_id, numero_milesimos, titulo, scanlator,
                    publicado_em, progresso_leitura, posicao, criado_em, atualizado_em
             FROM chapters WHERE mirror_id = ?1 ORDER BY posicao",
        )?;

        let chapters = stmt
            .query_map(
                rusqlite::params![mirror_id.to_string()],
                Self::row_to_chapter,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(chapters)
    }

    fn update_progress(&self, chapter_id: Uuid, progresso: f32) -> AppResult<()> {
        let conn = self.pool.get()?;
        let now = Utc::now();
        conn.execute(
            "UPDATE chapters SET progresso_leitura = ?1, atualizado_em = ?2 WHERE id = ?3",
            rusqlite::params![progresso as f64, now.to_rfc3339(), chapter_id.to_string()],
        )?;
        Ok(())
    }
}
