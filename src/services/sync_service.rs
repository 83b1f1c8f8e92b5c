// src/services/sync_service.rs
//
// Sync Service - Remote Listing Boundary
//
// Maps raw chapter batches supplied by a remote source into domain
// records and feeds them through ingest.
//
// CRITICAL RULES:
// - Remote retrieval itself lives behind the RemoteSource trait; this
//   service never performs network I/O
// - Mapping is deterministic: same batch → same records (ids aside)
// - A raw chapter without a usable number is skipped, never guessed
// - Missing attribution becomes the explicit "Unknown" label

use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::domain::chapter::{ChapterNumber, ChapterRecord};
use crate::error::AppResult;
use crate::graph::IngestOutcome;
use crate::services::LibraryService;

/// One chapter as supplied by a remote source, before mapping
#[derive(Debug, Clone, Default)]
pub struct RawChapter {
    /// Numeric chapter field, when the source provides one
    pub numero: Option<f64>,

    /// Raw chapter title; consulted for a number when `numero` is absent
    pub titulo: Option<String>,

    /// Attribution label as reported by the source
    pub scanlator: Option<String>,

    /// Publish timestamp as reported by the source
    pub publicado_em: Option<DateTime<Utc>>,
}

/// A remote listing of chapters for one work
///
/// Implementations own transport, authentication, and retry concerns;
/// this crate consumes batches only.
pub trait RemoteSource: Send + Sync {
    /// Globally-scoped source identity (matches Mirror::fonte)
    fn source_id(&self) -> &str;

    /// Fetch the raw chapter list for one work on this source
    fn fetch_chapters(&self, remote_ref: &str) -> AppResult<Vec<RawChapter>>;
}

// ============================================================================
// INGEST RULES (DETERMINISTIC, LAYERED)
// ============================================================================

/// Deterministic rules for recovering chapter data from raw fields.
/// All rules are explicit and ordered.
pub struct IngestRules {
    /// Patterns for extracting a chapter number from a raw title
    chapter_number_patterns: Vec<Regex>,
}

impl Default for IngestRules {
    fn default() -> Self {
        Self {
            chapter_number_patterns: vec![
                // Chapter 10.5, Chapter 3
                Regex::new(r"[Cc]hapter\s*(\d+(?:\.\d+)?)").unwrap(),
                // Ch. 10.5, Ch 3, ch.3
                Regex::new(r"[Cc]h\.?\s*(\d+(?:\.\d+)?)").unwrap(),
                // #12, #12.5
                Regex::new(r"#(\d+(?:\.\d+)?)").unwrap(),
                // Bare leading number: "12.5 - The Eclipse"
                Regex::new(r"^\s*(\d+(?:\.\d+)?)\b").unwrap(),
            ],
        }
    }
}

impl IngestRules {
    /// Extract a chapter number from a raw title
    pub fn parse_chapter_number(&self, titulo: &str) -> Option<ChapterNumber> {
        for pattern in &self.chapter_number_patterns {
            if let Some(captures) = pattern.captures(titulo) {
                if let Some(num_str) = captures.get(1) {
                    if let Some(numero) = ChapterNumber::parse(num_str.as_str()) {
                        return Some(numero);
                    }
                }
            }
        }
        None
    }

    /// Normalize an attribution label; absent or blank becomes "Unknown"
    pub fn normalize_attribution(&self, scanlator: Option<&str>) -> String {
        match scanlator.map(str::trim) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => "Unknown".to_string(),
        }
    }
}

// ============================================================================
// SYNC SERVICE
// ============================================================================

pub struct SyncService {
    library: Arc<LibraryService>,
    rules: IngestRules,
}

impl SyncService {
    pub fn new(library: Arc<LibraryService>) -> Self {
        Self {
            library,
            rules: IngestRules::default(),
        }
    }

    /// Fetch one mirror's listing and ingest it
    ///
    /// Raw chapters without a recoverable number are skipped and logged.
    pub fn sync_mirror(
        &self,
        source: &dyn RemoteSource,
        mirror_id: Uuid,
        remote_ref: &str,
    ) -> AppResult<IngestOutcome> {
        let raw = source.fetch_chapters(remote_ref)?;
        let total_raw = raw.len();

        let records = self.map_batch(mirror_id, raw);
        if records.len() < total_raw {
            log::warn!(
                "source {}: skipped {} of {} raw chapters without a usable number",
                source.source_id(),
                total_raw - records.len(),
                total_raw
            );
        }

        self.library.ingest_chapters(mirror_id, records)
    }

    /// Map a raw batch into domain records, preserving batch order
    fn map_batch(&self, mirror_id: Uuid, raw: Vec<RawChapter>) -> Vec<ChapterRecord> {
        raw.into_iter()
            .filter_map(|chapter| self.map_raw(mirror_id, chapter))
            .collect()
    }

    fn map_raw(&self, mirror_id: Uuid, raw: RawChapter) -> Option<ChapterRecord> {
        let numero = match raw.numero {
            Some(value) if value.is_finite() && value >= 0.0 => ChapterNumber::from_f64(value),
            _ => self
                .rules
                .parse_chapter_number(raw.titulo.as_deref().unwrap_or(""))?,
        };

        let mut record = ChapterRecord::new(
            mirror_id,
            numero,
            self.rules.normalize_attribution(raw.scanlator.as_deref()),
            raw.publicado_em.unwrap_or_else(Utc::now),
        );
        record.titulo = raw.titulo;
        Some(record)
    }
}

// ============================================================================
// TESTS
// ============================================================================
