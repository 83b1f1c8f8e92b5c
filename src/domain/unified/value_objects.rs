// src/domain/unified/value_objects.rs
//
// Unified Sequence Value Objects
//
// Pure, immutable data structures representing the deduplicated chapter
// sequence handed to presentation. These are the bridge between the
// entity graph and whatever renders it.
//
// CRITICAL INVARIANTS:
// - All fields are immutable (no &mut self methods)
// - No side effects
// - No I/O operations
// - Deterministic construction
// - Clone + Debug + Serialize for traceability

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::chapter::{ChapterNumber, ChapterRecord};

// ============================================================================
// CHAPTER VIEW (ONE EMITTED ENTRY)
// ============================================================================

/// One entry of the unified chapter sequence.
/// Carries the identity of the physical ChapterRecord chosen as
/// canonical so collaborators (offline archive, progress writes) can
/// key storage by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterView {
    /// Identity of the underlying ChapterRecord
    pub id: Uuid,

    /// Chapter number shown to the user
    pub display_number: ChapterNumber,

    /// Chapter title, when the mirror published one
    pub title: Option<String>,

    /// Attribution label (scanlation group)
    pub attribution: String,

    /// Publish timestamp of the chosen record
    pub timestamp: DateTime<Utc>,

    /// Reading progress of the chosen record (0.0 to 1.0)
    pub progress: f32,

    /// Mirror that owns the chosen record
    pub owning_mirror_id: Uuid,
}

impl ChapterView {
    /// Project a ChapterRecord into its view form
    pub fn from_record(record: &ChapterRecord) -> Self {
        Self {
            id: record.id,
            display_number: record.numero,
            title: record.titulo.clone(),
            attribution: record.scanlator.clone(),
            timestamp: record.publicado_em,
            progress: record.progresso_leitura,
            owning_mirror_id: record.mirror_id,
        }
    }

    /// A view counts as read once progress reaches 1.0
    pub fn is_read(&self) -> bool {
        self.progress >= 1.0
    }
}

// ============================================================================
// MARK DIRECTION
// ============================================================================

/// Which inclusive side of the anchor a bulk progress update covers,
/// in displayed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkDirection {
    /// From the start of the displayed sequence up to the anchor
    TowardStart,

    /// From the anchor to the end of the displayed sequence
    TowardEnd,
}

impl std::fmt::Display for MarkDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkDirection::TowardStart => write!(f, "toward_start"),
            MarkDirection::TowardEnd => write!(f, "toward_end"),
        }
    }
}
