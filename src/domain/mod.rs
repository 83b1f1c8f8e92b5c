// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod chapter;
pub mod mirror;
pub mod priority;
pub mod unified;
pub mod work;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Work Domain
pub use work::{validate_work, DisplayPolicy, SortDirection, SortKey, Work};

// Mirror Domain
pub use mirror::{validate_mirror, Mirror};

// Chapter Domain
pub use chapter::{validate_chapter, ChapterNumber, ChapterRecord};

// Priority Domain (Derived Data)
pub use priority::{GroupPriorityEntry, MirrorPriorityEntry, PriorityTable};

// Unified Sequence (Read Model)
pub use unified::{ChapterView, MarkDirection};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Mirror from source '{fonte}' is already attached to work {work_id}")]
    DuplicateMirror { work_id: Uuid, fonte: String },

    #[error("Cannot remove the last mirror of work {work_id}; remove the work instead")]
    LastMirror { work_id: Uuid },

    #[error("Reorder index out of range: {from} -> {to} (len {len})")]
    InvalidRange { from: usize, to: usize, len: usize },

    #[error("Reading progress {0} outside 0.0..=1.0")]
    InvalidProgress(f32),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
