// src/lib.rs
// MangaHub - Local-first manga library, chapter aggregation core
//
// Architecture:
// - Domain-centric: All business logic lives in domains
// - Event-driven: Mutations propagate through a synchronous typed bus
// - Explicit: No implicit behavior, no magic
// - Local-first: User controls all data
//
// The engine aggregates chapter listings from multiple mirrors of the
// same work, deduplicates them by mirror and scanlator priority, and
// keeps those priorities consistent as mirrors come and go.

pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod graph;
pub mod infrastructure;
pub mod repositories;
pub mod services;

// ============================================================================
// PUBLIC API - Domain Entities
// ============================================================================

pub use domain::{
    validate_chapter,
    validate_mirror,
    validate_work,
    // Chapter
    ChapterNumber,
    ChapterRecord,
    // Unified sequence
    ChapterView,
    // Work
    DisplayPolicy,
    // Priority (derived data)
    GroupPriorityEntry,
    MarkDirection,
    // Mirror
    Mirror,
    MirrorPriorityEntry,
    PriorityTable,
    SortDirection,
    SortKey,
    Work,
};

pub use domain::{DomainError, DomainResult};

// ============================================================================
// PUBLIC API - Entity Graph
// ============================================================================

pub use graph::{IngestOutcome, LibraryGraph};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus,
    register_reconciliation_handlers,
    ChapterProgressUpdated,
    ChaptersIngested,
    DomainEvent,
    EntitiesChanged,
    EntityRef,
    EventBus,
    EventLogEntry,
    GroupPriorityReordered,
    MirrorAttached,
    MirrorPriorityReordered,
    MirrorRemoved,
    WorkCreated,
    WorkReconciled,
    WorkRemoved,
};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{
    ChapterRepository,
    MirrorRepository,
    SqliteChapterRepository,
    SqliteMirrorRepository,
    SqliteWorkRepository,
    WorkRepository,
};

// ============================================================================
// PUBLIC API - Infrastructure
// ============================================================================

pub use infrastructure::{LocalArchive, OfflineStore};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    continue_index,
    reconcile_work,
    unify_records,
    AttachMirrorRequest,
    // Library Service
    CreateWorkRequest,
    IngestRules,
    LibraryService,
    RawChapter,
    // Reconciliation Service
    ReconciliationService,
    // Sync Service
    RemoteSource,
    SyncService,
    // Unifier Service
    UnifierService,
};
