// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod library_service;
pub mod reconciliation_service;
pub mod sync_service;
pub mod unifier_service;


#[cfg(test)]
mod reconciliation_service_tests;


// Re-export all services and their types
pub use library_service::{
    AttachMirrorRequest,
    CreateWorkRequest,
    LibraryService,
};

pub use reconciliation_service::{
    reconcile_work,
    ReconciliationService,
};

pub use unifier_service::{
    continue_index,
    unify_records,
    UnifierService,
};

pub use sync_service::{
    IngestRules,
    RawChapter,
    RemoteSource,
    SyncService,
};
