// src/events/mod.rs
//
// Internal Event System - Public API
//
// CRITICAL: the bus's BoxedHandler alias is INTERNAL and must NOT be exported

pub mod bus;
pub mod handlers;
pub mod types;

// ============================================================================
// PUBLIC EXPORTS - Event Types and Bus Only
// ============================================================================

pub use types::DomainEvent;

pub use types::{
    // Chapter
    ChapterProgressUpdated,
    ChaptersIngested,
    // Change propagation
    EntitiesChanged,
    EntityRef,
    GroupPriorityReordered,
    // Mirror
    MirrorAttached,
    // Priority
    MirrorPriorityReordered,
    MirrorRemoved,
    // Work
    WorkCreated,
    WorkReconciled,
    WorkRemoved,
};

pub use bus::{EventBus, EventLogEntry};

// Reconciliation handler registration
pub use handlers::register_reconciliation_handlers;

/// Initialize a new event bus
pub fn create_event_bus() -> EventBus {
    EventBus::new()
}
