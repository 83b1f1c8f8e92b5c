// events/types.rs
//
// All domain events in the system.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

/// Reference to one persisted entity, used by change propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Work(Uuid),
    Mirror(Uuid),
    Chapter(Uuid),
}

// ============================================================================
// WORK DOMAIN EVENTS
// ============================================================================

/// Emitted when a new Work is materialized from its first mirror
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkCreated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub work_id: Uuid,
    pub titulo_principal: String,
    pub fonte: String,
}

impl WorkCreated {
    pub fn new(work_id: Uuid, titulo_principal: String, fonte: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            work_id,
            titulo_principal,
            fonte,
        }
    }
}

impl DomainEvent for WorkCreated {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "WorkCreated" }
}

/// Emitted when a Work is removed along with all its mirrors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkRemoved {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub work_id: Uuid,
}

impl WorkRemoved {
    pub fn new(work_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            work_id,
        }
    }
}

impl DomainEvent for WorkRemoved {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "WorkRemoved" }
}

// ============================================================================
// MIRROR DOMAIN EVENTS
// ============================================================================

/// Emitted when a mirror is attached to a Work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorAttached {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub mirror_id: Uuid,
    pub work_id: Uuid,
    pub fonte: String,
}

impl MirrorAttached {
    pub fn new(mirror_id: Uuid, work_id: Uuid, fonte: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            mirror_id,
            work_id,
            fonte,
        }
    }
}

impl DomainEvent for MirrorAttached {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "MirrorAttached" }
}

/// Emitted when a mirror is removed from a Work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorRemoved {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub mirror_id: Uuid,
    pub work_id: Uuid,
    pub fonte: String,
}

impl MirrorRemoved {
    pub fn new(mirror_id: Uuid, work_id: Uuid, fonte: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            mirror_id,
            work_id,
            fonte,
        }
    }
}

impl DomainEvent for MirrorRemoved {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "MirrorRemoved" }
}

// ============================================================================
// CHAPTER DOMAIN EVENTS
// ============================================================================

/// Emitted after a mirror's chapter list is replaced with fetched data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaptersIngested {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub mirror_id: Uuid,
    pub work_id: Uuid,
    pub total: usize,
    pub novos: usize,
    pub preservados: usize,
}

impl ChaptersIngested {
    pub fn new(
        mirror_id: Uuid,
        work_id: Uuid,
        total: usize,
        novos: usize,
        preservados: usize,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            mirror_id,
            work_id,
            total,
            novos,
            preservados,
        }
    }
}

impl DomainEvent for ChaptersIngested {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "ChaptersIngested" }
}

/// Emitted when reading progress is written to a chapter record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterProgressUpdated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub chapter_id: Uuid,
    pub mirror_id: Uuid,
    pub progresso: f32,
}

impl ChapterProgressUpdated {
    pub fn new(chapter_id: Uuid, mirror_id: Uuid, progresso: f32) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            chapter_id,
            mirror_id,
            progresso,
        }
    }
}

impl DomainEvent for ChapterProgressUpdated {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "ChapterProgressUpdated" }
}

// ============================================================================
// PRIORITY EVENTS
// ============================================================================

/// Emitted when the user reorders mirror priority
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorPriorityReordered {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub work_id: Uuid,
    pub from: usize,
    pub to: usize,
}

impl MirrorPriorityReordered {
    pub fn new(work_id: Uuid, from: usize, to: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            work_id,
            from,
            to,
        }
    }
}

impl DomainEvent for MirrorPriorityReordered {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "MirrorPriorityReordered" }
}

/// Emitted when the user reorders scanlator priority
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupPriorityReordered {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub work_id: Uuid,
    pub from: usize,
    pub to: usize,
}

impl GroupPriorityReordered {
    pub fn new(work_id: Uuid, from: usize, to: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            work_id,
            from,
            to,
        }
    }
}

impl DomainEvent for GroupPriorityReordered {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "GroupPriorityReordered" }
}

// ============================================================================
// CHANGE PROPAGATION EVENTS
// ============================================================================

/// Emitted by every mutation path after persistence, carrying the set
/// of entities that changed. The reconciliation handler consumes this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitiesChanged {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub updated: Vec<EntityRef>,
}

impl EntitiesChanged {
    pub fn new(updated: Vec<EntityRef>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            updated,
        }
    }
}

impl DomainEvent for EntitiesChanged {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "EntitiesChanged" }
}

/// Emitted after a reconciliation pass completed for a Work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkReconciled {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub work_id: Uuid,
    pub mirror_entries: usize,
    pub group_entries: usize,
}

impl WorkReconciled {
    pub fn new(work_id: Uuid, mirror_entries: usize, group_entries: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            work_id,
            mirror_entries,
            group_entries,
        }
    }
}

impl DomainEvent for WorkReconciled {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "WorkReconciled" }
}
