use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents one source's listing of a Work
/// A mirror contributes its own chapter list; the same logical chapters
/// may appear on several mirrors of the same work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mirror {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Reference to parent Work (REQUIRED)
    pub work_id: Uuid,

    /// Globally-scoped source identity (which scanlation/aggregation
    /// service this listing came from)
    pub fonte: String,

    /// Creation timestamp
    pub criado_em: DateTime<Utc>,

    /// Last update timestamp
    pub atualizado_em: DateTime<Utc>,
}

impl Mirror {
    /// Create a new Mirror
    /// work_id MUST be valid (checked by caller)
    pub fn new(work_id: Uuid, fonte: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            work_id,
            fonte,
            criado_em: now,
            atualizado_em: now,
        }
    }
}

impl std::fmt::Display for Mirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.fonte, self.id)
    }
}
