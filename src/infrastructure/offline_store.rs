// src/infrastructure/offline_store.rs
//
// Offline Archive Boundary
//
// The archival collaborator downloads chapter pages and keys its
// storage by ChapterRecord id. This crate only asks two questions:
// is a chapter available offline, and where.
//
// RULES:
// - Archive contents are opaque to the engine
// - Storage is keyed by chapter id, which survives re-ingestion of an
//   unchanged (mirror, numero) pair

use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Availability questions the engine may ask of the archival collaborator
pub trait OfflineStore: Send + Sync {
    /// Whether this chapter's pages are archived on device
    fn is_available(&self, chapter_id: Uuid) -> bool;

    /// Retrieval handle for an archived chapter, if present
    fn archive_path(&self, chapter_id: Uuid) -> Option<PathBuf>;
}

/// Archive layout under the application data directory:
/// {APP_DATA}/mangahub/archive/{chapter_id}.cbz
pub struct LocalArchive {
    base_dir: PathBuf,
}

impl LocalArchive {
    /// Open the archive at the default application path
    pub fn new() -> AppResult<Self> {
        let app_data_dir = dirs::data_dir().ok_or_else(|| {
            AppError::Other("Could not determine app data directory".to_string())
        })?;
        Self::at(app_data_dir.join("mangahub").join("archive"))
    }

    /// Open the archive at an explicit directory (tests use a temp dir)
    pub fn at(base_dir: PathBuf) -> AppResult<Self> {
        std::fs::create_dir_all(&base_dir).map_err(AppError::Io)?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, chapter_id: Uuid) -> PathBuf {
        self.base_dir.join(format!("{}.cbz", chapter_id))
    }
}

impl OfflineStore for LocalArchive {
    fn is_available(&self, chapter_id: Uuid) -> bool {
        self.path_for(chapter_id).is_file()
    }

    fn archive_path(&self, chapter_id: Uuid) -> Option<PathBuf> {
        let path = self.path_for(chapter_id);
        path.is_file().then_some(path)
    }
}
