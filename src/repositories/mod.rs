// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO invariant enforcement
// - NO event emission
// - NO cross-repository calls
// - Explicit SQL only

pub mod chapter_repository;
pub mod mirror_repository;
pub mod work_repository;

pub use chapter_repository::{ChapterRepository, SqliteChapterRepository};
pub use mirror_repository::{MirrorRepository, SqliteMirrorRepository};
pub use work_repository::{SqliteWorkRepository, WorkRepository};
