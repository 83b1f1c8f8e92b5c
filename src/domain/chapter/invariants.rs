use super::entity::ChapterRecord;
use crate::domain::{DomainError, DomainResult};

/// Validates all ChapterRecord invariants
pub fn validate_chapter(chapter: &ChapterRecord) -> DomainResult<()> {
    validate_progress(chapter)?;
    validate_attribution(chapter)?;
    Ok(())
}

/// Progress invariants:
/// 1. Progress stays within 0.0..=1.0
/// 2. Progress is a real number (NaN is rejected at the setter)
fn validate_progress(chapter: &ChapterRecord) -> DomainResult<()> {
    let p = chapter.progresso_leitura;
    if !(0.0..=1.0).contains(&p) || p.is_nan() {
        return Err(DomainError::InvalidProgress(p));
    }
    Ok(())
}

/// Attribution label must be present; ingest substitutes "Unknown" when
/// a source omits the scanlator
fn validate_attribution(chapter: &ChapterRecord) -> DomainResult<()> {
    if chapter.scanlator.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "ChapterRecord requires a non-empty attribution label".to_string(),
        ));
    }
    Ok(())
}

/// Critical ChapterRecord Invariants:
///
/// 1. ChapterRecord MUST belong to exactly one Mirror (mirror_id required)
/// 2. mirror_id is immutable (a record cannot change parent)
/// 3. Progress persists per physical record, not per logical chapter
/// 4. Records with equal `numero` on different mirrors are duplicates to
///    be resolved at unification time, never at ingest time
/// 5. Chapter ID is immutable
