use super::entity::Mirror;
use crate::domain::{DomainError, DomainResult};

/// Validates all Mirror invariants
pub fn validate_mirror(mirror: &Mirror) -> DomainResult<()> {
    if mirror.fonte.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Mirror requires a non-empty source identity".to_string(),
        ));
    }
    Ok(())
}

/// Critical Mirror Invariants:
///
/// 1. Mirror MUST belong to exactly one Work (work_id required)
/// 2. work_id is immutable (a mirror cannot change parent)
/// 3. Source identity is unique among the mirrors of one Work
/// 4. Display rank lives only in the Work's PriorityTable, never on
///    the mirror itself
/// 5. Removing a mirror cascades: its chapters are deleted and its
///    priority entries are pruned by the triggered reconciliation

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_valid_mirror() {
        let mirror = Mirror::new(Uuid::new_v4(), "mangasee".to_string());
        assert!(validate_mirror(&mirror).is_ok());
    }

    #[test]
    fn test_empty_source_fails() {
        let mirror = Mirror::new(Uuid::new_v4(), "".to_string());
        assert!(validate_mirror(&mirror).is_err());
    }
}
