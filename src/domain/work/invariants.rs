use super::entity::Work;
use crate::domain::{DomainError, DomainResult};

/// Validates all Work invariants
pub fn validate_work(work: &Work) -> DomainResult<()> {
    if work.titulo_principal.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Work requires a non-empty primary title".to_string(),
        ));
    }
    work.prioridades.validate_density().map_err(|msg| {
        DomainError::InvariantViolation(format!("Work {}: {}", work.id, msg))
    })?;
    Ok(())
}

/// Critical Work Invariants:
///
/// 1. A published Work has at least one Mirror; zero mirrors is a
///    transient state only (enforced at the remove_mirror boundary)
/// 2. The PriorityTable is mutated only by reconciliation and the
///    manual reorder operations
/// 3. Priority ranks are a dense 0-based permutation at rest
/// 4. precisa_reconciliacao is advisory: redundant triggers are
///    harmless, a missed trigger costs exactly one derivation
/// 5. Work ID is immutable

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::priority::MirrorPriorityEntry;
    use uuid::Uuid;

    #[test]
    fn test_valid_work() {
        let work = Work::new("Berserk".to_string());
        assert!(validate_work(&work).is_ok());
    }

    #[test]
    fn test_empty_title_fails() {
        let work = Work::new("   ".to_string());
        assert!(validate_work(&work).is_err());
    }

    #[test]
    fn test_sparse_ranks_fail() {
        let mut work = Work::new("Berserk".to_string());
        work.prioridades.mirror_entries = vec![
            MirrorPriorityEntry { mirror_id: Uuid::new_v4(), rank: 0 },
            MirrorPriorityEntry { mirror_id: Uuid::new_v4(), rank: 2 },
        ];
        assert!(validate_work(&work).is_err());
    }
}
