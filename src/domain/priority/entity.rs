use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rank of one mirror within a Work's ordering (0 = preferred)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorPriorityEntry {
    pub mirror_id: Uuid,
    pub rank: u32,
}

/// Rank of one attribution label within a Work's ordering (0 = preferred)
/// origin_mirror_id points at the best-ranked mirror the label was
/// observed on, kept for display purposes only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPriorityEntry {
    pub label: String,
    pub origin_mirror_id: Uuid,
    pub rank: u32,
}

/// The priority table owned by one Work
///
/// Entries are held in ascending rank order. Only reconciliation and
/// the manual reorder operations mutate this table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityTable {
    pub mirror_entries: Vec<MirrorPriorityEntry>,
    pub group_entries: Vec<GroupPriorityEntry>,
}

impl PriorityTable {
    /// Rank of a mirror, if it has been reconciled into the table
    pub fn mirror_rank(&self, mirror_id: Uuid) -> Option<u32> {
        self.mirror_entries
            .iter()
            .find(|e| e.mirror_id == mirror_id)
            .map(|e| e.rank)
    }

    /// Rank of an attribution label, if it has been reconciled into the table
    pub fn group_rank(&self, label: &str) -> Option<u32> {
        self.group_entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.rank)
    }

    /// Renumber both entry lists densely 0..n in their current order
    pub fn renumber(&mut self) {
        for (i, entry) in self.mirror_entries.iter_mut().enumerate() {
            entry.rank = i as u32;
        }
        for (i, entry) in self.group_entries.iter_mut().enumerate() {
            entry.rank = i as u32;
        }
    }

    /// Check that ranks form a dense 0-based permutation in list order
    pub fn validate_density(&self) -> Result<(), String> {
        for (i, entry) in self.mirror_entries.iter().enumerate() {
            if entry.rank != i as u32 {
                return Err(format!(
                    "mirror rank {} at position {} is not dense",
                    entry.rank, i
                ));
            }
        }
        for (i, entry) in self.group_entries.iter().enumerate() {
            if entry.rank != i as u32 {
                return Err(format!(
                    "group rank {} at position {} is not dense",
                    entry.rank, i
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_renumber() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut table = PriorityTable {
            mirror_entries: vec![
                MirrorPriorityEntry { mirror_id: a, rank: 5 },
                MirrorPriorityEntry { mirror_id: b, rank: 9 },
            ],
            group_entries: vec![GroupPriorityEntry {
                label: "TeamX".to_string(),
                origin_mirror_id: a,
                rank: 3,
            }],
        };

        assert!(table.validate_density().is_err());
        table.renumber();
        assert!(table.validate_density().is_ok());

        assert_eq!(table.mirror_rank(a), Some(0));
        assert_eq!(table.mirror_rank(b), Some(1));
        assert_eq!(table.mirror_rank(Uuid::new_v4()), None);
        assert_eq!(table.group_rank("TeamX"), Some(0));
        assert_eq!(table.group_rank("TeamY"), None);
    }
}
