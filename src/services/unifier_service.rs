// src/services/unifier_service.rs
//
// Unifier Service
//
// Produces the chapter sequence a user sees: collect every record of a
// work, apply the display policy, deduplicate by chapter number using
// the priority table, sort.
//
// CRITICAL RULES:
// - unify is pure over a graph snapshot: no side effects, no I/O
// - A record missing from either priority table ranks last, never
//   promoted over a ranked record
// - mark_range is the single write-back path from the unified sequence
//   to the underlying records
// - Change propagation reconciles before mutations return, so a unify
//   that follows a mutation reads a current table

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::domain::chapter::{ChapterNumber, ChapterRecord};
use crate::domain::priority::PriorityTable;
use crate::domain::unified::{ChapterView, MarkDirection};
use crate::domain::work::{DisplayPolicy, SortDirection, SortKey};
use crate::error::{AppError, AppResult};
use crate::events::{ChapterProgressUpdated, EventBus};
use crate::graph::LibraryGraph;
use crate::repositories::ChapterRepository;

// ============================================================================
// UNIFICATION (PURE, GRAPH-LEVEL)
// ============================================================================

/// Rank pair used for canonical selection; missing entries rank last
fn rank_pair(record: &ChapterRecord, table: &PriorityTable) -> (u32, u32) {
    (
        table.mirror_rank(record.mirror_id).unwrap_or(u32::MAX),
        table.group_rank(&record.scanlator).unwrap_or(u32::MAX),
    )
}

/// Unify a collection of records under one policy and priority table
///
/// `records` must arrive in deterministic collection order (mirror
/// attach order, then ingestion order); full rank ties keep the first
/// record of the group.
pub fn unify_records(
    records: &[&ChapterRecord],
    table: &PriorityTable,
    policy: &DisplayPolicy,
) -> Vec<ChapterView> {
    // Half-chapter filter
    let filtered: Vec<&ChapterRecord> = records
        .iter()
        .copied()
        .filter(|r| policy.incluir_meios_capitulos || r.numero.is_whole())
        .collect();

    let mut views: Vec<ChapterView> = if policy.mostrar_duplicatas {
        // No merging: duplicates are shown side by side
        filtered.iter().map(|r| ChapterView::from_record(r)).collect()
    } else {
        // Group by exact numeric equality, keep one canonical record each
        let mut groups: Vec<(ChapterNumber, Vec<&ChapterRecord>)> = Vec::new();
        let mut index: HashMap<ChapterNumber, usize> = HashMap::new();
        for &record in &filtered {
            match index.get(&record.numero) {
                Some(&i) => groups[i].1.push(record),
                None => {
                    index.insert(record.numero, groups.len());
                    groups.push((record.numero, vec![record]));
                }
            }
        }

        groups
            .into_iter()
            .map(|(_, group)| {
                let mut best = group[0];
                for &candidate in &group[1..] {
                    if rank_pair(candidate, table) < rank_pair(best, table) {
                        best = candidate;
                    }
                }
                ChapterView::from_record(best)
            })
            .collect()
    };

    sort_views(&mut views, table, policy);
    views
}

/// Sort by the policy's key and direction; date ties break by chapter
/// number in the same direction; duplicate-number ties order by mirror
/// rank ascending
fn sort_views(views: &mut [ChapterView], table: &PriorityTable, policy: &DisplayPolicy) {
    views.sort_by(|a, b| {
        let keyed = match policy.chave_ordenacao {
            SortKey::Numero => a.display_number.cmp(&b.display_number),
            SortKey::Data => a
                .timestamp
                .cmp(&b.timestamp)
                .then(a.display_number.cmp(&b.display_number)),
        };
        let directed = match policy.direcao_ordenacao {
            SortDirection::Ascendente => keyed,
            SortDirection::Descendente => keyed.reverse(),
        };
        directed.then_with(|| {
            let rank_a = table.mirror_rank(a.owning_mirror_id).unwrap_or(u32::MAX);
            let rank_b = table.mirror_rank(b.owning_mirror_id).unwrap_or(u32::MAX);
            rank_a.cmp(&rank_b)
        })
    });
}

/// Index of the "continue reading" entry in a displayed sequence
///
/// First unfinished record scanning in ascending chapter-number order
/// (the tail of a descending list toward the head): the
/// least-recently-available unfinished chapter. None when everything
/// is finished.
pub fn continue_index(sequence: &[ChapterView]) -> Option<usize> {
    let mut order: Vec<usize> = (0..sequence.len()).collect();
    order.sort_by(|&a, &b| {
        sequence[a]
            .display_number
            .cmp(&sequence[b].display_number)
            .then(b.cmp(&a))
    });
    order.into_iter().find(|&i| sequence[i].progress < 1.0)
}

// ============================================================================
// UNIFIER SERVICE
// ============================================================================

pub struct UnifierService {
    graph: Arc<RwLock<LibraryGraph>>,
    chapter_repo: Arc<dyn ChapterRepository>,
    event_bus: Arc<EventBus>,
}

impl UnifierService {
    pub fn new(
        graph: Arc<RwLock<LibraryGraph>>,
        chapter_repo: Arc<dyn ChapterRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            graph,
            chapter_repo,
            event_bus,
        }
    }

    /// Produce the unified chapter sequence for a work
    pub fn unify(&self, work_id: Uuid) -> AppResult<Vec<ChapterView>> {
        let graph = self.graph.read().unwrap();
        let work = graph
            .work(work_id)
            .ok_or_else(|| AppError::NotFound(format!("work {}", work_id)))?;

        if work.precisa_reconciliacao {
            // Propagation should have run before any read; a set flag
            // here means a missed trigger upstream
            log::warn!(
                "unify read work {} with a pending reconciliation flag",
                work_id
            );
        }

        let mut records: Vec<&ChapterRecord> = Vec::new();
        for mirror_id in graph.mirror_order(work_id) {
            records.extend(graph.chapters_of(*mirror_id));
        }

        Ok(unify_records(&records, &work.prioridades, &work.politica))
    }

    /// Bulk progress update over one side of an anchor, inclusive
    ///
    /// This is the one place unified output is written back to the
    /// underlying records. Returns the ids of every record updated.
    pub fn mark_range(
        &self,
        sequence: &[ChapterView],
        anchor_id: Uuid,
        direction: MarkDirection,
        is_read: bool,
    ) -> AppResult<Vec<Uuid>> {
        let anchor = sequence
            .iter()
            .position(|v| v.id == anchor_id)
            .ok_or_else(|| AppError::NotFound(format!("anchor chapter {}", anchor_id)))?;

        let range = match direction {
            MarkDirection::TowardStart => 0..anchor + 1,
            MarkDirection::TowardEnd => anchor..sequence.len(),
        };
        let progresso = if is_read { 1.0 } else { 0.0 };

        let mut updated: Vec<(Uuid, Uuid)> = Vec::with_capacity(range.len());
        {
            let mut graph = self.graph.write().unwrap();
            for view in &sequence[range] {
                graph.set_progress(view.id, progresso)?;
                updated.push((view.id, view.owning_mirror_id));
            }
        }

        for (chapter_id, mirror_id) in &updated {
            self.chapter_repo.update_progress(*chapter_id, progresso)?;
            self.event_bus
                .emit(ChapterProgressUpdated::new(*chapter_id, *mirror_id, progresso));
        }

        Ok(updated.into_iter().map(|(id, _)| id).collect())
    }
}

impl Clone for UnifierService {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            chapter_repo: Arc::clone(&self.chapter_repo),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}
