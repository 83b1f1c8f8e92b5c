// src/services/reconciliation_service.rs
//
// Reconciliation Service
//
// Derives and maintains a Work's priority table from the current entity
// graph state, without discarding user-chosen manual ordering.
//
// CRITICAL RULES:
// - Idempotent: a second pass over an unchanged graph yields the
//   identical table
// - Stable: entries that survive a pass keep their relative order;
//   an unrelated mirror addition never reorders existing entries
// - New mirrors append in graph attach order
// - New labels append in (best mirror rank, first-seen index) order
// - Labels absent from every mirror are pruned
// - Manual reorder is the only other operation allowed to change
//   relative rank between two still-present entries

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::domain::priority::{GroupPriorityEntry, MirrorPriorityEntry, PriorityTable};
use crate::domain::{DomainError, DomainResult};
use crate::error::AppResult;
use crate::events::{EventBus, GroupPriorityReordered, MirrorPriorityReordered, WorkReconciled};
use crate::graph::LibraryGraph;
use crate::repositories::WorkRepository;

// ============================================================================
// RECONCILIATION (PURE, GRAPH-LEVEL)
// ============================================================================

/// Recompute the priority table of one Work from the graph
///
/// Total over a valid graph: the only failure mode is an unknown work id.
pub fn reconcile_work(graph: &mut LibraryGraph, work_id: Uuid) -> DomainResult<()> {
    let old_table = graph
        .work(work_id)
        .ok_or_else(|| DomainError::NotFound(format!("work {}", work_id)))?
        .prioridades
        .clone();
    let attach_order: Vec<Uuid> = graph.mirror_order(work_id).to_vec();

    let mut table = PriorityTable {
        mirror_entries: reconcile_mirrors(&old_table, &attach_order),
        group_entries: Vec::new(),
    };
    table.group_entries = reconcile_groups(graph, &old_table, &table.mirror_entries);
    table.renumber();

    let work = graph
        .work_mut(work_id)
        .ok_or_else(|| DomainError::NotFound(format!("work {}", work_id)))?;
    work.prioridades = table;
    Ok(())
}

/// Mirror pass: keep survivors in prior rank order, append newcomers in
/// attach order
fn reconcile_mirrors(
    old_table: &PriorityTable,
    attach_order: &[Uuid],
) -> Vec<MirrorPriorityEntry> {
    let live: HashSet<Uuid> = attach_order.iter().copied().collect();

    let mut entries: Vec<MirrorPriorityEntry> = old_table
        .mirror_entries
        .iter()
        .filter(|e| live.contains(&e.mirror_id))
        .cloned()
        .collect();

    let ranked: HashSet<Uuid> = entries.iter().map(|e| e.mirror_id).collect();
    for mirror_id in attach_order {
        if !ranked.contains(mirror_id) {
            entries.push(MirrorPriorityEntry {
                mirror_id: *mirror_id,
                rank: 0, // dense renumber happens at the end of the pass
            });
        }
    }

    entries
}

/// Group pass: per mirror (ascending new rank), first-seen labels in
/// ingestion order establish a candidate key per label
fn reconcile_groups(
    graph: &LibraryGraph,
    old_table: &PriorityTable,
    mirror_entries: &[MirrorPriorityEntry],
) -> Vec<GroupPriorityEntry> {
    // label -> (best mirror rank, first-seen index on that mirror, mirror id)
    let mut candidates: HashMap<String, (u32, usize, Uuid)> = HashMap::new();

    for (rank, entry) in mirror_entries.iter().enumerate() {
        let mut seen_on_mirror: HashSet<String> = HashSet::new();
        let mut insertion_index = 0usize;

        for chapter in graph.chapters_of(entry.mirror_id) {
            if !seen_on_mirror.insert(chapter.scanlator.clone()) {
                continue;
            }
            let key = (rank as u32, insertion_index, entry.mirror_id);
            insertion_index += 1;

            match candidates.get(&chapter.scanlator) {
                Some(existing) if (existing.0, existing.1) <= (key.0, key.1) => {}
                _ => {
                    candidates.insert(chapter.scanlator.clone(), key);
                }
            }
        }
    }

    // Survivors retain rank order; only the display origin is refreshed
    let mut entries: Vec<GroupPriorityEntry> = old_table
        .group_entries
        .iter()
        .filter_map(|e| {
            candidates.get(&e.label).map(|(_, _, mirror_id)| GroupPriorityEntry {
                label: e.label.clone(),
                origin_mirror_id: *mirror_id,
                rank: e.rank,
            })
        })
        .collect();

    // Newly observed labels append after all existing ranks
    let known: HashSet<&str> = entries.iter().map(|e| e.label.as_str()).collect();
    let mut fresh: Vec<(&String, &(u32, usize, Uuid))> = candidates
        .iter()
        .filter(|(label, _)| !known.contains(label.as_str()))
        .collect();
    fresh.sort_by_key(|(_, (rank, index, _))| (*rank, *index));

    for (label, (_, _, mirror_id)) in fresh {
        entries.push(GroupPriorityEntry {
            label: label.clone(),
            origin_mirror_id: *mirror_id,
            rank: 0, // dense renumber happens at the end of the pass
        });
    }

    entries
}

// ============================================================================
// RECONCILIATION SERVICE
// ============================================================================

pub struct ReconciliationService {
    graph: Arc<RwLock<LibraryGraph>>,
    work_repo: Arc<dyn WorkRepository>,
    event_bus: Arc<EventBus>,
}

impl ReconciliationService {
    pub fn new(
        graph: Arc<RwLock<LibraryGraph>>,
        work_repo: Arc<dyn WorkRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            graph,
            work_repo,
            event_bus,
        }
    }

    /// Run a reconciliation pass for one Work, unconditionally
    ///
    /// Normal operation goes through change propagation; this entry
    /// point exists for hydration and explicit repair.
    pub fn reconcile_now(&self, work_id: Uuid) -> AppResult<()> {
        let work = {
            let mut graph = self.graph.write().unwrap();
            reconcile_work(&mut graph, work_id)?;
            let work = graph
                .work_mut(work_id)
                .ok_or_else(|| DomainError::NotFound(format!("work {}", work_id)))?;
            work.clear_reconciliation_flag();
            work.clone()
        };

        self.work_repo.save(&work)?;
        self.event_bus.emit(WorkReconciled::new(
            work.id,
            work.prioridades.mirror_entries.len(),
            work.prioridades.group_entries.len(),
        ));
        Ok(())
    }

    /// Move one mirror priority entry from index `from` to index `to`
    ///
    /// Standard array-move semantics (remove then insert), followed by
    /// a dense renumber.
    pub fn move_mirror_priority(&self, work_id: Uuid, from: usize, to: usize) -> AppResult<()> {
        let work = {
            let mut graph = self.graph.write().unwrap();
            let work = graph
                .work_mut(work_id)
                .ok_or_else(|| DomainError::NotFound(format!("work {}", work_id)))?;

            let entries = &mut work.prioridades.mirror_entries;
            check_range(from, to, entries.len())?;
            let entry = entries.remove(from);
            entries.insert(to, entry);
            work.prioridades.renumber();
            work.clone()
        };

        self.work_repo.save(&work)?;
        self.event_bus
            .emit(MirrorPriorityReordered::new(work_id, from, to));
        Ok(())
    }

    /// Move one group priority entry from index `from` to index `to`
    pub fn move_group_priority(&self, work_id: Uuid, from: usize, to: usize) -> AppResult<()> {
        let work = {
            let mut graph = self.graph.write().unwrap();
            let work = graph
                .work_mut(work_id)
                .ok_or_else(|| DomainError::NotFound(format!("work {}", work_id)))?;

            let entries = &mut work.prioridades.group_entries;
            check_range(from, to, entries.len())?;
            let entry = entries.remove(from);
            entries.insert(to, entry);
            work.prioridades.renumber();
            work.clone()
        };

        self.work_repo.save(&work)?;
        self.event_bus
            .emit(GroupPriorityReordered::new(work_id, from, to));
        Ok(())
    }

    /// Snapshot of a work's current priority table
    pub fn priority_table(&self, work_id: Uuid) -> AppResult<PriorityTable> {
        let graph = self.graph.read().unwrap();
        let work = graph
            .work(work_id)
            .ok_or_else(|| DomainError::NotFound(format!("work {}", work_id)))?;
        Ok(work.prioridades.clone())
    }
}

fn check_range(from: usize, to: usize, len: usize) -> DomainResult<()> {
    if from >= len || to >= len {
        return Err(DomainError::InvalidRange { from, to, len });
    }
    Ok(())
}

// Keeps the service clonable the way the event bus is shared
impl Clone for ReconciliationService {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            work_repo: Arc::clone(&self.work_repo),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}
