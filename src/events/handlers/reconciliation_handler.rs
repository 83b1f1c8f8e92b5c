// src/events/handlers/reconciliation_handler.rs
//
// Reconciliation Event Handler
//
// Event handler that listens to entity-change notifications and keeps
// every affected Work's priority table current. This is the bridge
// between the event bus and the reconciliation pass.
//
// CRITICAL RULES:
// - Only consumes EntitiesChanged events
// - Delegates the actual pass to reconcile_work
// - Reconciliation is idempotent, so redundant triggers are harmless
// - Handles errors gracefully without crashing the event bus
// - Uses closure-based subscription (the handler alias is internal to the bus)

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::events::types::{EntitiesChanged, EntityRef, WorkReconciled};
use crate::events::EventBus;
use crate::graph::LibraryGraph;
use crate::repositories::WorkRepository;
use crate::services::reconciliation_service::reconcile_work;

// ============================================================================
// HANDLER REGISTRATION
// ============================================================================

/// Registers the reconciliation handler with the event bus.
/// Uses closure-based subscription (the bus's handler type is internal).
pub fn register_reconciliation_handlers(
    bus: &EventBus,
    graph: Arc<RwLock<LibraryGraph>>,
    work_repo: Arc<dyn WorkRepository>,
) {
    let handler_bus = bus.clone();
    bus.subscribe::<EntitiesChanged, _>(move |event| {
        handle_entities_changed(&handler_bus, &graph, &work_repo, event);
    });

    println!("[RECONCILIATION] Handlers registered");
}

// ============================================================================
// ENTITIES CHANGED HANDLER
// ============================================================================

/// Handles EntitiesChanged by reconciling every flagged owning Work.
fn handle_entities_changed(
    bus: &EventBus,
    graph: &Arc<RwLock<LibraryGraph>>,
    work_repo: &Arc<dyn WorkRepository>,
    event: &EntitiesChanged,
) {
    let work_ids = resolve_owning_works(graph, &event.updated);

    for work_id in work_ids {
        let reconciled = {
            let mut graph = graph.write().unwrap();
            let needs_pass = graph.work(work_id).map(|w| w.precisa_reconciliacao);

            match needs_pass {
                None => {
                    // The work was removed after the notification was queued
                    log::warn!("change notification for unknown work {}", work_id);
                    None
                }
                Some(false) => None,
                Some(true) => match reconcile_work(&mut graph, work_id) {
                    Ok(()) => graph.work_mut(work_id).map(|work| {
                        work.clear_reconciliation_flag();
                        work.clone()
                    }),
                    Err(e) => {
                        eprintln!("[RECONCILIATION] Pass failed for {}: {}", work_id, e);
                        None
                    }
                },
            }
        };

        if let Some(work) = reconciled {
            println!(
                "[RECONCILIATION] Work {} reconciled: {} mirrors, {} groups",
                work.id,
                work.prioridades.mirror_entries.len(),
                work.prioridades.group_entries.len()
            );

            if let Err(e) = work_repo.save(&work) {
                eprintln!("[RECONCILIATION] Persist failed for {}: {}", work.id, e);
            }

            bus.emit(WorkReconciled::new(
                work.id,
                work.prioridades.mirror_entries.len(),
                work.prioridades.group_entries.len(),
            ));
        }
    }
}

/// Map updated entity refs to their owning works, deduplicated in
/// first-seen order
fn resolve_owning_works(
    graph: &Arc<RwLock<LibraryGraph>>,
    updated: &[EntityRef],
) -> Vec<Uuid> {
    let graph = graph.read().unwrap();
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut out: Vec<Uuid> = Vec::new();

    for entity in updated {
        let work_id = match entity {
            EntityRef::Work(id) => Some(*id),
            EntityRef::Mirror(id) => graph.work_of_mirror(*id),
            EntityRef::Chapter(id) => graph.work_of_chapter(*id),
        };
        if let Some(id) = work_id {
            if seen.insert(id) {
                out.push(id);
            }
        }
    }

    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mirror::Mirror;
    use crate::domain::work::Work;
    use crate::error::AppResult;
    use crate::repositories::WorkRepository;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullWorkRepository;

    impl WorkRepository for NullWorkRepository {
        fn save(&self, _work: &Work) -> AppResult<()> {
            Ok(())
        }
        fn get_by_id(&self, _id: Uuid) -> AppResult<Option<Work>> {
            Ok(None)
        }
        fn list_all(&self) -> AppResult<Vec<Work>> {
            Ok(Vec::new())
        }
        fn delete(&self, _id: Uuid) -> AppResult<()> {
            Ok(())
        }
    }

    fn graph_with_flagged_work() -> (Arc<RwLock<LibraryGraph>>, Uuid) {
        let mut graph = LibraryGraph::new();
        let work = Work::new("Berserk".to_string());
        let work_id = work.id;
        graph.insert_work(work);
        graph
            .attach_mirror(Mirror::new(work_id, "mangasee".to_string()))
            .unwrap();
        (Arc::new(RwLock::new(graph)), work_id)
    }

    #[test]
    fn test_flagged_work_is_reconciled_and_cleared() {
        let (graph, work_id) = graph_with_flagged_work();
        let bus = EventBus::new();
        register_reconciliation_handlers(&bus, Arc::clone(&graph), Arc::new(NullWorkRepository));

        assert!(graph.read().unwrap().work(work_id).unwrap().precisa_reconciliacao);

        bus.emit(EntitiesChanged::new(vec![EntityRef::Work(work_id)]));

        let g = graph.read().unwrap();
        let work = g.work(work_id).unwrap();
        assert!(!work.precisa_reconciliacao);
        assert_eq!(work.prioridades.mirror_entries.len(), 1);
    }

    #[test]
    fn test_redundant_trigger_is_harmless() {
        let (graph, work_id) = graph_with_flagged_work();
        let bus = EventBus::new();
        register_reconciliation_handlers(&bus, Arc::clone(&graph), Arc::new(NullWorkRepository));

        let passes = Arc::new(AtomicUsize::new(0));
        let passes_clone = Arc::clone(&passes);
        bus.subscribe::<WorkReconciled, _>(move |_| {
            passes_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(EntitiesChanged::new(vec![EntityRef::Work(work_id)]));
        let table = graph.read().unwrap().work(work_id).unwrap().prioridades.clone();

        // Flag already cleared: the second notification does nothing
        bus.emit(EntitiesChanged::new(vec![EntityRef::Work(work_id)]));

        assert_eq!(passes.load(Ordering::SeqCst), 1);
        assert_eq!(
            graph.read().unwrap().work(work_id).unwrap().prioridades,
            table
        );
    }

    #[test]
    fn test_mirror_ref_resolves_to_owning_work() {
        let (graph, work_id) = graph_with_flagged_work();
        let mirror_id = graph.read().unwrap().mirror_order(work_id)[0];
        let bus = EventBus::new();
        register_reconciliation_handlers(&bus, Arc::clone(&graph), Arc::new(NullWorkRepository));

        bus.emit(EntitiesChanged::new(vec![EntityRef::Mirror(mirror_id)]));

        assert!(!graph.read().unwrap().work(work_id).unwrap().precisa_reconciliacao);
    }

    #[test]
    fn test_unknown_work_does_not_crash() {
        let (graph, _) = graph_with_flagged_work();
        let bus = EventBus::new();
        register_reconciliation_handlers(&bus, Arc::clone(&graph), Arc::new(NullWorkRepository));

        bus.emit(EntitiesChanged::new(vec![EntityRef::Work(Uuid::new_v4())]));
    }
}
