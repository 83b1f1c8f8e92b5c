// src/services/reconciliation_service_tests.rs
//
// UNIT TESTS: Reconciliation Properties
//
// PURPOSE:
// - Prove reconciliation is idempotent: same graph → same table
// - Prove stability: adding a mirror never re-ranks existing entries
// - Prove pruning: entries for removed mirrors and vanished labels go away
// - Prove manual reorder round-trips to a dense permutation
//
// INVARIANTS TESTED:
// - reconcile(reconcile(work)) == reconcile(work)
// - Ranks are a dense 0-based permutation after every pass
// - New mirrors append in attach order
// - New labels append in (best mirror rank, first-seen index) order

#[cfg(test)]
mod reconciliation_tests {
    use crate::domain::chapter::{ChapterNumber, ChapterRecord};
    use crate::domain::mirror::Mirror;
    use crate::domain::work::Work;
    use crate::graph::LibraryGraph;
    use crate::services::reconciliation_service::reconcile_work;
    use chrono::Utc;
    use uuid::Uuid;

    fn chapter(mirror_id: Uuid, numero: f64, scanlator: &str) -> ChapterRecord {
        ChapterRecord::new(
            mirror_id,
            ChapterNumber::from_f64(numero),
            scanlator.to_string(),
            Utc::now(),
        )
    }

    fn attach(graph: &mut LibraryGraph, work_id: Uuid, fonte: &str) -> Uuid {
        let mirror = Mirror::new(work_id, fonte.to_string());
        let id = mirror.id;
        graph.attach_mirror(mirror).unwrap();
        id
    }

    /// Work with two mirrors: A carries TeamX, B carries TeamY
    fn two_mirror_graph() -> (LibraryGraph, Uuid, Uuid, Uuid) {
        let mut graph = LibraryGraph::new();
        let work = Work::new("Berserk".to_string());
        let work_id = work.id;
        graph.insert_work(work);

        let a = attach(&mut graph, work_id, "mangasee");
        let b = attach(&mut graph, work_id, "mangadex");
        graph
            .ingest_chapters(a, vec![chapter(a, 5.0, "TeamX")])
            .unwrap();
        graph
            .ingest_chapters(b, vec![chapter(b, 5.0, "TeamY"), chapter(b, 5.5, "TeamY")])
            .unwrap();

        reconcile_work(&mut graph, work_id).unwrap();
        (graph, work_id, a, b)
    }

    #[test]
    fn test_reconciliation_is_idempotent() {
        let (mut graph, work_id, _, _) = two_mirror_graph();

        let first = graph.work(work_id).unwrap().prioridades.clone();
        reconcile_work(&mut graph, work_id).unwrap();
        let second = graph.work(work_id).unwrap().prioridades.clone();

        assert_eq!(first, second);
    }

    #[test]
    fn test_mirrors_rank_in_attach_order() {
        let (graph, work_id, a, b) = two_mirror_graph();

        let table = &graph.work(work_id).unwrap().prioridades;
        assert_eq!(table.mirror_rank(a), Some(0));
        assert_eq!(table.mirror_rank(b), Some(1));
        assert!(table.validate_density().is_ok());
    }

    #[test]
    fn test_adding_a_mirror_never_reranks_existing_entries() {
        let (mut graph, work_id, a, b) = two_mirror_graph();

        let c = attach(&mut graph, work_id, "comick");
        graph
            .ingest_chapters(c, vec![chapter(c, 6.0, "TeamZ")])
            .unwrap();
        reconcile_work(&mut graph, work_id).unwrap();

        let table = &graph.work(work_id).unwrap().prioridades;
        assert_eq!(table.mirror_rank(a), Some(0));
        assert_eq!(table.mirror_rank(b), Some(1));
        assert_eq!(table.mirror_rank(c), Some(2));

        assert_eq!(table.group_rank("TeamX"), Some(0));
        assert_eq!(table.group_rank("TeamY"), Some(1));
        assert_eq!(table.group_rank("TeamZ"), Some(2));
    }

    #[test]
    fn test_removing_a_mirror_prunes_and_renumbers() {
        let (mut graph, work_id, a, b) = two_mirror_graph();

        graph.remove_mirror(work_id, a).unwrap();
        reconcile_work(&mut graph, work_id).unwrap();

        let table = &graph.work(work_id).unwrap().prioridades;
        assert_eq!(table.mirror_rank(a), None);
        assert_eq!(table.mirror_rank(b), Some(0));

        // TeamX only existed on A: pruned; TeamY renumbered to 0
        assert_eq!(table.group_rank("TeamX"), None);
        assert_eq!(table.group_rank("TeamY"), Some(0));
        assert!(table.validate_density().is_ok());
    }

    #[test]
    fn test_new_labels_order_by_best_mirror_rank_then_first_seen() {
        let mut graph = LibraryGraph::new();
        let work = Work::new("Vagabond".to_string());
        let work_id = work.id;
        graph.insert_work(work);

        let a = attach(&mut graph, work_id, "mangasee");
        let b = attach(&mut graph, work_id, "mangadex");

        // A sees TeamB before TeamA; B sees TeamC first but ranks below A
        graph
            .ingest_chapters(
                a,
                vec![chapter(a, 1.0, "TeamB"), chapter(a, 2.0, "TeamA")],
            )
            .unwrap();
        graph
            .ingest_chapters(b, vec![chapter(b, 1.0, "TeamC")])
            .unwrap();
        reconcile_work(&mut graph, work_id).unwrap();

        let table = &graph.work(work_id).unwrap().prioridades;
        assert_eq!(table.group_rank("TeamB"), Some(0));
        assert_eq!(table.group_rank("TeamA"), Some(1));
        assert_eq!(table.group_rank("TeamC"), Some(2));
    }

    #[test]
    fn test_reobserved_label_keeps_rank_but_updates_origin() {
        let (mut graph, work_id, a, b) = two_mirror_graph();

        let table = &graph.work(work_id).unwrap().prioridades;
        let entry = table
            .group_entries
            .iter()
            .find(|e| e.label == "TeamY")
            .unwrap()
            .clone();
        assert_eq!(entry.origin_mirror_id, b);

        // TeamY now also publishes on the preferred mirror A
        graph
            .ingest_chapters(
                a,
                vec![chapter(a, 5.0, "TeamX"), chapter(a, 6.0, "TeamY")],
            )
            .unwrap();
        reconcile_work(&mut graph, work_id).unwrap();

        let table = &graph.work(work_id).unwrap().prioridades;
        let updated = table
            .group_entries
            .iter()
            .find(|e| e.label == "TeamY")
            .unwrap();
        assert_eq!(updated.rank, entry.rank, "rank changes only when newly introduced");
        assert_eq!(updated.origin_mirror_id, a, "display origin follows the best mirror");
    }
}

#[cfg(test)]
mod reorder_tests {
    use crate::domain::chapter::{ChapterNumber, ChapterRecord};
    use crate::domain::mirror::Mirror;
    use crate::domain::work::Work;
    use crate::domain::DomainError;
    use crate::error::AppError;
    use crate::events::EventBus;
    use crate::graph::LibraryGraph;
    use crate::repositories::work_repository::MockWorkRepository;
    use crate::services::reconciliation_service::{reconcile_work, ReconciliationService};
    use chrono::Utc;
    use std::sync::{Arc, RwLock};
    use uuid::Uuid;

    fn service_with_three_mirrors() -> (ReconciliationService, Arc<RwLock<LibraryGraph>>, Uuid, Vec<Uuid>) {
        let mut graph = LibraryGraph::new();
        let work = Work::new("Berserk".to_string());
        let work_id = work.id;
        graph.insert_work(work);

        let mut mirror_ids = Vec::new();
        for fonte in ["mangasee", "mangadex", "comick"] {
            let mirror = Mirror::new(work_id, fonte.to_string());
            mirror_ids.push(mirror.id);
            graph.attach_mirror(mirror).unwrap();
        }
        for (i, mirror_id) in mirror_ids.iter().enumerate() {
            graph
                .ingest_chapters(
                    *mirror_id,
                    vec![ChapterRecord::new(
                        *mirror_id,
                        ChapterNumber::from_f64(1.0),
                        format!("Team{}", i),
                        Utc::now(),
                    )],
                )
                .unwrap();
        }
        reconcile_work(&mut graph, work_id).unwrap();

        let graph = Arc::new(RwLock::new(graph));
        let mut work_repo = MockWorkRepository::new();
        work_repo.expect_save().returning(|_| Ok(()));

        let service = ReconciliationService::new(
            Arc::clone(&graph),
            Arc::new(work_repo),
            Arc::new(EventBus::new()),
        );
        (service, graph, work_id, mirror_ids)
    }

    #[test]
    fn test_mirror_reorder_round_trip() {
        let (service, graph, work_id, mirror_ids) = service_with_three_mirrors();

        service.move_mirror_priority(work_id, 0, 2).unwrap();

        let table = graph.read().unwrap().work(work_id).unwrap().prioridades.clone();
        assert!(table.validate_density().is_ok());
        // Moved entry sits at destination index; the others shifted left
        assert_eq!(table.mirror_entries[2].mirror_id, mirror_ids[0]);
        assert_eq!(table.mirror_entries[0].mirror_id, mirror_ids[1]);
        assert_eq!(table.mirror_entries[1].mirror_id, mirror_ids[2]);
    }

    #[test]
    fn test_group_reorder_round_trip() {
        let (service, graph, work_id, _) = service_with_three_mirrors();

        service.move_group_priority(work_id, 2, 0).unwrap();

        let table = graph.read().unwrap().work(work_id).unwrap().prioridades.clone();
        assert!(table.validate_density().is_ok());
        assert_eq!(table.group_entries[0].label, "Team2");
        assert_eq!(table.group_entries[1].label, "Team0");
        assert_eq!(table.group_entries[2].label, "Team1");
    }

    #[test]
    fn test_reorder_out_of_bounds_is_rejected() {
        let (service, graph, work_id, mirror_ids) = service_with_three_mirrors();

        let result = service.move_mirror_priority(work_id, 0, 3);
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::InvalidRange { .. }))
        ));

        // Table untouched on rejection
        let table = graph.read().unwrap().work(work_id).unwrap().prioridades.clone();
        assert_eq!(table.mirror_entries[0].mirror_id, mirror_ids[0]);
    }

    #[test]
    fn test_reconciliation_preserves_manual_order() {
        let (service, graph, work_id, mirror_ids) = service_with_three_mirrors();

        service.move_mirror_priority(work_id, 2, 0).unwrap();
        {
            let mut graph = graph.write().unwrap();
            reconcile_work(&mut graph, work_id).unwrap();
        }

        let table = graph.read().unwrap().work(work_id).unwrap().prioridades.clone();
        assert_eq!(table.mirror_entries[0].mirror_id, mirror_ids[2]);
        assert_eq!(table.mirror_entries[1].mirror_id, mirror_ids[0]);
        assert_eq!(table.mirror_entries[2].mirror_id, mirror_ids[1]);
    }

    #[test]
    fn test_reorder_on_unknown_work_is_rejected() {
        let (service, _, _, _) = service_with_three_mirrors();

        let result = service.move_mirror_priority(Uuid::new_v4(), 0, 1);
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::NotFound(_)))
        ));
    }
}
