// src/graph/library_graph.rs
//
// Entity Graph - in-memory arena of Work / Mirror / ChapterRecord
//
// CRITICAL RULES:
// - Entities are keyed by Uuid; children hold only the parent's id
//   (no direct references, no cycles)
// - Mirror attach order and chapter ingestion order are part of the
//   graph state; reconciliation depends on both
// - Every mutation that alters mirror membership or chapter lists
//   flags the owning Work for reconciliation
// - Referential integrity is enforced here, not by callers

use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::chapter::ChapterRecord;
use crate::domain::mirror::Mirror;
use crate::domain::work::Work;
use crate::domain::{DomainError, DomainResult};

/// Outcome of replacing a mirror's chapter list with fetched data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Records in the mirror's list after ingest
    pub total: usize,

    /// Records that did not exist before (new (mirror, numero) pairs)
    pub novos: usize,

    /// Records whose identity and progress were carried over
    pub preservados: usize,
}

/// The in-memory entity graph
///
/// Single shared mutable resource of the engine. Callers wrap it in
/// `Arc<RwLock<LibraryGraph>>`: mutations take the write lock, unify
/// takes the read lock, and the lock is never held across persistence
/// or event emission.
#[derive(Debug, Default)]
pub struct LibraryGraph {
    works: HashMap<Uuid, Work>,
    mirrors: HashMap<Uuid, Mirror>,
    chapters: HashMap<Uuid, ChapterRecord>,

    /// Mirror ids per work, in attach order
    work_mirrors: HashMap<Uuid, Vec<Uuid>>,

    /// Chapter ids per mirror, in ingestion order
    mirror_chapters: HashMap<Uuid, Vec<Uuid>>,
}

impl LibraryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // WORKS
    // ========================================================================

    /// Insert a Work into the graph
    pub fn insert_work(&mut self, work: Work) {
        self.work_mirrors.entry(work.id).or_default();
        self.works.insert(work.id, work);
    }

    /// Remove a Work and everything it owns
    pub fn remove_work(&mut self, work_id: Uuid) -> DomainResult<Work> {
        let work = self
            .works
            .remove(&work_id)
            .ok_or_else(|| DomainError::NotFound(format!("work {}", work_id)))?;

        for mirror_id in self.work_mirrors.remove(&work_id).unwrap_or_default() {
            self.mirrors.remove(&mirror_id);
            for chapter_id in self.mirror_chapters.remove(&mirror_id).unwrap_or_default() {
                self.chapters.remove(&chapter_id);
            }
        }

        Ok(work)
    }

    pub fn work(&self, work_id: Uuid) -> Option<&Work> {
        self.works.get(&work_id)
    }

    pub fn work_mut(&mut self, work_id: Uuid) -> Option<&mut Work> {
        self.works.get_mut(&work_id)
    }

    pub fn works(&self) -> impl Iterator<Item = &Work> {
        self.works.values()
    }

    // ========================================================================
    // MIRRORS
    // ========================================================================

    /// Attach a Mirror to its Work, appending in attach order
    ///
    /// Fails with DuplicateMirror if the work already has a mirror with
    /// the same source identity. Flags the work for reconciliation.
    pub fn attach_mirror(&mut self, mirror: Mirror) -> DomainResult<()> {
        let work_id = mirror.work_id;
        if !self.works.contains_key(&work_id) {
            return Err(DomainError::NotFound(format!("work {}", work_id)));
        }

        let order = self.work_mirrors.entry(work_id).or_default();
        let duplicate = order
            .iter()
            .filter_map(|id| self.mirrors.get(id))
            .any(|m| m.fonte == mirror.fonte);
        if duplicate {
            return Err(DomainError::DuplicateMirror {
                work_id,
                fonte: mirror.fonte,
            });
        }

        order.push(mirror.id);
        self.mirror_chapters.entry(mirror.id).or_default();
        self.mirrors.insert(mirror.id, mirror);

        if let Some(work) = self.works.get_mut(&work_id) {
            work.flag_reconciliation();
        }
        Ok(())
    }

    /// Remove a Mirror, cascading its chapter records
    ///
    /// Fails with LastMirror when it is the work's only mirror: callers
    /// must remove the Work instead. Flags the work for reconciliation.
    pub fn remove_mirror(&mut self, work_id: Uuid, mirror_id: Uuid) -> DomainResult<Mirror> {
        let order = self
            .work_mirrors
            .get_mut(&work_id)
            .ok_or_else(|| DomainError::NotFound(format!("work {}", work_id)))?;

        let position = order
            .iter()
            .position(|id| *id == mirror_id)
            .ok_or_else(|| DomainError::NotFound(format!("mirror {}", mirror_id)))?;

        if order.len() == 1 {
            return Err(DomainError::LastMirror { work_id });
        }

        order.remove(position);
        let mirror = self
            .mirrors
            .remove(&mirror_id)
            .ok_or_else(|| DomainError::NotFound(format!("mirror {}", mirror_id)))?;

        for chapter_id in self.mirror_chapters.remove(&mirror_id).unwrap_or_default() {
            self.chapters.remove(&chapter_id);
        }

        if let Some(work) = self.works.get_mut(&work_id) {
            work.flag_reconciliation();
        }
        Ok(mirror)
    }

    pub fn mirror(&self, mirror_id: Uuid) -> Option<&Mirror> {
        self.mirrors.get(&mirror_id)
    }

    /// Mirror ids of a work, in attach order
    pub fn mirror_order(&self, work_id: Uuid) -> &[Uuid] {
        self.work_mirrors
            .get(&work_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Mirrors of a work, in attach order
    pub fn mirrors_of(&self, work_id: Uuid) -> Vec<&Mirror> {
        self.mirror_order(work_id)
            .iter()
            .filter_map(|id| self.mirrors.get(id))
            .collect()
    }

    // ========================================================================
    // CHAPTERS
    // ========================================================================

    /// Replace a mirror's chapter list with fetched data
    ///
    /// Identity and reading progress are preserved for every incoming
    /// record whose (mirror, numero) pair already existed; metadata
    /// (title, attribution, publish date) is refreshed from the fetch.
    /// Flags the owning work for reconciliation.
    pub fn ingest_chapters(
        &mut self,
        mirror_id: Uuid,
        records: Vec<ChapterRecord>,
    ) -> DomainResult<IngestOutcome> {
        let mirror = self
            .mirrors
            .get(&mirror_id)
            .ok_or_else(|| DomainError::NotFound(format!("mirror {}", mirror_id)))?;
        let work_id = mirror.work_id;

        // Index the current list by numero; duplicates within one mirror
        // are matched greedily in ingestion order
        let mut existing: HashMap<i64, VecDeque<ChapterRecord>> = HashMap::new();
        for chapter_id in self.mirror_chapters.remove(&mirror_id).unwrap_or_default() {
            if let Some(old) = self.chapters.remove(&chapter_id) {
                existing.entry(old.numero.millis()).or_default().push_back(old);
            }
        }

        let mut order = Vec::with_capacity(records.len());
        let mut novos = 0;
        let mut preservados = 0;

        for mut record in records {
            record.mirror_id = mirror_id;
            let matched = existing
                .get_mut(&record.numero.millis())
                .and_then(|queue| queue.pop_front());

            let stored = match matched {
                Some(old) => {
                    preservados += 1;
                    ChapterRecord {
                        id: old.id,
                        mirror_id,
                        numero: record.numero,
                        titulo: record.titulo,
                        scanlator: record.scanlator,
                        publicado_em: record.publicado_em,
                        progresso_leitura: old.progresso_leitura,
                        criado_em: old.criado_em,
                        atualizado_em: Utc::now(),
                    }
                }
                None => {
                    novos += 1;
                    record
                }
            };

            order.push(stored.id);
            self.chapters.insert(stored.id, stored);
        }

        let total = order.len();
        self.mirror_chapters.insert(mirror_id, order);

        if let Some(work) = self.works.get_mut(&work_id) {
            work.flag_reconciliation();
        }

        Ok(IngestOutcome {
            total,
            novos,
            preservados,
        })
    }

    pub fn chapter(&self, chapter_id: Uuid) -> Option<&ChapterRecord> {
        self.chapters.get(&chapter_id)
    }

    /// Chapters of a mirror, in ingestion order
    pub fn chapters_of(&self, mirror_id: Uuid) -> Vec<&ChapterRecord> {
        self.mirror_chapters
            .get(&mirror_id)
            .map(|ids| ids.iter().filter_map(|id| self.chapters.get(id)).collect())
            .unwrap_or_default()
    }

    /// Set reading progress on one record
    pub fn set_progress(&mut self, chapter_id: Uuid, progresso: f32) -> DomainResult<()> {
        let chapter = self
            .chapters
            .get_mut(&chapter_id)
            .ok_or_else(|| DomainError::NotFound(format!("chapter {}", chapter_id)))?;
        chapter
            .set_progress(progresso)
            .map_err(|_| DomainError::InvalidProgress(progresso))
    }

    // ========================================================================
    // OWNERSHIP RESOLUTION (used by change propagation)
    // ========================================================================

    /// Owning work of a mirror
    pub fn work_of_mirror(&self, mirror_id: Uuid) -> Option<Uuid> {
        self.mirrors.get(&mirror_id).map(|m| m.work_id)
    }

    /// Owning work of a chapter record
    pub fn work_of_chapter(&self, chapter_id: Uuid) -> Option<Uuid> {
        self.chapters
            .get(&chapter_id)
            .and_then(|c| self.work_of_mirror(c.mirror_id))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chapter::ChapterNumber;

    fn graph_with_work() -> (LibraryGraph, Uuid) {
        let mut graph = LibraryGraph::new();
        let work = Work::new("Berserk".to_string());
        let work_id = work.id;
        graph.insert_work(work);
        (graph, work_id)
    }

    fn chapter(mirror_id: Uuid, numero: f64, scanlator: &str) -> ChapterRecord {
        ChapterRecord::new(
            mirror_id,
            ChapterNumber::from_f64(numero),
            scanlator.to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_attach_mirror_preserves_attach_order() {
        let (mut graph, work_id) = graph_with_work();
        let a = Mirror::new(work_id, "mangasee".to_string());
        let b = Mirror::new(work_id, "mangadex".to_string());
        let (a_id, b_id) = (a.id, b.id);

        graph.attach_mirror(a).unwrap();
        graph.attach_mirror(b).unwrap();

        assert_eq!(graph.mirror_order(work_id), &[a_id, b_id]);
        assert!(graph.work(work_id).unwrap().precisa_reconciliacao);
    }

    #[test]
    fn test_attach_duplicate_source_fails() {
        let (mut graph, work_id) = graph_with_work();
        graph
            .attach_mirror(Mirror::new(work_id, "mangasee".to_string()))
            .unwrap();

        let result = graph.attach_mirror(Mirror::new(work_id, "mangasee".to_string()));
        assert!(matches!(result, Err(DomainError::DuplicateMirror { .. })));
    }

    #[test]
    fn test_attach_to_missing_work_fails() {
        let mut graph = LibraryGraph::new();
        let result = graph.attach_mirror(Mirror::new(Uuid::new_v4(), "mangasee".to_string()));
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[test]
    fn test_remove_last_mirror_fails() {
        let (mut graph, work_id) = graph_with_work();
        let mirror = Mirror::new(work_id, "mangasee".to_string());
        let mirror_id = mirror.id;
        graph.attach_mirror(mirror).unwrap();

        let result = graph.remove_mirror(work_id, mirror_id);
        assert!(matches!(result, Err(DomainError::LastMirror { .. })));
        // Still attached
        assert_eq!(graph.mirror_order(work_id), &[mirror_id]);
    }

    #[test]
    fn test_remove_mirror_cascades_chapters() {
        let (mut graph, work_id) = graph_with_work();
        let a = Mirror::new(work_id, "mangasee".to_string());
        let b = Mirror::new(work_id, "mangadex".to_string());
        let (a_id, b_id) = (a.id, b.id);
        graph.attach_mirror(a).unwrap();
        graph.attach_mirror(b).unwrap();

        graph
            .ingest_chapters(a_id, vec![chapter(a_id, 1.0, "TeamX")])
            .unwrap();
        let chapter_id = graph.chapters_of(a_id)[0].id;

        graph.remove_mirror(work_id, a_id).unwrap();

        assert!(graph.mirror(a_id).is_none());
        assert!(graph.chapter(chapter_id).is_none());
        assert_eq!(graph.mirror_order(work_id), &[b_id]);
    }

    #[test]
    fn test_ingest_preserves_progress_and_identity() {
        let (mut graph, work_id) = graph_with_work();
        let mirror = Mirror::new(work_id, "mangasee".to_string());
        let mirror_id = mirror.id;
        graph.attach_mirror(mirror).unwrap();

        graph
            .ingest_chapters(
                mirror_id,
                vec![chapter(mirror_id, 1.0, "TeamX"), chapter(mirror_id, 2.0, "TeamX")],
            )
            .unwrap();

        let ch1_id = graph.chapters_of(mirror_id)[0].id;
        graph.set_progress(ch1_id, 1.0).unwrap();

        // Refetch: chapter 1 reappears with a new title, chapter 3 is new,
        // chapter 2 vanished upstream
        let mut refreshed = chapter(mirror_id, 1.0, "TeamX");
        refreshed.titulo = Some("The Brand".to_string());
        let outcome = graph
            .ingest_chapters(mirror_id, vec![refreshed, chapter(mirror_id, 3.0, "TeamY")])
            .unwrap();

        assert_eq!(outcome, IngestOutcome { total: 2, novos: 1, preservados: 1 });

        let chapters = graph.chapters_of(mirror_id);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].id, ch1_id);
        assert_eq!(chapters[0].progresso_leitura, 1.0);
        assert_eq!(chapters[0].titulo.as_deref(), Some("The Brand"));
        assert_eq!(chapters[1].numero, ChapterNumber::from_f64(3.0));
    }

    #[test]
    fn test_set_progress_validates_range() {
        let (mut graph, work_id) = graph_with_work();
        let mirror = Mirror::new(work_id, "mangasee".to_string());
        let mirror_id = mirror.id;
        graph.attach_mirror(mirror).unwrap();
        graph
            .ingest_chapters(mirror_id, vec![chapter(mirror_id, 1.0, "TeamX")])
            .unwrap();
        let chapter_id = graph.chapters_of(mirror_id)[0].id;

        assert!(matches!(
            graph.set_progress(chapter_id, 1.5),
            Err(DomainError::InvalidProgress(_))
        ));
        assert!(graph.set_progress(chapter_id, 0.25).is_ok());
    }

    #[test]
    fn test_ownership_resolution() {
        let (mut graph, work_id) = graph_with_work();
        let mirror = Mirror::new(work_id, "mangasee".to_string());
        let mirror_id = mirror.id;
        graph.attach_mirror(mirror).unwrap();
        graph
            .ingest_chapters(mirror_id, vec![chapter(mirror_id, 1.0, "TeamX")])
            .unwrap();
        let chapter_id = graph.chapters_of(mirror_id)[0].id;

        assert_eq!(graph.work_of_mirror(mirror_id), Some(work_id));
        assert_eq!(graph.work_of_chapter(chapter_id), Some(work_id));
        assert_eq!(graph.work_of_chapter(Uuid::new_v4()), None);
    }

    #[test]
    fn test_remove_work_drops_everything() {
        let (mut graph, work_id) = graph_with_work();
        let mirror = Mirror::new(work_id, "mangasee".to_string());
        let mirror_id = mirror.id;
        graph.attach_mirror(mirror).unwrap();
        graph
            .ingest_chapters(mirror_id, vec![chapter(mirror_id, 1.0, "TeamX")])
            .unwrap();
        let chapter_id = graph.chapters_of(mirror_id)[0].id;

        graph.remove_work(work_id).unwrap();
        assert!(graph.work(work_id).is_none());
        assert!(graph.mirror(mirror_id).is_none());
        assert!(graph.chapter(chapter_id).is_none());
    }
}
