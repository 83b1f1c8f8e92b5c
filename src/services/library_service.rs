// src/services/library_service.rs
//
// Library Service - Work / Mirror / Chapter Management
//
// Orchestrates every mutation of the entity graph.
//
// CRITICAL RULES:
// - Mutations are the only paths that alter mirror membership; each
//   one flags the work and emits EntitiesChanged after persisting
// - The graph write lock is never held across persistence or event
//   emission; the synchronous reconciliation handler takes its own lock
// - Domain invariants are validated before anything is persisted
// - Reconciliation finishes before every mutating call returns

use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::domain::chapter::{validate_chapter, ChapterRecord};
use crate::domain::mirror::{validate_mirror, Mirror};
use crate::domain::work::{validate_work, DisplayPolicy, Work};
use crate::error::{AppError, AppResult};
use crate::events::{
    ChapterProgressUpdated, ChaptersIngested, EntitiesChanged, EntityRef, EventBus,
    MirrorAttached, MirrorRemoved, WorkCreated, WorkRemoved,
};
use crate::graph::{IngestOutcome, LibraryGraph};
use crate::repositories::{ChapterRepository, MirrorRepository, WorkRepository};

/// Request to materialize a new work from its first mirror
#[derive(Debug, Clone)]
pub struct CreateWorkRequest {
    pub titulo_principal: String,
    pub titulos_alternativos: Vec<String>,
    pub fonte: String,
    pub metadados_livres: Option<serde_json::Value>,
}

/// Request to attach an additional mirror to an existing work
#[derive(Debug, Clone)]
pub struct AttachMirrorRequest {
    pub work_id: Uuid,
    pub fonte: String,
}

pub struct LibraryService {
    graph: Arc<RwLock<LibraryGraph>>,
    work_repo: Arc<dyn WorkRepository>,
    mirror_repo: Arc<dyn MirrorRepository>,
    chapter_repo: Arc<dyn ChapterRepository>,
    event_bus: Arc<EventBus>,
}

impl LibraryService {
    pub fn new(
        graph: Arc<RwLock<LibraryGraph>>,
        work_repo: Arc<dyn WorkRepository>,
        mirror_repo: Arc<dyn MirrorRepository>,
        chapter_repo: Arc<dyn ChapterRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            graph,
            work_repo,
            mirror_repo,
            chapter_repo,
            event_bus,
        }
    }

    /// Shared handle to the entity graph (handler registration, unifier)
    pub fn graph(&self) -> Arc<RwLock<LibraryGraph>> {
        Arc::clone(&self.graph)
    }

    /// Materialize a new Work from its first mirror
    ///
    /// CRITICAL: a Work is never published with zero mirrors
    pub fn create_work(&self, request: CreateWorkRequest) -> AppResult<Uuid> {
        // 1. Build domain entities
        let mut work = Work::new(request.titulo_principal);
        work.titulos_alternativos = request.titulos_alternativos;
        if let Some(meta) = request.metadados_livres {
            work.metadados_livres = meta;
        }
        let mirror = Mirror::new(work.id, request.fonte.clone());

        // 2. Validate domain invariants
        validate_work(&work).map_err(AppError::Domain)?;
        validate_mirror(&mirror).map_err(AppError::Domain)?;

        let work_id = work.id;
        let mirror_id = mirror.id;

        // 3. Mutate the graph (lock scope ends before persistence)
        let (work_snapshot, posicao) = {
            let mut graph = self.graph.write().unwrap();
            graph.insert_work(work);
            graph.attach_mirror(mirror.clone())?;
            let posicao = graph.mirror_order(work_id).len() - 1;
            (graph.work(work_id).cloned(), posicao)
        };
        let work_snapshot =
            work_snapshot.ok_or_else(|| AppError::NotFound(format!("work {}", work_id)))?;

        // 4. Persist
        self.work_repo.save(&work_snapshot)?;
        self.mirror_repo.save(&mirror, posicao as i64)?;

        // 5. Emit events (reconciliation runs synchronously here)
        self.event_bus.emit(WorkCreated::new(
            work_id,
            work_snapshot.titulo_principal.clone(),
            request.fonte,
        ));
        self.event_bus.emit(MirrorAttached::new(
            mirror_id,
            work_id,
            mirror.fonte.clone(),
        ));
        self.event_bus.emit(EntitiesChanged::new(vec![
            EntityRef::Work(work_id),
            EntityRef::Mirror(mirror_id),
        ]));

        Ok(work_id)
    }

    /// Remove a Work along with all its mirrors and chapters
    pub fn remove_work(&self, work_id: Uuid) -> AppResult<()> {
        // 1. Mutate the graph
        {
            let mut graph = self.graph.write().unwrap();
            graph.remove_work(work_id)?;
        }

        // 2. Persist (mirrors and chapters cascade on the FK)
        self.work_repo.delete(work_id)?;

        // 3. Emit event
        self.event_bus.emit(WorkRemoved::new(work_id));
        Ok(())
    }

    /// Attach an additional mirror to an existing work
    pub fn attach_mirror(&self, request: AttachMirrorRequest) -> AppResult<Uuid> {
        // 1. Build and validate
        let mirror = Mirror::new(request.work_id, request.fonte);
        validate_mirror(&mirror).map_err(AppError::Domain)?;
        let mirror_id = mirror.id;

        // 2. Mutate the graph
        let (work_snapshot, posicao) = {
            let mut graph = self.graph.write().unwrap();
            graph.attach_mirror(mirror.clone())?;
            let posicao = graph.mirror_order(request.work_id).len() - 1;
            (graph.work(request.work_id).cloned(), posicao)
        };
        let work_snapshot = work_snapshot
            .ok_or_else(|| AppError::NotFound(format!("work {}", request.work_id)))?;

        // 3. Persist
        self.mirror_repo.save(&mirror, posicao as i64)?;
        self.work_repo.save(&work_snapshot)?;

        // 4. Emit events
        self.event_bus.emit(MirrorAttached::new(
            mirror_id,
            request.work_id,
            mirror.fonte.clone(),
        ));
        self.event_bus.emit(EntitiesChanged::new(vec![
            EntityRef::Work(request.work_id),
            EntityRef::Mirror(mirror_id),
        ]));

        Ok(mirror_id)
    }

    /// Remove a mirror from a work
    ///
    /// CRITICAL: the last mirror cannot be removed; remove the work
    pub fn remove_mirror(&self, work_id: Uuid, mirror_id: Uuid) -> AppResult<()> {
        // 1. Mutate the graph (cascades chapter records)
        let (mirror, work_snapshot) = {
            let mut graph = self.graph.write().unwrap();
            let mirror = graph.remove_mirror(work_id, mirror_id)?;
            (mirror, graph.work(work_id).cloned())
        };
        let work_snapshot =
            work_snapshot.ok_or_else(|| AppError::NotFound(format!("work {}", work_id)))?;

        // 2. Persist (chapters cascade on the FK)
        self.mirror_repo.delete(mirror_id)?;
        self.work_repo.save(&work_snapshot)?;

        // 3. Emit events
        self.event_bus
            .emit(MirrorRemoved::new(mirror_id, work_id, mirror.fonte));
        self.event_bus
            .emit(EntitiesChanged::new(vec![EntityRef::Work(work_id)]));

        Ok(())
    }

    /// Replace a mirror's chapter list with fetched records
    ///
    /// Reading progress survives for every (mirror, numero) pair that
    /// already existed.
    pub fn ingest_chapters(
        &self,
        mirror_id: Uuid,
        records: Vec<ChapterRecord>,
    ) -> AppResult<IngestOutcome> {
        // 1. Validate incoming records
        for record in &records {
            validate_chapter(record).map_err(AppError::Domain)?;
        }

        // 2. Mutate the graph
        let (outcome, work_id, stored, work_snapshot) = {
            let mut graph = self.graph.write().unwrap();
            let work_id = graph
                .work_of_mirror(mirror_id)
                .ok_or_else(|| AppError::NotFound(format!("mirror {}", mirror_id)))?;
            let outcome = graph.ingest_chapters(mirror_id, records)?;
            let stored: Vec<ChapterRecord> = graph
                .chapters_of(mirror_id)
                .into_iter()
                .cloned()
                .collect();
            (outcome, work_id, stored, graph.work(work_id).cloned())
        };
        let work_snapshot =
            work_snapshot.ok_or_else(|| AppError::NotFound(format!("work {}", work_id)))?;

        // 3. Persist the replaced list and the flagged work
        self.chapter_repo.replace_for_mirror(mirror_id, &stored)?;
        self.work_repo.save(&work_snapshot)?;

        // 4. Emit events
        self.event_bus.emit(ChaptersIngested::new(
            mirror_id,
            work_id,
            outcome.total,
            outcome.novos,
            outcome.preservados,
        ));
        self.event_bus
            .emit(EntitiesChanged::new(vec![EntityRef::Mirror(mirror_id)]));

        Ok(outcome)
    }

    /// Replace a work's display policy
    pub fn update_display_policy(&self, work_id: Uuid, politica: DisplayPolicy) -> AppResult<()> {
        let work_snapshot = {
            let mut graph = self.graph.write().unwrap();
            let work = graph
                .work_mut(work_id)
                .ok_or_else(|| AppError::NotFound(format!("work {}", work_id)))?;
            work.set_policy(politica);
            work.clone()
        };

        self.work_repo.save(&work_snapshot)?;
        Ok(())
    }

    /// Write reading progress to one chapter record
    pub fn set_chapter_progress(&self, chapter_id: Uuid, progresso: f32) -> AppResult<()> {
        let mirror_id = {
            let mut graph = self.graph.write().unwrap();
            graph.set_progress(chapter_id, progresso)?;
            graph
                .chapter(chapter_id)
                .map(|c| c.mirror_id)
                .ok_or_else(|| AppError::NotFound(format!("chapter {}", chapter_id)))?
        };

        self.chapter_repo.update_progress(chapter_id, progresso)?;
        self.event_bus
            .emit(ChapterProgressUpdated::new(chapter_id, mirror_id, progresso));
        Ok(())
    }

    /// Rebuild the in-memory graph from the repositories
    ///
    /// Stored priority tables and reconciliation flags are restored
    /// verbatim; works persisted mid-change are flushed through change
    /// propagation at the end.
    pub fn hydrate(&self) -> AppResult<()> {
        let works = self.work_repo.list_all()?;
        let mut flagged: Vec<EntityRef> = Vec::new();

        {
            let mut graph = self.graph.write().unwrap();
            for stored in works {
                let work_id = stored.id;
                graph.insert_work(stored.clone());

                for mirror in self.mirror_repo.list_by_work(work_id)? {
                    let mirror_id = mirror.id;
                    graph.attach_mirror(mirror)?;
                    let chapters = self.chapter_repo.list_by_mirror(mirror_id)?;
                    graph.ingest_chapters(mirror_id, chapters)?;
                }

                // attach/ingest flagged the work; restore persisted state
                if let Some(work) = graph.work_mut(work_id) {
                    work.prioridades = stored.prioridades;
                    work.precisa_reconciliacao = stored.precisa_reconciliacao;
                    work.atualizado_em = stored.atualizado_em;
                }
                if stored.precisa_reconciliacao {
                    flagged.push(EntityRef::Work(work_id));
                }
            }
        }

        if !flagged.is_empty() {
            self.event_bus.emit(EntitiesChanged::new(flagged));
        }
        Ok(())
    }
}

impl Clone for LibraryService {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            work_repo: Arc::clone(&self.work_repo),
            mirror_repo: Arc::clone(&self.mirror_repo),
            chapter_repo: Arc::clone(&self.chapter_repo),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}
