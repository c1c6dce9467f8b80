//! Async orchestration around a [`GraphSession`].
//!
//! Adapter calls run on the blocking pool and never hold the session lock.
//! Their results come back through the session's mutation path, so a tick
//! always sees either the old state or the fully applied new one. The tick
//! loop is a spawned task that stops deterministically on [`GraphEngine::stop`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{GraphError, RepositoryError, Result};
use crate::graph::{LoadReport, RelationUpdate};
use crate::note::{Category, CategoryId, Note, NoteDraft, NoteId, NotePatch, OwnerId};
use crate::repository::NoteRepository;
use crate::session::{GraphSession, VisibleGraph};

struct Ticker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct GraphEngine<R: NoteRepository + 'static> {
    repo: Arc<R>,
    owner: OwnerId,
    session: Arc<Mutex<GraphSession>>,
    generation: Arc<AtomicU64>,
    ticker: Option<Ticker>,
}

impl<R: NoteRepository + 'static> GraphEngine<R> {
    pub fn new(repo: Arc<R>, session: GraphSession) -> Self {
        Self {
            repo,
            owner: session.owner().clone(),
            session: Arc::new(Mutex::new(session)),
            generation: Arc::new(AtomicU64::new(0)),
            ticker: None,
        }
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Shared handle to the session, e.g. for a renderer.
    pub fn session(&self) -> Arc<Mutex<GraphSession>> {
        Arc::clone(&self.session)
    }

    fn lock(&self) -> MutexGuard<'_, GraphSession> {
        lock_session(&self.session)
    }

    /// Lock the session to apply a completed write. Any reload whose fetch
    /// began before this point is stale from here on.
    fn lock_for_write(&self) -> MutexGuard<'_, GraphSession> {
        let session = self.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        session
    }

    /// Run `f` against the session under its lock.
    pub fn with_session<T>(&self, f: impl FnOnce(&mut GraphSession) -> T) -> T {
        f(&mut self.lock())
    }

    pub fn visible_graph(&self) -> VisibleGraph {
        self.lock().visible_graph()
    }

    async fn call<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&R) -> std::result::Result<T, RepositoryError> + Send + 'static,
    {
        let repo = Arc::clone(&self.repo);
        tokio::task::spawn_blocking(move || f(repo.as_ref()))
            .await
            .map_err(|e| RepositoryError::Unavailable(format!("adapter task failed: {e}")))?
            .map_err(GraphError::from)
    }

    /// Fetch a fresh snapshot and load it.
    ///
    /// Returns `Ok(None)` when a later reload was started, or a write was
    /// applied, while this one was in flight; the older result is discarded.
    pub async fn reload(&self) -> Result<Option<LoadReport>> {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let owner = self.owner.clone();
        let fetched = self.call(move |repo| repo.snapshot(&owner)).await;

        let mut session = self.lock();
        let current = self.generation.load(Ordering::SeqCst);
        if token != current {
            let stale = GraphError::StaleRequest {
                requested: token,
                current,
            };
            tracing::debug!(error = %stale, "discarding superseded reload");
            return Ok(None);
        }
        Ok(Some(session.load(fetched?)))
    }

    /// Validate and store a draft, then add it to the graph with its relations.
    ///
    /// If the note is stored but its relations are not, the note is still
    /// added (without relations) and the adapter error is returned.
    pub async fn save_note(&self, draft: NoteDraft) -> Result<(Note, RelationUpdate)> {
        let (new_note, related) = draft.validate(&self.owner)?;
        let note = self.call(move |repo| repo.create_note(&new_note)).await?;

        let accepted = if related.is_empty() {
            Ok(Vec::new())
        } else {
            self.store_relations(&note.id, related).await
        };

        let mut session = self.lock_for_write();
        match accepted {
            Ok(accepted) => {
                let update = session.apply_note_saved(note.clone(), &accepted)?;
                tracing::info!(id = %note.id, related = update.related.len(), "note saved");
                Ok((note, update))
            }
            Err(e) => {
                session.apply_note_saved(note, &[])?;
                Err(e)
            }
        }
    }

    /// Store a patch and, when `related` is given, replace the note's relations.
    pub async fn update_note(
        &self,
        id: &NoteId,
        patch: NotePatch,
        related: Option<Vec<NoteId>>,
    ) -> Result<Note> {
        patch.validate()?;
        let owner = self.owner.clone();
        let note_id = id.clone();
        let note = self
            .call(move |repo| repo.update_note(&owner, &note_id, &patch))
            .await?;

        let accepted = match related {
            Some(targets) => Some(self.store_relations(id, targets).await),
            None => None,
        };

        let mut session = self.lock_for_write();
        match accepted {
            None => {
                session.apply_note_updated(note.clone(), None)?;
            }
            Some(Ok(accepted)) => {
                session.apply_note_updated(note.clone(), Some(accepted.as_slice()))?;
            }
            Some(Err(e)) => {
                session.apply_note_updated(note, None)?;
                return Err(e);
            }
        }
        Ok(note)
    }

    pub async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let owner = self.owner.clone();
        let note_id = id.clone();
        self.call(move |repo| repo.delete_note(&owner, &note_id))
            .await?;
        self.lock_for_write().apply_note_deleted(id);
        tracing::info!(id = %id, "note deleted");
        Ok(())
    }

    pub async fn replace_relations(&self, id: &NoteId, targets: Vec<NoteId>) -> Result<RelationUpdate> {
        let accepted = self.store_relations(id, targets).await?;
        self.lock_for_write().apply_relations_replaced(id, &accepted)
    }

    async fn store_relations(&self, id: &NoteId, targets: Vec<NoteId>) -> Result<Vec<NoteId>> {
        let owner = self.owner.clone();
        let note_id = id.clone();
        self.call(move |repo| repo.replace_relations(&owner, &note_id, &targets))
            .await
    }

    pub async fn create_category(&self, name: &str) -> Result<Category> {
        let owner = self.owner.clone();
        let name = name.to_string();
        let category = self
            .call(move |repo| repo.create_category(&owner, &name))
            .await?;
        self.lock_for_write().apply_category_saved(category.clone())?;
        Ok(category)
    }

    pub async fn rename_category(&self, id: &CategoryId, name: &str) -> Result<Category> {
        let owner = self.owner.clone();
        let category_id = id.clone();
        let name = name.to_string();
        let category = self
            .call(move |repo| repo.rename_category(&owner, &category_id, &name))
            .await?;
        self.lock_for_write().apply_category_saved(category.clone())?;
        Ok(category)
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Spawn the tick loop. No-op if it is already running.
    pub fn start(&mut self, interval: Duration) {
        if self.ticker.is_some() {
            return;
        }
        let (shutdown, mut stopped) = watch::channel(false);
        let session = Arc::clone(&self.session);

        let handle = tokio::spawn(async move {
            let mut clock = tokio::time::interval(interval);
            clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last = Instant::now();
            loop {
                tokio::select! {
                    biased;
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                    now = clock.tick() => {
                        let elapsed = now.duration_since(last);
                        last = now;
                        lock_session(&session).tick(elapsed);
                    }
                }
            }
            tracing::debug!("tick loop stopped");
        });

        tracing::debug!(interval_ms = interval.as_millis() as u64, "tick loop started");
        self.ticker = Some(Ticker { shutdown, handle });
    }

    /// Stop the tick loop and wait for it. No tick runs after this returns.
    pub async fn stop(&mut self) {
        let Some(ticker) = self.ticker.take() else {
            return;
        };
        let _ = ticker.shutdown.send(true);
        if let Err(e) = ticker.handle.await {
            tracing::warn!(error = %e, "tick loop ended abnormally");
        }
    }
}

impl<R: NoteRepository + 'static> Drop for GraphEngine<R> {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            let _ = ticker.shutdown.send(true);
            ticker.handle.abort();
        }
    }
}

/// Session state stays consistent across a panic in a caller's closure, so a
/// poisoned lock is recovered rather than propagated.
fn lock_session(session: &Mutex<GraphSession>) -> MutexGuard<'_, GraphSession> {
    session
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
