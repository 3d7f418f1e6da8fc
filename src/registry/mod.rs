//! Generation registry: the shared state container for video jobs.
//!
//! State lives in a `tokio::sync::watch` channel holding an
//! `Arc<GenerationsState>`. Every mutation builds a fresh state from the
//! current one under the channel lock and publishes it, so:
//! - concurrent poll tasks never tear state,
//! - snapshots handed out earlier never change,
//! - subscribers are woken with the latest state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::types::{Generation, GenerationId, GenerationUpdate, GenerationsState};

/// Ordered collection of generations plus the derived active count.
#[derive(Debug)]
pub struct GenerationRegistry {
    state: watch::Sender<Arc<GenerationsState>>,
    next_id: AtomicU64,
}

impl Default for GenerationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(GenerationsState::default()));
        Self {
            state,
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh generation id. Ids are never reused.
    pub fn next_id(&self) -> GenerationId {
        GenerationId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Append a generation and return its id.
    pub fn add(&self, generation: Generation) -> GenerationId {
        let id = generation.id;
        self.state.send_modify(|state| {
            let mut items = state.items().to_vec();
            items.push(generation);
            *state = Arc::new(GenerationsState::new(items));
        });
        tracing::debug!(generation = %id, "generation added");
        id
    }

    /// Append a generation only while fewer than `limit` are active.
    ///
    /// The count and the insert happen under one channel lock, so
    /// concurrent callers cannot overshoot `limit`.
    pub fn try_add(&self, generation: Generation, limit: usize) -> bool {
        let id = generation.id;
        let added = self.state.send_if_modified(|state| {
            if state.active_count() >= limit {
                return false;
            }
            let mut items = state.items().to_vec();
            items.push(generation);
            *state = Arc::new(GenerationsState::new(items));
            true
        });
        if added {
            tracing::debug!(generation = %id, "generation added");
        }
        added
    }

    /// Merge `update` into the generation with `id`. Unknown ids are ignored.
    ///
    /// Returns whether a generation was updated.
    pub fn update(&self, id: GenerationId, update: GenerationUpdate) -> bool {
        self.state.send_if_modified(|state| {
            let Some(index) = state.items().iter().position(|g| g.id == id) else {
                return false;
            };
            let mut items = state.items().to_vec();
            update.apply_to(&mut items[index]);
            *state = Arc::new(GenerationsState::new(items));
            true
        })
    }

    /// Remove the generation with `id`, if present.
    pub fn remove(&self, id: GenerationId) -> bool {
        self.retain(|g| g.id != id)
    }

    /// Drop all completed, errored and canceled generations.
    pub fn clear_completed(&self) -> bool {
        self.retain(|g| !g.status.is_finished())
    }

    /// Drop every generation.
    pub fn clear_all(&self) {
        self.state
            .send_replace(Arc::new(GenerationsState::default()));
    }

    /// Current immutable snapshot.
    pub fn snapshot(&self) -> Arc<GenerationsState> {
        self.state.borrow().clone()
    }

    /// Copy of a single generation.
    pub fn get(&self, id: GenerationId) -> Option<Generation> {
        self.state.borrow().get(id).cloned()
    }

    /// Number of generations in `queued` or `processing`.
    pub fn active_count(&self) -> usize {
        self.state.borrow().active_count()
    }

    /// Receive every published state.
    pub fn subscribe(&self) -> watch::Receiver<Arc<GenerationsState>> {
        self.state.subscribe()
    }

    fn retain(&self, keep: impl Fn(&Generation) -> bool) -> bool {
        self.state.send_if_modified(|state| {
            if state.items().iter().all(&keep) {
                return false;
            }
            let items = state.items().iter().filter(|g| keep(g)).cloned().collect();
            *state = Arc::new(GenerationsState::new(items));
            true
        })
    }
}
