//! Background insertion into a result set.
//!
//! [`StoreInsertion`] is a ready-made [`InsertionCapability`]: it builds the
//! new entity on the calling thread, then inserts and saves it on a
//! [`SerialQueue`] so the UI thread never waits for the store. Insertions run
//! one at a time, in the order they were committed.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use fetched_datasource_core::logging::targets;
use fetched_datasource_core::{SerialQueue, StoreError};

use crate::capability::{InsertionCapability, InsertionCompletion};
use crate::position::IndexPath;
use crate::result_set::ResultSet;

/// Builds the entity an insert-style edit creates: `(widget, position)`.
pub type EntityFactory<W, T> = Arc<dyn Fn(&W, IndexPath) -> T + Send + Sync>;

/// Inserts and saves new entities on a serial worker.
pub struct StoreInsertion<R: ResultSet, W> {
    result_set: Arc<R>,
    worker: Arc<SerialQueue>,
    factory: EntityFactory<W, R::Entity>,
}

impl<R: ResultSet, W> StoreInsertion<R, W> {
    /// Creates an insertion capability saving into `result_set` on `worker`.
    pub fn new<F>(result_set: Arc<R>, worker: Arc<SerialQueue>, factory: F) -> Self
    where
        F: Fn(&W, IndexPath) -> R::Entity + Send + Sync + 'static,
    {
        Self {
            result_set,
            worker,
            factory: Arc::new(factory),
        }
    }

    /// The worker insertions run on.
    pub fn worker(&self) -> &Arc<SerialQueue> {
        &self.worker
    }
}

impl<R: ResultSet, W> fmt::Debug for StoreInsertion<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreInsertion")
            .field("worker", &self.worker.name())
            .finish_non_exhaustive()
    }
}

impl<R, W> InsertionCapability<W, R::Entity> for StoreInsertion<R, W>
where
    R: ResultSet,
    W: Send + Sync,
{
    fn insert(&self, widget: &W, position: IndexPath, completion: InsertionCompletion<R::Entity>) {
        let entity = (self.factory)(widget, position);
        let result_set = self.result_set.clone();

        // Shared with the task so a rejected send can still report.
        let slot = Arc::new(Mutex::new(Some(completion)));
        let task_slot = slot.clone();

        let accepted = self.worker.send(move || {
            let result = result_set
                .insert_object(entity.clone())
                .and_then(|()| result_set.save())
                .map(|()| entity);
            if let Err(error) = &result {
                tracing::debug!(target: targets::STORE, %error, "insertion failed");
            }
            if let Some(completion) = task_slot.lock().take() {
                completion.complete(result);
            }
        });

        if !accepted {
            tracing::warn!(target: targets::STORE, %position, worker = self.worker.name(), "insertion worker unavailable");
            if let Some(completion) = slot.lock().take() {
                completion.complete(Err(StoreError::Closed));
            }
        }
    }
}
