//! Capabilities injected into adapters at construction.
//!
//! Required capabilities (cell providers) are plain function values. Optional
//! ones are `Option`s resolved once when the adapter is built; an absent
//! capability makes the corresponding part of the data-source surface inert.

use std::fmt;
use std::sync::Arc;

use fetched_datasource_core::StoreResult;

use crate::position::IndexPath;

/// Produces the cell for an entity at a position.
pub type CellProvider<W, T, C> = Arc<dyn Fn(&W, IndexPath, &T) -> C + Send + Sync>;

/// Decides whether an updated entity should be re-rendered.
///
/// Returning `false` drops the update without touching the widget.
pub type ReloadPolicy<W, T> = Arc<dyn Fn(&W, IndexPath, &T) -> bool + Send + Sync>;

/// Produces a supplementary view of `kind` (e.g. `"header"`) for a position.
pub type SupplementaryProvider<W, T, V> =
    Arc<dyn Fn(&W, &str, IndexPath, &T) -> V + Send + Sync>;

/// Produces the title of a picker row: `(widget, row, component, entity)`.
pub type PickerTitleProvider<W, T> = Arc<dyn Fn(&W, usize, usize, &T) -> String + Send + Sync>;

/// Produces the view of a picker row, optionally reusing a previous one:
/// `(widget, row, component, reusing, entity)`.
pub type PickerViewProvider<W, T, V> =
    Arc<dyn Fn(&W, usize, usize, Option<V>, &T) -> V + Send + Sync>;

/// Produces the title of a segment: `(widget, index, entity)`.
pub type SegmentTitleProvider<W, T> = Arc<dyn Fn(&W, usize, &T) -> String + Send + Sync>;

/// Receives the outcome of an insertion.
///
/// The completion is `Send`; the capability may finish on any thread.
pub struct InsertionCompletion<T> {
    complete: Box<dyn FnOnce(StoreResult<T>) + Send>,
}

impl<T> InsertionCompletion<T> {
    /// Wraps a completion callback.
    pub fn new<F>(complete: F) -> Self
    where
        F: FnOnce(StoreResult<T>) + Send + 'static,
    {
        Self {
            complete: Box::new(complete),
        }
    }

    /// Reports the outcome: the persisted entity, or why it was not saved.
    pub fn complete(self, result: StoreResult<T>) {
        (self.complete)(result)
    }
}

impl<T> fmt::Debug for InsertionCompletion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertionCompletion").finish_non_exhaustive()
    }
}

/// Creates and persists a new entity in response to an insert-style edit.
///
/// The capability owns the save: it may hand the work to another execution
/// context and must not block the UI thread while the store validates and
/// persists the entity. It reports through `completion` exactly once.
pub trait InsertionCapability<W, T>: Send + Sync {
    /// Starts inserting an entity at `position`.
    fn insert(&self, widget: &W, position: IndexPath, completion: InsertionCompletion<T>);
}

impl<W, T, F> InsertionCapability<W, T> for F
where
    F: Fn(&W, IndexPath, InsertionCompletion<T>) + Send + Sync,
{
    fn insert(&self, widget: &W, position: IndexPath, completion: InsertionCompletion<T>) {
        self(widget, position, completion)
    }
}

/// Interactive reordering support.
pub trait MoveCapability<W, T>: Send + Sync {
    /// Whether the entity at `position` may be moved.
    fn can_move(&self, widget: &W, position: IndexPath, entity: &T) -> bool {
        let _ = (widget, position, entity);
        false
    }

    /// Commits a move the user performed from `from` to `to`.
    fn move_item(&self, widget: &W, from: IndexPath, to: IndexPath, entity: &T);
}

type CanMoveFn<W> = Arc<dyn Fn(&W, IndexPath) -> bool + Send + Sync>;
type MoveFn<W> = Arc<dyn Fn(&W, IndexPath, IndexPath) + Send + Sync>;

/// A [`MoveCapability`] assembled from optional closures.
///
/// A missing `can_move` closure answers `false`; a missing `move_item`
/// closure ignores the move.
pub struct MoveHandler<W> {
    can_move: Option<CanMoveFn<W>>,
    move_item: Option<MoveFn<W>>,
}

impl<W> Default for MoveHandler<W> {
    fn default() -> Self {
        Self {
            can_move: None,
            move_item: None,
        }
    }
}

impl<W> fmt::Debug for MoveHandler<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoveHandler")
            .field("can_move", &self.can_move.is_some())
            .field("move_item", &self.move_item.is_some())
            .finish()
    }
}

impl<W> MoveHandler<W> {
    /// Creates an inert handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `can_move` closure.
    pub fn with_can_move<F>(mut self, can_move: F) -> Self
    where
        F: Fn(&W, IndexPath) -> bool + Send + Sync + 'static,
    {
        self.can_move = Some(Arc::new(can_move));
        self
    }

    /// Sets the `move_item` closure.
    pub fn with_move<F>(mut self, move_item: F) -> Self
    where
        F: Fn(&W, IndexPath, IndexPath) + Send + Sync + 'static,
    {
        self.move_item = Some(Arc::new(move_item));
        self
    }
}

impl<W, T> MoveCapability<W, T> for MoveHandler<W> {
    fn can_move(&self, widget: &W, position: IndexPath, _entity: &T) -> bool {
        self.can_move
            .as_ref()
            .is_some_and(|can_move| can_move(widget, position))
    }

    fn move_item(&self, widget: &W, from: IndexPath, to: IndexPath, _entity: &T) {
        if let Some(move_item) = &self.move_item {
            move_item(widget, from, to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_move_handler_defaults_to_inert() {
        let handler = MoveHandler::<()>::new();
        assert!(!MoveCapability::<(), u32>::can_move(
            &handler,
            &(),
            IndexPath::new(0, 0),
            &1
        ));
        MoveCapability::<(), u32>::move_item(
            &handler,
            &(),
            IndexPath::new(0, 0),
            IndexPath::new(0, 1),
            &1,
        );
    }

    #[test]
    fn test_move_handler_closures() {
        let moves = Arc::new(Mutex::new(Vec::new()));
        let moves_clone = moves.clone();
        let handler = MoveHandler::<()>::new()
            .with_can_move(|_, at| at.row > 0)
            .with_move(move |_, from, to| moves_clone.lock().push((from, to)));

        let top = IndexPath::new(0, 0);
        let second = IndexPath::new(0, 1);
        assert!(!MoveCapability::<(), u32>::can_move(&handler, &(), top, &1));
        assert!(MoveCapability::<(), u32>::can_move(&handler, &(), second, &1));

        MoveCapability::<(), u32>::move_item(&handler, &(), second, top, &1);
        assert_eq!(*moves.lock(), vec![(second, top)]);
    }

    #[test]
    fn test_closure_is_an_insertion_capability() {
        let capability = |_: &(), at: IndexPath, done: InsertionCompletion<IndexPath>| {
            done.complete(Ok(at));
        };

        let received = Arc::new(Mutex::new(None));
        let received_clone = received.clone();
        capability.insert(
            &(),
            IndexPath::new(1, 2),
            InsertionCompletion::new(move |result| *received_clone.lock() = Some(result)),
        );

        assert_eq!(*received.lock(), Some(Ok(IndexPath::new(1, 2))));
    }
}
