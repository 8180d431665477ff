//! Transaction-scoped accumulation of widget updates.
//!
//! Between a result set's begin and end notifications, each change event is
//! translated into a deferred widget mutation and appended to the open
//! buffer. At the end of the transaction the whole buffer is handed out as
//! one [`Batch`].
//!
//! ```text
//!   NoBatch ──begin()──> BatchOpen ──end()──> NoBatch
//!                          │  ▲
//!                          └──┘ record()
//! ```
//!
//! Any other transition is a broken contract on the store's side and panics.

use std::cell::RefCell;
use std::fmt;

use parking_lot::ReentrantMutex;

use fetched_datasource_core::logging::targets;

/// One deferred mutation of a widget.
pub type Update<W> = Box<dyn FnOnce(&W) + Send>;

/// The ordered widget mutations of one transaction.
pub struct Batch<W> {
    updates: Vec<Update<W>>,
}

impl<W> Batch<W> {
    /// Builds a batch from updates already in order.
    pub fn from_updates(updates: Vec<Update<W>>) -> Self {
        Self { updates }
    }

    /// Number of instructions in the batch.
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Returns `true` if the batch has no instructions.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Applies every instruction to `widget`, in recording order.
    pub fn apply(self, widget: &W) {
        for update in self.updates {
            update(widget);
        }
    }
}

impl<W> fmt::Debug for Batch<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch").field("len", &self.len()).finish()
    }
}

/// The open/closed update buffer owned by one adapter.
///
/// Access is serialized with a re-entrant lock: a store may deliver
/// notifications for the same adapter from more than one thread, and a
/// translator may legitimately re-enter while recording. Whole transactions
/// are serialized by the store; a begin while another is open is fatal.
pub struct BatchAccumulator<W> {
    buffer: ReentrantMutex<RefCell<Option<Vec<Update<W>>>>>,
}

impl<W> Default for BatchAccumulator<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> fmt::Debug for BatchAccumulator<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.buffer.lock();
        let pending = guard.borrow().as_ref().map(Vec::len);
        f.debug_struct("BatchAccumulator")
            .field("pending", &pending)
            .finish()
    }
}

impl<W> BatchAccumulator<W> {
    /// Creates an accumulator with no open batch.
    pub fn new() -> Self {
        Self {
            buffer: ReentrantMutex::new(RefCell::new(None)),
        }
    }

    /// Returns `true` while a batch is open.
    pub fn is_open(&self) -> bool {
        self.buffer.lock().borrow().is_some()
    }

    /// Opens an empty batch.
    ///
    /// # Panics
    ///
    /// Panics if a batch is already open.
    pub fn begin(&self) {
        let guard = self.buffer.lock();
        let mut buffer = guard.borrow_mut();
        assert!(
            buffer.is_none(),
            "begin of a transaction while another is still open: stale batch updates"
        );
        *buffer = Some(Vec::new());
        tracing::trace!(target: targets::BATCH, "batch opened");
    }

    /// Checks that a batch is open without recording anything.
    ///
    /// # Panics
    ///
    /// Panics if no batch is open.
    pub fn assert_open(&self) {
        assert!(self.is_open(), "change reported outside of a transaction: unbatched change");
    }

    /// Appends an update to the open batch.
    ///
    /// # Panics
    ///
    /// Panics if no batch is open.
    pub fn record(&self, update: Update<W>) {
        let guard = self.buffer.lock();
        let mut buffer = guard.borrow_mut();
        match buffer.as_mut() {
            Some(updates) => {
                updates.push(update);
                tracing::trace!(target: targets::BATCH, pending = updates.len(), "update recorded");
            }
            None => panic!("change reported outside of a transaction: unbatched change"),
        }
    }

    /// Closes the open batch.
    ///
    /// Returns `None` if nothing was recorded: an empty transaction must not
    /// reach the widget.
    ///
    /// # Panics
    ///
    /// Panics if no batch is open.
    pub fn end(&self) -> Option<Batch<W>> {
        let guard = self.buffer.lock();
        let taken = guard.borrow_mut().take();
        let Some(updates) = taken else {
            panic!("end of a transaction that was never begun");
        };
        tracing::trace!(target: targets::BATCH, len = updates.len(), "batch closed");
        if updates.is_empty() {
            None
        } else {
            Some(Batch::from_updates(updates))
        }
    }
}

static_assertions::assert_impl_all!(BatchAccumulator<()>: Send, Sync);
static_assertions::assert_impl_all!(Batch<()>: Send);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Log = Mutex<Vec<u32>>;

    fn push(value: u32) -> Update<Log> {
        Box::new(move |log: &Log| log.lock().push(value))
    }

    #[test]
    fn test_batch_preserves_recording_order() {
        let accumulator = BatchAccumulator::<Log>::new();
        accumulator.begin();
        for value in [3, 1, 2] {
            accumulator.record(push(value));
        }

        let batch = accumulator.end().unwrap();
        assert_eq!(batch.len(), 3);
        assert!(!accumulator.is_open());

        let log = Log::default();
        batch.apply(&log);
        assert_eq!(*log.lock(), vec![3, 1, 2]);
    }

    #[test]
    fn test_empty_transaction_yields_no_batch() {
        let accumulator = BatchAccumulator::<Log>::new();
        accumulator.begin();
        assert!(accumulator.end().is_none());
        assert!(!accumulator.is_open());
    }

    #[test]
    fn test_accumulator_cycles_per_transaction() {
        let accumulator = BatchAccumulator::<Log>::new();
        for round in 0..3 {
            accumulator.begin();
            accumulator.record(push(round));
            assert_eq!(accumulator.end().map(|b| b.len()), Some(1));
        }
    }

    #[test]
    #[should_panic(expected = "stale batch updates")]
    fn test_double_begin_panics() {
        let accumulator = BatchAccumulator::<Log>::new();
        accumulator.begin();
        accumulator.begin();
    }

    #[test]
    #[should_panic(expected = "unbatched change")]
    fn test_record_without_begin_panics() {
        let accumulator = BatchAccumulator::<Log>::new();
        accumulator.record(push(1));
    }

    #[test]
    #[should_panic(expected = "never begun")]
    fn test_end_without_begin_panics() {
        let accumulator = BatchAccumulator::<Log>::new();
        let _ = accumulator.end();
    }

    #[test]
    fn test_recording_from_several_threads() {
        let accumulator = Arc::new(BatchAccumulator::<Log>::new());
        accumulator.begin();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let accumulator = accumulator.clone();
                std::thread::spawn(move || accumulator.record(push(i)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(accumulator.end().map(|b| b.len()), Some(4));
    }
}
