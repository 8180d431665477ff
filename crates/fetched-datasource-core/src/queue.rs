//! The UI-owning execution queue.
//!
//! Widget mutations must happen on one designated thread. [`UiQueue`] is an
//! explicitly constructed handle to that thread's FIFO task queue: any thread
//! may [`post`](UiQueue::post) work to it, and the owning thread drains it from
//! its event loop with [`run_pending`](UiQueue::run_pending).
//!
//! # Example
//!
//! ```
//! use fetched_datasource_core::UiQueue;
//!
//! let queue = UiQueue::for_current_thread();
//!
//! let handle = queue.clone();
//! std::thread::spawn(move || {
//!     handle.post(|| println!("runs on the UI thread"));
//! })
//! .join()
//! .unwrap();
//!
//! assert_eq!(queue.run_pending(), 1);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::logging::{PerfSpan, span_names, targets};
use crate::thread_check::ThreadAffinity;

/// A unique identifier for a posted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw u64 value of this task ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

/// A type-erased unit of work waiting for the UI thread.
pub struct QueuedInvocation {
    id: TaskId,
    invoke: Box<dyn FnOnce() + Send>,
}

impl QueuedInvocation {
    /// Wrap a closure for deferred execution.
    pub fn new<F>(invoke: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id: next_task_id(),
            invoke: Box::new(invoke),
        }
    }

    /// The ID assigned at creation.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Execute the invocation.
    pub fn execute(self) {
        (self.invoke)();
    }
}

struct UiQueueInner {
    affinity: ThreadAffinity,
    sender: Sender<QueuedInvocation>,
    receiver: Receiver<QueuedInvocation>,
    pending: AtomicUsize,
}

/// Cloneable handle to the UI-owning thread's task queue.
///
/// Tasks run in the order they were posted. Posting never blocks.
#[derive(Clone)]
pub struct UiQueue {
    inner: Arc<UiQueueInner>,
}

static_assertions::assert_impl_all!(UiQueue: Send, Sync, Clone);

impl std::fmt::Debug for UiQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiQueue")
            .field("thread", &self.inner.affinity.thread_id())
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl UiQueue {
    /// Create a queue owned by the calling thread.
    ///
    /// Call this once from the UI thread during startup and hand clones to
    /// the subsystems that need to reach it.
    pub fn for_current_thread() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            inner: Arc::new(UiQueueInner {
                affinity: ThreadAffinity::current(),
                sender,
                receiver,
                pending: AtomicUsize::new(0),
            }),
        }
    }

    /// Returns `true` if the calling thread owns this queue.
    #[inline]
    pub fn is_current(&self) -> bool {
        self.inner.affinity.is_same_thread()
    }

    /// The affinity of the owning thread.
    pub fn affinity(&self) -> ThreadAffinity {
        self.inner.affinity
    }

    /// Post a task to run on the owning thread.
    ///
    /// Returns immediately. The task runs during a later drain, after every
    /// task posted before it.
    pub fn post<F>(&self, task: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        let invocation = QueuedInvocation::new(task);
        let id = invocation.id();
        self.inner.pending.fetch_add(1, Ordering::AcqRel);
        // The receiver lives in the same Arc as the sender, so this cannot fail.
        let _ = self.inner.sender.send(invocation);
        tracing::trace!(target: targets::QUEUE, task = id.as_u64(), "posted task to UI queue");
        id
    }

    /// Number of tasks waiting to run.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Returns `true` if tasks are waiting to run.
    pub fn has_pending(&self) -> bool {
        self.pending_count() > 0
    }

    /// Run the tasks that were pending when the drain started.
    ///
    /// Tasks posted by running tasks are left for the next drain. Returns the
    /// number of tasks executed.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the owning thread.
    pub fn run_pending(&self) -> usize {
        self.inner
            .affinity
            .assert_same_thread_with_msg("UiQueue drained from a thread that does not own it");

        let _span = PerfSpan::new(span_names::DRAIN_QUEUE);
        let budget = self.pending_count();
        let mut executed = 0;
        while executed < budget {
            match self.inner.receiver.try_recv() {
                Ok(invocation) => {
                    self.execute(invocation);
                    executed += 1;
                }
                Err(_) => break,
            }
        }
        executed
    }

    /// Block until a task arrives or `timeout` elapses, then drain.
    ///
    /// Returns the number of tasks executed, zero on timeout.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the owning thread.
    pub fn wait_and_run(&self, timeout: Duration) -> usize {
        self.inner
            .affinity
            .assert_same_thread_with_msg("UiQueue drained from a thread that does not own it");

        match self.inner.receiver.recv_timeout(timeout) {
            Ok(invocation) => {
                self.execute(invocation);
                1 + self.run_pending()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Keep draining until `done` returns `true` or `timeout` elapses.
    ///
    /// Returns `true` if the predicate was satisfied.
    pub fn run_until<P>(&self, timeout: Duration, mut done: P) -> bool
    where
        P: FnMut() -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            self.run_pending();
            if done() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.wait_and_run((deadline - now).min(Duration::from_millis(10)));
        }
    }

    fn execute(&self, invocation: QueuedInvocation) {
        self.inner.pending.fetch_sub(1, Ordering::AcqRel);
        tracing::trace!(target: targets::QUEUE, task = invocation.id().as_u64(), "running UI task");
        invocation.execute();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_post_and_run_in_order() {
        let queue = UiQueue::for_current_thread();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let log = log.clone();
            queue.post(move || log.lock().push(i));
        }
        assert_eq!(queue.pending_count(), 3);

        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        assert!(!queue.has_pending());
    }

    #[test]
    fn test_tasks_posted_while_draining_run_next_time() {
        let queue = UiQueue::for_current_thread();
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_queue = queue.clone();
        let inner_log = log.clone();
        queue.post(move || {
            inner_log.lock().push("outer");
            let log = inner_log.clone();
            inner_queue.post(move || log.lock().push("inner"));
        });

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(*log.lock(), vec!["outer"]);
        assert_eq!(queue.run_pending(), 1);
        assert_eq!(*log.lock(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_post_from_other_thread() {
        let queue = UiQueue::for_current_thread();
        let ran_on = Arc::new(Mutex::new(None));

        let handle = queue.clone();
        let ran_on_clone = ran_on.clone();
        std::thread::spawn(move || {
            assert!(!handle.is_current());
            handle.post(move || {
                *ran_on_clone.lock() = Some(std::thread::current().id());
            });
        })
        .join()
        .unwrap();

        assert!(ran_on.lock().is_none());
        queue.run_pending();
        assert_eq!(*ran_on.lock(), Some(std::thread::current().id()));
    }

    #[test]
    fn test_drain_from_wrong_thread_panics() {
        let queue = UiQueue::for_current_thread();
        let handle = queue.clone();
        let result = std::thread::spawn(move || handle.run_pending()).join();
        assert!(result.is_err());
    }

    #[test]
    fn test_wait_and_run_times_out() {
        let queue = UiQueue::for_current_thread();
        assert_eq!(queue.wait_and_run(Duration::from_millis(5)), 0);
    }

    #[test]
    fn test_run_until_picks_up_late_tasks() {
        let queue = UiQueue::for_current_thread();
        let flag = Arc::new(Mutex::new(false));

        let handle = queue.clone();
        let flag_clone = flag.clone();
        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            handle.post(move || *flag_clone.lock() = true);
        });

        assert!(queue.run_until(Duration::from_secs(5), || *flag.lock()));
        worker.join().unwrap();
    }
}
