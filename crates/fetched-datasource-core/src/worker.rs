//! Serial queues: a dedicated thread draining an owned FIFO of tasks.
//!
//! A [`SerialQueue`] is the explicit, owned replacement for a process-wide
//! "max one concurrent operation" queue. Whoever needs serialized background
//! work constructs one and holds it; dropping it shuts the thread down.
//!
//! # Example
//!
//! ```no_run
//! use fetched_datasource_core::{SerialQueue, SerialQueueBuilder, UiQueue};
//!
//! let ui = UiQueue::for_current_thread();
//! let worker = SerialQueueBuilder::new().name("store-save").build().unwrap();
//!
//! worker.send(|| println!("runs on the worker thread"));
//! worker.send_with_callback(
//!     || 2 + 2,
//!     &ui,
//!     |sum| println!("runs on the UI thread: {sum}"),
//! );
//!
//! worker.stop_and_join();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::Mutex;

use crate::logging::targets;
use crate::queue::UiQueue;

/// Default capacity for the task queue.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Configuration for creating a [`SerialQueue`].
#[derive(Debug, Clone)]
pub struct SerialQueueConfig {
    /// Name for the worker thread.
    pub name: String,
    /// Stack size for the worker thread in bytes. `None` uses the default.
    pub stack_size: Option<usize>,
    /// Capacity of the task queue.
    pub queue_capacity: usize,
}

impl Default for SerialQueueConfig {
    fn default() -> Self {
        Self {
            name: "fetched-serial".to_string(),
            stack_size: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl SerialQueueConfig {
    /// Create a new configuration with the given thread name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Builder for [`SerialQueue`]s with custom configuration.
#[derive(Debug, Default)]
pub struct SerialQueueBuilder {
    config: SerialQueueConfig,
}

impl SerialQueueBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the stack size for the worker thread.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Set the task queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Spawn the worker thread.
    pub fn build(self) -> std::io::Result<SerialQueue> {
        SerialQueue::with_config(self.config)
    }
}

enum SerialTask {
    Execute(Box<dyn FnOnce() + Send>),
    Shutdown,
}

struct SerialState {
    running: AtomicBool,
    pending_tasks: AtomicUsize,
}

/// A dedicated thread that runs submitted tasks one at a time, in order.
pub struct SerialQueue {
    name: String,
    sender: Sender<SerialTask>,
    handle: Mutex<Option<JoinHandle<()>>>,
    state: Arc<SerialState>,
}

static_assertions::assert_impl_all!(SerialQueue: Send, Sync);

impl std::fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialQueue")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("pending_tasks", &self.pending_tasks())
            .finish()
    }
}

impl SerialQueue {
    /// Spawn a serial queue with default configuration.
    pub fn new() -> std::io::Result<Self> {
        Self::with_config(SerialQueueConfig::default())
    }

    /// Spawn a serial queue with custom configuration.
    pub fn with_config(config: SerialQueueConfig) -> std::io::Result<Self> {
        let (sender, receiver) = bounded(config.queue_capacity);
        let state = Arc::new(SerialState {
            running: AtomicBool::new(true),
            pending_tasks: AtomicUsize::new(0),
        });

        let mut builder = thread::Builder::new().name(config.name.clone());
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let thread_state = state.clone();
        let handle = builder.spawn(move || {
            serial_loop(receiver, &thread_state);
            thread_state.running.store(false, Ordering::Release);
        })?;

        tracing::debug!(target: targets::QUEUE, name = %config.name, "serial queue started");

        Ok(Self {
            name: config.name,
            sender,
            handle: Mutex::new(Some(handle)),
            state,
        })
    }

    /// The worker thread's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the queue still accepts tasks.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Number of tasks submitted but not yet finished.
    pub fn pending_tasks(&self) -> usize {
        self.state.pending_tasks.load(Ordering::Acquire)
    }

    /// Submit a task.
    ///
    /// Returns `false` if the queue has been stopped or is full.
    pub fn send<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.is_running() {
            return false;
        }

        self.state.pending_tasks.fetch_add(1, Ordering::AcqRel);
        match self.sender.try_send(SerialTask::Execute(Box::new(task))) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.state.pending_tasks.fetch_sub(1, Ordering::AcqRel);
                tracing::warn!(target: targets::QUEUE, name = %self.name, "serial queue rejected task");
                false
            }
        }
    }

    /// Submit a task whose result is delivered to `callback` on the UI queue.
    ///
    /// Returns `false` if the task was not accepted.
    pub fn send_with_callback<T, F, C>(&self, task: F, ui: &UiQueue, callback: C) -> bool
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let ui = ui.clone();
        self.send(move || {
            let result = task();
            ui.post(move || callback(result));
        })
    }

    /// Stop accepting tasks. Tasks already queued still run.
    pub fn stop(&self) {
        if self.state.running.swap(false, Ordering::AcqRel) {
            let _ = self.sender.try_send(SerialTask::Shutdown);
        }
    }

    /// Wait for the worker thread to exit.
    ///
    /// Returns `true` if the thread was joined, `false` if it was already
    /// joined or panicked.
    pub fn join(&self) -> bool {
        let handle = self.handle.lock().take();
        match handle {
            Some(h) if h.thread().id() != thread::current().id() => h.join().is_ok(),
            _ => false,
        }
    }

    /// Stop the queue and wait for it to finish.
    pub fn stop_and_join(&self) -> bool {
        self.stop();
        self.join()
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        self.stop();
    }
}

fn serial_loop(receiver: Receiver<SerialTask>, state: &SerialState) {
    while let Ok(task) = receiver.recv() {
        match task {
            SerialTask::Execute(task) => {
                task();
                state.pending_tasks.fetch_sub(1, Ordering::AcqRel);
            }
            SerialTask::Shutdown => {
                while let Ok(SerialTask::Execute(task)) = receiver.try_recv() {
                    task();
                    state.pending_tasks.fetch_sub(1, Ordering::AcqRel);
                }
                break;
            }
        }
    }
}
