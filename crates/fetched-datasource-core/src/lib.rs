//! Core plumbing for fetched-results data sources.
//!
//! This crate holds the pieces that have nothing to do with lists but that
//! every list adapter leans on:
//!
//! - **UI Queue**: an explicitly owned handle to the UI thread's FIFO task queue
//! - **Serial Queues**: dedicated single-worker threads for ordered background work
//! - **Thread Affinity**: checks that thread-confined work stays on its thread
//! - **Signals**: direct-connection notification of interested parties
//! - **Errors**: the recoverable error taxonomy shared by the workspace
//! - **Logging**: `tracing` targets and spans
//!
//! # Example
//!
//! ```
//! use fetched_datasource_core::{Signal, UiQueue};
//!
//! let queue = UiQueue::for_current_thread();
//! let applied = Signal::<usize>::new();
//! applied.connect(|count| println!("applied {count} instructions"));
//!
//! let handle = queue.clone();
//! std::thread::spawn(move || {
//!     handle.post(move || println!("widget mutation on the UI thread"));
//! })
//! .join()
//! .unwrap();
//!
//! queue.run_pending();
//! applied.emit(1);
//! ```

mod error;
pub mod logging;
pub mod queue;
pub mod signal;
pub mod thread_check;
pub mod worker;

pub use error::{DataSourceError, Result, StoreError, StoreResult};
pub use logging::PerfSpan;
pub use queue::{TaskId, UiQueue};
pub use signal::{ConnectionId, Signal};
pub use thread_check::ThreadAffinity;
pub use worker::{SerialQueue, SerialQueueBuilder, SerialQueueConfig};
