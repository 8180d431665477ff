//! Logging facilities for fetched-results data sources.
//!
//! All crates in the workspace log through the `tracing` crate with the
//! targets listed in [`targets`]. Install a subscriber in the host application
//! to see them:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("fetched_datasource::dispatch=debug")
//!     .init();
//! ```

/// Span names used for tracing.
pub mod span_names {
    /// Application of one batch to a widget.
    pub const APPLY_BATCH: &str = "fetched_datasource::apply_batch";
    /// Draining of the UI queue.
    pub const DRAIN_QUEUE: &str = "fetched_datasource::drain_queue";
}

/// Target names for log filtering.
pub mod targets {
    /// Batch accumulation (begin/record/end).
    pub const BATCH: &str = "fetched_datasource::batch";
    /// Batch dispatch and application.
    pub const DISPATCH: &str = "fetched_datasource::dispatch";
    /// Adapter lifecycle and data-source queries.
    pub const ADAPTER: &str = "fetched_datasource::adapter";
    /// Store and result-set notifications.
    pub const STORE: &str = "fetched_datasource::store";
    /// UI queue and serial workers.
    pub const QUEUE: &str = "fetched_datasource::queue";
    /// Serialized presentation of modal content.
    pub const PRESENTATION: &str = "fetched_datasource::presentation";
    /// Signal emission.
    pub const SIGNAL: &str = "fetched_datasource::signal";
    /// Performance spans.
    pub const PERF: &str = "fetched_datasource::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used to measure how long a batch takes to apply.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a new performance span for `operation`.
    pub fn new(operation: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation);
        Self {
            span: span.entered(),
        }
    }
}
