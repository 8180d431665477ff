//! Configuration for batch dispatch and adapters.
//!
//! # Example
//!
//! ```
//! use fetched_datasource::{AdapterConfig, CompletionMode, RowAnimation, ThreadPolicy};
//!
//! let config = AdapterConfig::new()
//!     .with_thread_policy(ThreadPolicy::Lenient)
//!     .with_completion(CompletionMode::DebugAssert)
//!     .with_row_animation(RowAnimation::Fade);
//!
//! assert_eq!(config.dispatch.thread_policy, ThreadPolicy::Lenient);
//! ```

/// Decides when a batch may be applied on the calling thread.
///
/// In either policy the calling thread must own the UI queue; the policies
/// differ in which store concurrency modes they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThreadPolicy {
    /// Only a store confined to the UI queue counts as being on the correct
    /// thread.
    #[default]
    Strict,
    /// Legacy thread-confined stores count as well.
    Lenient,
}

/// How the widget's report of an interrupted batch animation is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompletionMode {
    /// Do not ask the widget for a completion report.
    Ignore,
    /// Log interrupted batches at warn level.
    #[default]
    Log,
    /// Interrupted batches fail a debug assertion. Release builds log them.
    DebugAssert,
}

/// Animation used for table row and section instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowAnimation {
    /// Let the widget pick a suitable animation.
    #[default]
    Automatic,
    /// Fade in or out.
    Fade,
    /// Slide from or to the left.
    Left,
    /// Slide from or to the right.
    Right,
    /// Slide from or to the top.
    Top,
    /// Slide from or to the bottom.
    Bottom,
    /// Keep the content centered while it appears or disappears.
    Middle,
    /// No animation.
    None,
}

/// Settings of a batch dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchConfig {
    /// When batches run on the calling thread.
    pub thread_policy: ThreadPolicy,
    /// What happens with the widget's completion report.
    pub completion: CompletionMode,
}

impl DispatchConfig {
    /// Creates the default dispatch configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the thread policy.
    pub fn with_thread_policy(mut self, policy: ThreadPolicy) -> Self {
        self.thread_policy = policy;
        self
    }

    /// Sets the completion mode.
    pub fn with_completion(mut self, completion: CompletionMode) -> Self {
        self.completion = completion;
        self
    }
}

/// Settings shared by all list adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Batch dispatch settings.
    pub dispatch: DispatchConfig,
    /// Animation for table instructions.
    pub row_animation: RowAnimation,
    /// Whether segmented-control mutations animate.
    pub animate_segments: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            row_animation: RowAnimation::default(),
            animate_segments: true,
        }
    }
}

impl AdapterConfig {
    /// Creates the default adapter configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the dispatch settings.
    pub fn with_dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Sets the thread policy.
    pub fn with_thread_policy(mut self, policy: ThreadPolicy) -> Self {
        self.dispatch.thread_policy = policy;
        self
    }

    /// Sets the completion mode.
    pub fn with_completion(mut self, completion: CompletionMode) -> Self {
        self.dispatch.completion = completion;
        self
    }

    /// Sets the table row animation.
    pub fn with_row_animation(mut self, animation: RowAnimation) -> Self {
        self.row_animation = animation;
        self
    }

    /// Sets whether segment changes animate.
    pub fn with_animated_segments(mut self, animated: bool) -> Self {
        self.animate_segments = animated;
        self
    }
}
