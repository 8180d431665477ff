//! Delivery of finished batches to their widget on the UI-owning thread.
//!
//! A dispatcher decides once per batch whether it may apply the batch in
//! place. If not, the entire batch is posted to the [`UiQueue`] as a single
//! task, so batches reach the widget in the order their transactions ended.
//!
//! The widget is held weakly. A batch whose widget is gone by the time it is
//! applied does nothing: view teardown racing a pending notification is
//! expected, not an error.

use std::sync::{Arc, Weak};

use fetched_datasource_core::logging::{PerfSpan, span_names, targets};
use fetched_datasource_core::{Signal, ThreadAffinity, UiQueue};

use crate::batch::Batch;
use crate::config::{CompletionMode, DispatchConfig, ThreadPolicy};
use crate::result_set::ConcurrencyMode;
use crate::widget::{BatchCompletion, BatchUpdates};

/// What happened to one dispatched batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of instructions in the batch.
    pub instructions: usize,
    /// `false` if the widget had been released and nothing was applied.
    pub applied: bool,
    /// `true` if the batch ran on the thread that ended the transaction.
    pub inline: bool,
}

/// Applies batches to widgets on the UI-owning thread.
#[derive(Debug, Clone)]
pub struct BatchDispatcher {
    queue: UiQueue,
    config: DispatchConfig,
    reports: Arc<Signal<BatchReport>>,
}

impl BatchDispatcher {
    /// Creates a dispatcher delivering to `queue`.
    pub fn new(queue: UiQueue, config: DispatchConfig) -> Self {
        Self {
            queue,
            config,
            reports: Arc::new(Signal::new()),
        }
    }

    /// The UI queue batches are delivered to.
    pub fn queue(&self) -> &UiQueue {
        &self.queue
    }

    /// The dispatch settings.
    pub fn config(&self) -> DispatchConfig {
        self.config
    }

    /// Emitted on the UI thread after every batch, applied or not.
    pub fn batch_applied(&self) -> &Signal<BatchReport> {
        &self.reports
    }

    /// Returns `true` if a batch from a store in `mode` may run in place.
    pub fn runs_inline(&self, mode: ConcurrencyMode) -> bool {
        let relevant = match self.config.thread_policy {
            ThreadPolicy::Strict => mode == ConcurrencyMode::MainQueue,
            ThreadPolicy::Lenient => {
                matches!(mode, ConcurrencyMode::MainQueue | ConcurrencyMode::Confinement)
            }
        };
        relevant && self.queue.is_current()
    }

    /// Applies `batch` to `widget`, in place or via the UI queue.
    ///
    /// Never blocks: a marshalled batch is posted and this returns at once.
    pub fn dispatch<W: BatchUpdates>(&self, widget: &Weak<W>, batch: Batch<W>, mode: ConcurrencyMode) {
        if self.runs_inline(mode) {
            tracing::debug!(target: targets::DISPATCH, len = batch.len(), ?mode, "applying batch inline");
            let affinity = self.queue.affinity();
            apply(widget, batch, self.config.completion, &self.reports, affinity, true);
            return;
        }

        tracing::debug!(target: targets::DISPATCH, len = batch.len(), ?mode, "marshalling batch to UI queue");
        let widget = widget.clone();
        let completion = self.config.completion;
        let reports = self.reports.clone();
        let affinity = self.queue.affinity();
        self.queue.post(move || apply(&widget, batch, completion, &reports, affinity, false));
    }
}

fn apply<W: BatchUpdates>(
    widget: &Weak<W>,
    batch: Batch<W>,
    completion: CompletionMode,
    reports: &Signal<BatchReport>,
    affinity: ThreadAffinity,
    inline: bool,
) {
    affinity.debug_assert_same_thread_with_msg("batch applied off the UI thread");
    let instructions = batch.len();
    let Some(widget) = widget.upgrade() else {
        if cfg!(debug_assertions) {
            tracing::warn!(target: targets::DISPATCH, instructions, "widget released before its batch was applied");
        }
        reports.emit(BatchReport {
            instructions,
            applied: false,
            inline,
        });
        return;
    };

    let _span = PerfSpan::new(span_names::APPLY_BATCH);
    let widget = &*widget;
    if widget.supports_batch_updates() {
        let mut pending = Some(batch);
        let mut run = || {
            if let Some(batch) = pending.take() {
                batch.apply(widget);
            }
        };
        widget.perform_batch_updates(&mut run, completion_handler(completion, instructions));
    } else {
        widget.begin_updates();
        batch.apply(widget);
        widget.end_updates();
    }

    tracing::trace!(target: targets::DISPATCH, instructions, inline, "batch applied");
    reports.emit(BatchReport {
        instructions,
        applied: true,
        inline,
    });
}

fn completion_handler(mode: CompletionMode, instructions: usize) -> Option<BatchCompletion> {
    match mode {
        CompletionMode::Ignore => None,
        CompletionMode::Log => Some(Box::new(move |finished| {
            if !finished {
                tracing::warn!(target: targets::DISPATCH, instructions, "batch animations were interrupted");
            }
        })),
        CompletionMode::DebugAssert => Some(Box::new(move |finished| {
            debug_assert!(finished, "batch of {instructions} instructions was interrupted");
            if !finished {
                tracing::warn!(target: targets::DISPATCH, instructions, "batch animations were interrupted");
            }
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Update;
    use parking_lot::Mutex;
    use std::thread::ThreadId;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        atomic: bool,
        interrupt: bool,
        calls: Mutex<Vec<String>>,
        threads: Mutex<Vec<ThreadId>>,
    }

    impl Recorder {
        fn atomic() -> Self {
            Self {
                atomic: true,
                ..Default::default()
            }
        }

        fn push(&self, call: &str) {
            self.calls.lock().push(call.to_string());
            self.threads.lock().push(std::thread::current().id());
        }
    }

    impl BatchUpdates for Recorder {
        fn supports_batch_updates(&self) -> bool {
            self.atomic
        }

        fn perform_batch_updates(&self, updates: &mut dyn FnMut(), completion: Option<BatchCompletion>) {
            self.push("perform");
            updates();
            if let Some(completion) = completion {
                completion(!self.interrupt);
            }
        }

        fn begin_updates(&self) {
            self.push("begin");
        }

        fn end_updates(&self) {
            self.push("end");
        }
    }

    fn batch(names: &[&'static str]) -> Batch<Recorder> {
        let updates: Vec<Update<Recorder>> = names
            .iter()
            .map(|&name| Box::new(move |w: &Recorder| w.push(name)) as Update<Recorder>)
            .collect();
        Batch::from_updates(updates)
    }

    fn reports(dispatcher: &BatchDispatcher) -> Arc<Mutex<Vec<BatchReport>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        dispatcher
            .batch_applied()
            .connect(move |report| seen_clone.lock().push(*report));
        seen
    }

    #[test]
    fn test_inline_when_main_queue_on_ui_thread() {
        let queue = UiQueue::for_current_thread();
        let dispatcher = BatchDispatcher::new(queue.clone(), DispatchConfig::default());
        let seen = reports(&dispatcher);
        let widget = Arc::new(Recorder::atomic());

        dispatcher.dispatch(&Arc::downgrade(&widget), batch(&["a", "b"]), ConcurrencyMode::MainQueue);

        assert_eq!(*widget.calls.lock(), vec!["perform", "a", "b"]);
        assert_eq!(queue.pending_count(), 0);
        assert_eq!(
            *seen.lock(),
            vec![BatchReport {
                instructions: 2,
                applied: true,
                inline: true
            }]
        );
    }

    #[test]
    fn test_private_queue_store_is_marshalled() {
        let queue = UiQueue::for_current_thread();
        let dispatcher = BatchDispatcher::new(queue.clone(), DispatchConfig::default());
        let widget = Arc::new(Recorder::atomic());

        dispatcher.dispatch(&Arc::downgrade(&widget), batch(&["a"]), ConcurrencyMode::PrivateQueue);

        assert!(widget.calls.lock().is_empty());
        assert_eq!(queue.run_pending(), 1);
        assert_eq!(*widget.calls.lock(), vec!["perform", "a"]);
    }

    #[test]
    fn test_thread_policy_decides_confinement() {
        let queue = UiQueue::for_current_thread();
        let strict = BatchDispatcher::new(queue.clone(), DispatchConfig::default());
        let lenient = BatchDispatcher::new(
            queue.clone(),
            DispatchConfig::new().with_thread_policy(ThreadPolicy::Lenient),
        );

        assert!(!strict.runs_inline(ConcurrencyMode::Confinement));
        assert!(lenient.runs_inline(ConcurrencyMode::Confinement));
        assert!(!lenient.runs_inline(ConcurrencyMode::PrivateQueue));

        let handle = std::thread::spawn(move || lenient.runs_inline(ConcurrencyMode::MainQueue));
        assert!(!handle.join().unwrap());
    }

    #[test]
    fn test_batch_from_worker_lands_on_ui_thread_once() {
        let queue = UiQueue::for_current_thread();
        let dispatcher = BatchDispatcher::new(queue.clone(), DispatchConfig::default());
        let widget = Arc::new(Recorder::atomic());

        let weak = Arc::downgrade(&widget);
        let worker_dispatcher = dispatcher.clone();
        std::thread::spawn(move || {
            worker_dispatcher.dispatch(&weak, batch(&["x", "y", "z"]), ConcurrencyMode::MainQueue);
        })
        .join()
        .unwrap();

        assert!(widget.calls.lock().is_empty());
        assert!(queue.run_until(Duration::from_secs(5), || !widget.calls.lock().is_empty()));
        assert_eq!(*widget.calls.lock(), vec!["perform", "x", "y", "z"]);
        let ui = std::thread::current().id();
        assert!(widget.threads.lock().iter().all(|id| *id == ui));
    }

    #[test]
    fn test_released_widget_is_a_noop() {
        let queue = UiQueue::for_current_thread();
        let dispatcher = BatchDispatcher::new(queue.clone(), DispatchConfig::default());
        let seen = reports(&dispatcher);
        let widget = Arc::new(Recorder::atomic());

        dispatcher.dispatch(&Arc::downgrade(&widget), batch(&["a"]), ConcurrencyMode::PrivateQueue);
        drop(widget);

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(
            *seen.lock(),
            vec![BatchReport {
                instructions: 1,
                applied: false,
                inline: false
            }]
        );
    }

    #[test]
    fn test_bracket_fallback_without_batch_primitive() {
        let queue = UiQueue::for_current_thread();
        let dispatcher = BatchDispatcher::new(queue, DispatchConfig::default());
        let widget = Arc::new(Recorder::default());

        dispatcher.dispatch(&Arc::downgrade(&widget), batch(&["a", "b"]), ConcurrencyMode::MainQueue);

        assert_eq!(*widget.calls.lock(), vec!["begin", "a", "b", "end"]);
    }

    #[test]
    fn test_interrupted_batch_is_logged_not_fatal() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let queue = UiQueue::for_current_thread();
        let dispatcher = BatchDispatcher::new(queue, DispatchConfig::default());
        let widget = Arc::new(Recorder {
            atomic: true,
            interrupt: true,
            ..Default::default()
        });

        dispatcher.dispatch(&Arc::downgrade(&widget), batch(&["a"]), ConcurrencyMode::MainQueue);
        assert_eq!(*widget.calls.lock(), vec!["perform", "a"]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "was interrupted")]
    fn test_interrupted_batch_asserts_in_debug() {
        let queue = UiQueue::for_current_thread();
        let dispatcher = BatchDispatcher::new(
            queue,
            DispatchConfig::new().with_completion(CompletionMode::DebugAssert),
        );
        let widget = Arc::new(Recorder {
            atomic: true,
            interrupt: true,
            ..Default::default()
        });

        dispatcher.dispatch(&Arc::downgrade(&widget), batch(&["a"]), ConcurrencyMode::MainQueue);
    }
}
