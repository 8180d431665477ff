//! Serialized presentation of modal content.
//!
//! Only one alert, sheet or similar modal may be on screen at a time. A
//! [`PresentationQueue`] owns a [`SerialQueue`]: each enqueued
//! [`Presentable`] is presented on the UI queue, and the worker waits until it
//! is dismissed before presenting the next one.
//!
//! ```text
//!   Pending ──> Presenting ──> Presented ──> Finished
//!      │            │              │
//!      └─cancel─────┴─> Cancelled  └─cancel─> Dismissing ──> Finished
//! ```

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{Sender, bounded};
use parking_lot::Mutex;

use fetched_datasource_core::logging::targets;
use fetched_datasource_core::{
    DataSourceError, Result, SerialQueue, SerialQueueConfig, UiQueue,
};

/// Modal content that can be shown and taken down on the UI thread.
pub trait Presentable: Send + Sync {
    /// Show the content. Called on the UI thread.
    ///
    /// The content must eventually call [`Dismissal::dismissed`] once it is
    /// off screen, whether the user closed it or [`dismiss`](Self::dismiss)
    /// was requested. Dropping the `Dismissal` counts as dismissed.
    fn present(&self, dismissal: Dismissal);

    /// Take the content down. Called on the UI thread after a cancel.
    fn dismiss(&self);
}

/// Reports that presented content has gone away.
pub struct Dismissal {
    sender: Sender<()>,
}

impl Dismissal {
    /// Signal that the content is off screen, freeing the queue.
    pub fn dismissed(self) {
        let _ = self.sender.send(());
    }
}

impl fmt::Debug for Dismissal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dismissal").finish_non_exhaustive()
    }
}

/// Where one enqueued presentation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentationState {
    /// Waiting for earlier presentations to finish.
    Pending,
    /// Handed to the UI queue, not yet on screen.
    Presenting,
    /// On screen.
    Presented,
    /// Dismissal requested, not yet confirmed.
    Dismissing,
    /// Cancelled before it was shown.
    Cancelled,
    /// Shown and dismissed.
    Finished,
}

/// Handle to an enqueued presentation.
#[derive(Clone)]
pub struct PresentationHandle {
    state: Arc<Mutex<PresentationState>>,
    item: Arc<dyn Presentable>,
    ui: UiQueue,
}

impl fmt::Debug for PresentationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentationHandle")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl PresentationHandle {
    /// Current state.
    pub fn state(&self) -> PresentationState {
        *self.state.lock()
    }

    /// Returns `true` once the presentation will never be on screen again.
    pub fn is_finished(&self) -> bool {
        matches!(
            self.state(),
            PresentationState::Cancelled | PresentationState::Finished
        )
    }

    /// Cancel the presentation.
    ///
    /// A presentation that has not reached the screen is skipped; one that is
    /// on screen is asked to [`dismiss`](Presentable::dismiss). Returns
    /// `false` if there was nothing left to cancel.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            PresentationState::Pending | PresentationState::Presenting => {
                *state = PresentationState::Cancelled;
                tracing::debug!(target: targets::PRESENTATION, "presentation cancelled before display");
                true
            }
            PresentationState::Presented => {
                *state = PresentationState::Dismissing;
                drop(state);
                let item = self.item.clone();
                self.ui.post(move || item.dismiss());
                tracing::debug!(target: targets::PRESENTATION, "dismissing presentation");
                true
            }
            PresentationState::Dismissing
            | PresentationState::Cancelled
            | PresentationState::Finished => false,
        }
    }
}

/// Presents modal content one item at a time.
pub struct PresentationQueue {
    worker: SerialQueue,
    ui: UiQueue,
}

impl fmt::Debug for PresentationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentationQueue")
            .field("worker", &self.worker)
            .field("ui", &self.ui)
            .finish()
    }
}

impl PresentationQueue {
    /// Creates a queue presenting on `ui`.
    pub fn new(ui: UiQueue) -> std::io::Result<Self> {
        Self::with_config(ui, SerialQueueConfig::with_name("presentation"))
    }

    /// Creates a queue whose worker uses `config`.
    pub fn with_config(ui: UiQueue, config: SerialQueueConfig) -> std::io::Result<Self> {
        Ok(Self {
            worker: SerialQueue::with_config(config)?,
            ui,
        })
    }

    /// Number of presentations not yet finished or skipped.
    pub fn pending(&self) -> usize {
        self.worker.pending_tasks()
    }

    /// Enqueue `item` behind every earlier presentation.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::QueueClosed`] if the queue no longer
    /// accepts work, or [`DataSourceError::QueueFull`] if it is running but
    /// already holds as many presentations as its capacity allows.
    pub fn enqueue(&self, item: Arc<dyn Presentable>) -> Result<PresentationHandle> {
        let state = Arc::new(Mutex::new(PresentationState::Pending));
        let handle = PresentationHandle {
            state: state.clone(),
            item: item.clone(),
            ui: self.ui.clone(),
        };

        let ui = self.ui.clone();
        let accepted = self.worker.send(move || run_presentation(item, state, ui));
        if !accepted {
            if self.worker.is_running() {
                tracing::warn!(target: targets::PRESENTATION, worker = self.worker.name(), "presentation queue full");
                return Err(DataSourceError::QueueFull);
            }
            return Err(DataSourceError::QueueClosed);
        }
        Ok(handle)
    }

    /// Stop accepting presentations and wait for the current one to finish.
    pub fn shutdown(&self) -> bool {
        self.worker.stop_and_join()
    }
}

fn run_presentation(
    item: Arc<dyn Presentable>,
    state: Arc<Mutex<PresentationState>>,
    ui: UiQueue,
) {
    {
        let mut current = state.lock();
        if *current == PresentationState::Cancelled {
            tracing::trace!(target: targets::PRESENTATION, "skipping cancelled presentation");
            return;
        }
        *current = PresentationState::Presenting;
    }

    let (sender, receiver) = bounded(1);
    let dismissal = Dismissal { sender };
    let ui_state = state.clone();
    ui.post(move || {
        {
            let mut current = ui_state.lock();
            if *current == PresentationState::Cancelled {
                return;
            }
            *current = PresentationState::Presented;
        }
        tracing::debug!(target: targets::PRESENTATION, "presenting");
        item.present(dismissal);
    });

    // Either an explicit dismissal or every sender dropped.
    let _ = receiver.recv();

    let mut current = state.lock();
    if *current != PresentationState::Cancelled {
        *current = PresentationState::Finished;
    }
    tracing::trace!(target: targets::PRESENTATION, state = ?*current, "presentation done");
}
