//! List adapters: data sources bridging a result set to a widget.
//!
//! Every adapter shares the same core:
//!
//! - It holds its widget weakly and its result set strongly.
//! - It subscribes to the result set on [`perform_fetch`](AdapterCore::perform_fetch)
//!   and unsubscribes when dropped.
//! - It turns each transaction into one batch through a [`BatchAccumulator`],
//!   a widget-specific [`UpdateTranslator`] and a [`BatchDispatcher`].
//! - It answers count and lookup queries from the result set.
//!
//! ```text
//!   Unfetched ──perform_fetch()──> Live ──drop──> (released)
//! ```

mod collection;
mod picker;
mod segmented;
mod table;

pub use collection::{CollectionAdapter, CollectionAdapterBuilder};
pub use picker::{PickerAdapter, PickerAdapterBuilder, PickerContent};
pub use segmented::{SegmentedAdapter, SegmentedAdapterBuilder};
pub use table::{TableAdapter, TableAdapterBuilder};

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use fetched_datasource_core::logging::targets;
use fetched_datasource_core::{DataSourceError, Result, Signal, UiQueue};

use crate::batch::{Batch, BatchAccumulator};
use crate::capability::{InsertionCapability, InsertionCompletion, ReloadPolicy};
use crate::change::{ChangeEvent, ChangeKind};
use crate::dispatch::{BatchDispatcher, BatchReport};
use crate::position::IndexPath;
use crate::result_set::{ObserverId, ResultSet, ResultSetObserver, SectionInfo};
use crate::translate::UpdateTranslator;
use crate::widget::BatchUpdates;

/// Lifecycle state of an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterState {
    /// No fetch has completed yet. Every count is zero.
    Unfetched,
    /// Subscribed and backed by fetched results.
    Live,
}

/// The style of an edit the user committed on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditStyle {
    /// No edit.
    #[default]
    None,
    /// Remove the entity at the position.
    Delete,
    /// Create a new entity at the position.
    Insert,
}

/// Receives the outcome of an insert-style edit, on the UI thread.
pub type EditCompletion<T> = Box<dyn FnOnce(fetched_datasource_core::StoreResult<T>) + Send>;

pub(crate) struct AdapterCore<R: ResultSet, W, X> {
    id: ObserverId,
    widget: Weak<W>,
    result_set: Arc<R>,
    translator: X,
    reload_policy: Option<ReloadPolicy<W, R::Entity>>,
    accumulator: BatchAccumulator<W>,
    dispatcher: BatchDispatcher,
    state: Mutex<AdapterState>,
    kind: &'static str,
}

impl<R, W, X> AdapterCore<R, W, X>
where
    R: ResultSet,
    W: BatchUpdates,
    X: UpdateTranslator<W, R::Entity>,
{
    pub(crate) fn new(
        kind: &'static str,
        widget: &Arc<W>,
        result_set: Arc<R>,
        translator: X,
        reload_policy: Option<ReloadPolicy<W, R::Entity>>,
        dispatcher: BatchDispatcher,
    ) -> Arc<Self> {
        let core = Arc::new(Self {
            id: ObserverId::next(),
            widget: Arc::downgrade(widget),
            result_set,
            translator,
            reload_policy,
            accumulator: BatchAccumulator::new(),
            dispatcher,
            state: Mutex::new(AdapterState::Unfetched),
            kind,
        });
        tracing::debug!(target: targets::ADAPTER, kind, id = core.id.as_u64(), "adapter created");
        core
    }

    pub(crate) fn perform_fetch(self: &Arc<Self>) -> Result<()> {
        if self.result_set.observer() != Some(self.id) {
            let observer = Arc::downgrade(self);
            let observer: Weak<dyn ResultSetObserver<R::Entity>> = observer;
            self.result_set.set_observer(self.id, observer);
            tracing::debug!(target: targets::ADAPTER, kind = self.kind, id = self.id.as_u64(), "subscribed to result set");
        }

        self.result_set.perform_fetch()?;
        *self.state.lock() = AdapterState::Live;
        tracing::debug!(
            target: targets::ADAPTER,
            kind = self.kind,
            sections = self.section_count(),
            "fetch completed"
        );
        Ok(())
    }

    pub(crate) fn state(&self) -> AdapterState {
        *self.state.lock()
    }

    pub(crate) fn widget(&self) -> Option<Arc<W>> {
        self.widget.upgrade()
    }

    pub(crate) fn is_served_widget(&self, widget: &W) -> bool {
        std::ptr::eq(self.widget.as_ptr(), widget)
    }

    pub(crate) fn result_set(&self) -> &Arc<R> {
        &self.result_set
    }

    pub(crate) fn translator(&self) -> &X {
        &self.translator
    }

    pub(crate) fn queue(&self) -> &UiQueue {
        self.dispatcher.queue()
    }

    pub(crate) fn batch_applied(&self) -> &Signal<BatchReport> {
        self.dispatcher.batch_applied()
    }

    pub(crate) fn dispatch(&self, batch: Batch<W>) {
        self.dispatcher
            .dispatch(&self.widget, batch, self.result_set.concurrency_mode());
    }

    pub(crate) fn section_count(&self) -> usize {
        if self.state() == AdapterState::Unfetched {
            return 0;
        }
        self.result_set.section_count().unwrap_or(0)
    }

    pub(crate) fn item_count(&self, section: usize) -> usize {
        if self.state() == AdapterState::Unfetched {
            return 0;
        }
        self.result_set
            .section_info(section)
            .map_or(0, |info| info.number_of_objects)
    }

    pub(crate) fn section_name(&self, section: usize) -> Option<String> {
        self.result_set.section_info(section).map(|info| info.name)
    }

    pub(crate) fn index_titles(&self) -> Vec<String> {
        self.result_set.section_index_titles()
    }

    pub(crate) fn section_for_index_title(&self, title: &str, at: usize) -> usize {
        self.result_set.section_for_index_title(title, at)
    }

    pub(crate) fn object_at(&self, position: IndexPath) -> Option<R::Entity> {
        self.result_set.object_at(position)
    }

    /// The entity the widget asked for.
    ///
    /// # Panics
    ///
    /// Panics if `position` is outside the last reported counts.
    pub(crate) fn entity_at(&self, position: IndexPath) -> R::Entity {
        match self.result_set.object_at(position) {
            Some(entity) => entity,
            None => panic!(
                "{} data source asked for {position}, which is outside the fetched results",
                self.kind
            ),
        }
    }

    pub(crate) fn commit_edit(
        &self,
        style: EditStyle,
        position: IndexPath,
        insertion: Option<&dyn InsertionCapability<W, R::Entity>>,
        completion: Option<EditCompletion<R::Entity>>,
    ) -> Result<()> {
        match style {
            EditStyle::Delete => {
                let entity = self.entity_at(position);
                self.result_set.delete_object(&entity)?;
                tracing::debug!(target: targets::ADAPTER, kind = self.kind, %position, "deleted entity");
                Ok(())
            }
            EditStyle::Insert => {
                let insertion = insertion.ok_or(DataSourceError::MissingCapability("insertion"))?;
                let widget = self.widget().ok_or(DataSourceError::NoWidget)?;
                let queue = self.queue().clone();
                let done = InsertionCompletion::new(move |result| {
                    if let Some(completion) = completion {
                        queue.post(move || completion(result));
                    }
                });
                tracing::debug!(target: targets::ADAPTER, kind = self.kind, %position, "inserting entity");
                insertion.insert(&widget, position, done);
                Ok(())
            }
            EditStyle::None => {
                tracing::debug!(target: targets::ADAPTER, kind = self.kind, %position, "commit with no editing style");
                Ok(())
            }
        }
    }

    fn record(&self, event: ChangeEvent<R::Entity>, subject: Option<&R::Entity>) {
        self.accumulator.assert_open();

        let Some(upgraded) = self.widget.upgrade() else {
            tracing::debug!(target: targets::BATCH, kind = self.kind, change = %event.kind(), "widget released, dropping change");
            return;
        };
        let widget: &W = &upgraded;

        if let ChangeEvent::ItemUpdated { position, entity } = &event {
            if let Some(policy) = &self.reload_policy {
                if !policy(widget, *position, entity) {
                    tracing::trace!(target: targets::BATCH, %position, "reload declined by policy");
                    return;
                }
            }
        }

        if let Some(update) = self.translator.translate(widget, event, subject) {
            self.accumulator.record(update);
        }
    }
}

impl<R, W, X> ResultSetObserver<R::Entity> for AdapterCore<R, W, X>
where
    R: ResultSet,
    W: BatchUpdates,
    X: UpdateTranslator<W, R::Entity>,
{
    fn will_change_content(&self) {
        self.accumulator.begin();
    }

    fn did_change_section(&self, _section: &SectionInfo, section_index: usize, kind: ChangeKind) {
        match ChangeEvent::from_section(kind, section_index) {
            Some(event) => self.record(event, None),
            None => {
                tracing::warn!(target: targets::BATCH, %kind, section_index, "ignoring unknown section change type");
            }
        }
    }

    fn did_change_object(
        &self,
        entity: &R::Entity,
        old: Option<IndexPath>,
        kind: ChangeKind,
        new: Option<IndexPath>,
    ) {
        match ChangeEvent::from_item(kind, old, new, entity.clone()) {
            Some(event) => self.record(event, Some(entity)),
            None => {
                tracing::warn!(target: targets::BATCH, %kind, "ignoring unknown object change type");
            }
        }
    }

    fn did_change_content(&self) {
        if let Some(batch) = self.accumulator.end() {
            self.dispatch(batch);
        }
    }
}

impl<R: ResultSet, W, X> Drop for AdapterCore<R, W, X> {
    fn drop(&mut self) {
        self.result_set.clear_observer(self.id);
        tracing::debug!(target: targets::ADAPTER, kind = self.kind, id = self.id.as_u64(), "adapter released");
    }
}
