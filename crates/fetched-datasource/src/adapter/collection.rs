//! Data source for collection widgets.

use std::sync::Arc;

use fetched_datasource_core::{Result, Signal, UiQueue};

use crate::adapter::{AdapterCore, AdapterState, EditCompletion, EditStyle};
use crate::capability::{
    CellProvider, InsertionCapability, MoveCapability, ReloadPolicy, SupplementaryProvider,
};
use crate::config::AdapterConfig;
use crate::dispatch::{BatchDispatcher, BatchReport};
use crate::position::{IndexPath, IndexTarget};
use crate::result_set::ResultSet;
use crate::translate::CollectionTranslator;
use crate::widget::CollectionWidget;

/// Bridges a [`ResultSet`] to a [`CollectionWidget`].
///
/// Besides item cells, a collection adapter can provide supplementary views
/// (headers, footers, decorations) and index-title navigation.
pub struct CollectionAdapter<R: ResultSet, W: CollectionWidget> {
    core: Arc<AdapterCore<R, W, CollectionTranslator>>,
    cells: CellProvider<W, R::Entity, W::Cell>,
    supplementary: Option<SupplementaryProvider<W, R::Entity, W::SupplementaryView>>,
    insertion: Option<Arc<dyn InsertionCapability<W, R::Entity>>>,
    mover: Option<Arc<dyn MoveCapability<W, R::Entity>>>,
}

impl<R: ResultSet, W: CollectionWidget> CollectionAdapter<R, W> {
    /// Starts building an adapter for `widget`.
    pub fn builder<F>(
        widget: &Arc<W>,
        result_set: Arc<R>,
        queue: UiQueue,
        cells: F,
    ) -> CollectionAdapterBuilder<R, W>
    where
        F: Fn(&W, IndexPath, &R::Entity) -> W::Cell + Send + Sync + 'static,
    {
        CollectionAdapterBuilder {
            widget: widget.clone(),
            result_set,
            queue,
            cells: Arc::new(cells),
            supplementary: None,
            reload_policy: None,
            insertion: None,
            mover: None,
            config: AdapterConfig::default(),
        }
    }

    /// Subscribes to the result set and performs the initial fetch.
    pub fn perform_fetch(&self) -> Result<()> {
        self.core.perform_fetch()
    }

    /// Lifecycle state.
    pub fn state(&self) -> AdapterState {
        self.core.state()
    }

    /// The served widget, unless it has been released.
    pub fn widget(&self) -> Option<Arc<W>> {
        self.core.widget()
    }

    /// Emitted on the UI thread after every batch.
    pub fn batch_applied(&self) -> &Signal<BatchReport> {
        self.core.batch_applied()
    }

    /// Number of sections; zero before the first fetch.
    pub fn number_of_sections(&self) -> usize {
        self.core.section_count()
    }

    /// Number of items in `section`; zero before the first fetch.
    pub fn number_of_items(&self, section: usize) -> usize {
        self.core.item_count(section)
    }

    /// Produces the cell for the item at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position` is outside the fetched results.
    pub fn cell_at(&self, widget: &W, position: IndexPath) -> W::Cell {
        debug_assert!(
            self.core.is_served_widget(widget),
            "called from unregistered collection widget"
        );
        let entity = self.core.entity_at(position);
        (self.cells)(widget, position, &entity)
    }

    /// Returns `true` if a supplementary-view provider was configured.
    pub fn has_supplementary_views(&self) -> bool {
        self.supplementary.is_some()
    }

    /// Produces the supplementary view of `kind` at `position`.
    ///
    /// # Panics
    ///
    /// Panics if no supplementary-view provider was configured, or if
    /// `position` is outside the fetched results.
    pub fn supplementary_view(&self, widget: &W, kind: &str, position: IndexPath) -> W::SupplementaryView {
        let Some(provider) = &self.supplementary else {
            panic!("supplementary view of kind {kind:?} requested without a supplementary provider");
        };
        let entity = self.core.entity_at(position);
        provider(widget, kind, position, &entity)
    }

    /// Titles for the index view.
    pub fn index_titles(&self) -> Vec<String> {
        self.core.index_titles()
    }

    /// Where the index title at `at` jumps to: always a whole section.
    pub fn index_target_for_title(&self, title: &str, at: usize) -> IndexTarget {
        IndexTarget::Section(self.core.section_for_index_title(title, at))
    }

    /// Commits an edit on the item at `position`.
    ///
    /// See [`TableAdapter::commit_edit`](crate::TableAdapter::commit_edit).
    pub fn commit_edit(
        &self,
        style: EditStyle,
        position: IndexPath,
        completion: Option<EditCompletion<R::Entity>>,
    ) -> Result<()> {
        self.core
            .commit_edit(style, position, self.insertion.as_deref(), completion)
    }

    /// Whether the item at `position` can be reordered.
    pub fn can_move_item(&self, widget: &W, position: IndexPath) -> bool {
        self.mover.as_ref().is_some_and(|mover| {
            let entity = self.core.entity_at(position);
            mover.can_move(widget, position, &entity)
        })
    }

    /// Commits a reorder performed by the user.
    pub fn move_item(&self, widget: &W, from: IndexPath, to: IndexPath) {
        if let Some(mover) = &self.mover {
            let entity = self.core.entity_at(from);
            mover.move_item(widget, from, to, &entity);
        }
    }

    /// The entity at `position`, if any.
    pub fn object_at(&self, position: IndexPath) -> Option<R::Entity> {
        self.core.object_at(position)
    }

    /// The position of `entity`, if it is part of the results.
    pub fn index_path_for(&self, entity: &R::Entity) -> Option<IndexPath> {
        self.core.result_set().index_path_for(entity)
    }

    /// Every fetched entity, or `None` before the first fetch.
    pub fn fetched_objects(&self) -> Option<Vec<R::Entity>> {
        self.core.result_set().fetched_objects()
    }
}

/// Builder for [`CollectionAdapter`].
pub struct CollectionAdapterBuilder<R: ResultSet, W: CollectionWidget> {
    widget: Arc<W>,
    result_set: Arc<R>,
    queue: UiQueue,
    cells: CellProvider<W, R::Entity, W::Cell>,
    supplementary: Option<SupplementaryProvider<W, R::Entity, W::SupplementaryView>>,
    reload_policy: Option<ReloadPolicy<W, R::Entity>>,
    insertion: Option<Arc<dyn InsertionCapability<W, R::Entity>>>,
    mover: Option<Arc<dyn MoveCapability<W, R::Entity>>>,
    config: AdapterConfig,
}

impl<R: ResultSet, W: CollectionWidget> CollectionAdapterBuilder<R, W> {
    /// Provides supplementary views.
    pub fn supplementary<F>(mut self, provider: F) -> Self
    where
        F: Fn(&W, &str, IndexPath, &R::Entity) -> W::SupplementaryView + Send + Sync + 'static,
    {
        self.supplementary = Some(Arc::new(provider));
        self
    }

    /// Decides whether updated items are reloaded. Defaults to always.
    pub fn reload_policy<F>(mut self, policy: F) -> Self
    where
        F: Fn(&W, IndexPath, &R::Entity) -> bool + Send + Sync + 'static,
    {
        self.reload_policy = Some(Arc::new(policy));
        self
    }

    /// Enables insert-style edits.
    pub fn insertion<I>(mut self, insertion: I) -> Self
    where
        I: InsertionCapability<W, R::Entity> + 'static,
    {
        self.insertion = Some(Arc::new(insertion));
        self
    }

    /// Enables item reordering.
    pub fn mover<M>(mut self, mover: M) -> Self
    where
        M: MoveCapability<W, R::Entity> + 'static,
    {
        self.mover = Some(Arc::new(mover));
        self
    }

    /// Replaces the adapter configuration.
    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the adapter.
    pub fn build(self) -> CollectionAdapter<R, W> {
        let dispatcher = BatchDispatcher::new(self.queue, self.config.dispatch);
        let core = AdapterCore::new(
            "collection",
            &self.widget,
            self.result_set,
            CollectionTranslator,
            self.reload_policy,
            dispatcher,
        );
        CollectionAdapter {
            core,
            cells: self.cells,
            supplementary: self.supplementary,
            insertion: self.insertion,
            mover: self.mover,
        }
    }
}
