//! Data source for table widgets.

use std::sync::Arc;

use fetched_datasource_core::{Result, Signal, UiQueue};

use crate::adapter::{AdapterCore, AdapterState, EditCompletion, EditStyle};
use crate::capability::{CellProvider, InsertionCapability, MoveCapability, ReloadPolicy};
use crate::config::AdapterConfig;
use crate::dispatch::{BatchDispatcher, BatchReport};
use crate::position::IndexPath;
use crate::result_set::ResultSet;
use crate::translate::TableTranslator;
use crate::widget::TableWidget;

/// Bridges a [`ResultSet`] to a [`TableWidget`].
///
/// # Example
///
/// ```ignore
/// let adapter = TableAdapter::builder(&table, results.clone(), ui.clone(), |_table, _at, person: &Person| {
///     Cell::with_text(&person.name)
/// })
/// .reload_policy(|_table, _at, person| person.name_changed())
/// .build();
///
/// adapter.perform_fetch()?;
/// assert_eq!(adapter.number_of_sections(), 1);
/// ```
pub struct TableAdapter<R: ResultSet, W: TableWidget> {
    core: Arc<AdapterCore<R, W, TableTranslator>>,
    cells: CellProvider<W, R::Entity, W::Cell>,
    insertion: Option<Arc<dyn InsertionCapability<W, R::Entity>>>,
    mover: Option<Arc<dyn MoveCapability<W, R::Entity>>>,
}

impl<R: ResultSet, W: TableWidget> TableAdapter<R, W> {
    /// Starts building an adapter for `widget`.
    pub fn builder<F>(
        widget: &Arc<W>,
        result_set: Arc<R>,
        queue: UiQueue,
        cells: F,
    ) -> TableAdapterBuilder<R, W>
    where
        F: Fn(&W, IndexPath, &R::Entity) -> W::Cell + Send + Sync + 'static,
    {
        TableAdapterBuilder {
            widget: widget.clone(),
            result_set,
            queue,
            cells: Arc::new(cells),
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

    /// The result set backing this adapter.
    pub fn result_set(&self) -> &Arc<R> {
        self.core.result_set()
    }

    /// Emitted on the UI thread after every batch.
    pub fn batch_applied(&self) -> &Signal<BatchReport> {
        self.core.batch_applied()
    }

    /// Number of sections; zero before the first fetch.
    pub fn number_of_sections(&self) -> usize {
        self.core.section_count()
    }

    /// Number of rows in `section`; zero before the first fetch.
    pub fn number_of_rows(&self, section: usize) -> usize {
        self.core.item_count(section)
    }

    /// Produces the cell for the row at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position` is outside the fetched results.
    pub fn cell_at(&self, widget: &W, position: IndexPath) -> W::Cell {
        debug_assert!(self.core.is_served_widget(widget), "called from unregistered table widget");
        let entity = self.core.entity_at(position);
        (self.cells)(widget, position, &entity)
    }

    /// Header title of `section`: the section name.
    pub fn title_for_header(&self, section: usize) -> Option<String> {
        self.core.section_name(section)
    }

    /// Titles for the section index.
    pub fn section_index_titles(&self) -> Vec<String> {
        self.core.index_titles()
    }

    /// The section an index title at `at` jumps to.
    pub fn section_for_index_title(&self, title: &str, at: usize) -> usize {
        self.core.section_for_index_title(title, at)
    }

    /// Commits an edit on the row at `position`.
    ///
    /// A delete stages removal of the entity; the row disappears once the
    /// store reports the deletion. An insert hands the work to the insertion
    /// capability and reports its outcome to `completion` on the UI thread.
    ///
    /// # Errors
    ///
    /// Returns the store's error if a delete fails, or
    /// [`MissingCapability`](fetched_datasource_core::DataSourceError::MissingCapability)
    /// for an insert without an insertion capability.
    pub fn commit_edit(
        &self,
        style: EditStyle,
        position: IndexPath,
        completion: Option<EditCompletion<R::Entity>>,
    ) -> Result<()> {
        self.core
            .commit_edit(style, position, self.insertion.as_deref(), completion)
    }

    /// Whether the row at `position` can be reordered.
    pub fn can_move_row(&self, widget: &W, position: IndexPath) -> bool {
        match &self.mover {
            Some(mover) => {
                let entity = self.core.entity_at(position);
                mover.can_move(widget, position, &entity)
            }
            None => false,
        }
    }

    /// Commits a reorder performed by the user.
    pub fn move_row(&self, widget: &W, from: IndexPath, to: IndexPath) {
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

/// Builder for [`TableAdapter`].
pub struct TableAdapterBuilder<R: ResultSet, W: TableWidget> {
    widget: Arc<W>,
    result_set: Arc<R>,
    queue: UiQueue,
    cells: CellProvider<W, R::Entity, W::Cell>,
    reload_policy: Option<ReloadPolicy<W, R::Entity>>,
    insertion: Option<Arc<dyn InsertionCapability<W, R::Entity>>>,
    mover: Option<Arc<dyn MoveCapability<W, R::Entity>>>,
    config: AdapterConfig,
}

impl<R: ResultSet, W: TableWidget> TableAdapterBuilder<R, W> {
    /// Decides whether updated rows are reloaded. Defaults to always.
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

    /// Enables row reordering.
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

    /// Builds the adapter. It stays unfetched until
    /// [`perform_fetch`](TableAdapter::perform_fetch).
    pub fn build(self) -> TableAdapter<R, W> {
        let dispatcher = BatchDispatcher::new(self.queue, self.config.dispatch);
        let core = AdapterCore::new(
            "table",
            &self.widget,
            self.result_set,
            TableTranslator::new(self.config.row_animation),
            self.reload_policy,
            dispatcher,
        );
        TableAdapter {
            core,
            cells: self.cells,
            insertion: self.insertion,
            mover: self.mover,
        }
    }
}
