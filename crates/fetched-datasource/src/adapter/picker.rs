//! Data source for picker widgets.
//!
//! Each section of the result set becomes one picker component. A picker
//! renders rows either as plain titles or as views, chosen once when the
//! adapter is built.

use std::sync::Arc;

use fetched_datasource_core::{Result, Signal, UiQueue};

use crate::adapter::{AdapterCore, AdapterState};
use crate::capability::{PickerTitleProvider, PickerViewProvider, ReloadPolicy};
use crate::config::AdapterConfig;
use crate::dispatch::{BatchDispatcher, BatchReport};
use crate::position::IndexPath;
use crate::result_set::ResultSet;
use crate::translate::PickerTranslator;
use crate::widget::PickerWidget;

/// How picker rows are rendered.
pub enum PickerContent<W: PickerWidget, T> {
    /// Rows are plain titles.
    Title(PickerTitleProvider<W, T>),
    /// Rows are views, possibly reusing an offscreen one.
    View(PickerViewProvider<W, T, W::View>),
}

impl<W: PickerWidget, T> PickerContent<W, T> {
    /// Render rows as titles.
    pub fn titles<F>(provider: F) -> Self
    where
        F: Fn(&W, usize, usize, &T) -> String + Send + Sync + 'static,
    {
        PickerContent::Title(Arc::new(provider))
    }

    /// Render rows as views.
    pub fn views<F>(provider: F) -> Self
    where
        F: Fn(&W, usize, usize, Option<W::View>, &T) -> W::View + Send + Sync + 'static,
    {
        PickerContent::View(Arc::new(provider))
    }
}

/// Bridges a [`ResultSet`] to a [`PickerWidget`].
pub struct PickerAdapter<R: ResultSet, W: PickerWidget> {
    core: Arc<AdapterCore<R, W, PickerTranslator>>,
    content: PickerContent<W, R::Entity>,
}

impl<R: ResultSet, W: PickerWidget> PickerAdapter<R, W> {
    /// Starts building an adapter for `widget`.
    pub fn builder(
        widget: &Arc<W>,
        result_set: Arc<R>,
        queue: UiQueue,
        content: PickerContent<W, R::Entity>,
    ) -> PickerAdapterBuilder<R, W> {
        PickerAdapterBuilder {
            widget: widget.clone(),
            result_set,
            queue,
            content,
            reload_policy: None,
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

    /// Number of components; zero before the first fetch.
    pub fn number_of_components(&self) -> usize {
        self.core.section_count()
    }

    /// Number of rows in `component`; zero before the first fetch.
    pub fn number_of_rows(&self, component: usize) -> usize {
        self.core.item_count(component)
    }

    /// The title of a row, if rows are rendered as titles.
    ///
    /// # Panics
    ///
    /// Panics if the row is outside the fetched results.
    pub fn title_for_row(&self, widget: &W, row: usize, component: usize) -> Option<String> {
        match &self.content {
            PickerContent::Title(provider) => {
                let entity = self.core.entity_at(IndexPath::new(component, row));
                Some(provider(widget, row, component, &entity))
            }
            PickerContent::View(_) => None,
        }
    }

    /// The view of a row, if rows are rendered as views.
    ///
    /// # Panics
    ///
    /// Panics if the row is outside the fetched results.
    pub fn view_for_row(
        &self,
        widget: &W,
        row: usize,
        component: usize,
        reusing: Option<W::View>,
    ) -> Option<W::View> {
        match &self.content {
            PickerContent::View(provider) => {
                let entity = self.core.entity_at(IndexPath::new(component, row));
                Some(provider(widget, row, component, reusing, &entity))
            }
            PickerContent::Title(_) => None,
        }
    }

    /// Titles for the section index.
    pub fn section_index_titles(&self) -> Vec<String> {
        self.core.index_titles()
    }

    /// The component an index title at `at` jumps to.
    pub fn component_for_index_title(&self, title: &str, at: usize) -> usize {
        self.core.section_for_index_title(title, at)
    }

    /// The entity at `row` in `component`, if any.
    pub fn object_at(&self, row: usize, component: usize) -> Option<R::Entity> {
        self.core.object_at(IndexPath::new(component, row))
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

/// Builder for [`PickerAdapter`].
pub struct PickerAdapterBuilder<R: ResultSet, W: PickerWidget> {
    widget: Arc<W>,
    result_set: Arc<R>,
    queue: UiQueue,
    content: PickerContent<W, R::Entity>,
    reload_policy: Option<ReloadPolicy<W, R::Entity>>,
    config: AdapterConfig,
}

impl<R: ResultSet, W: PickerWidget> PickerAdapterBuilder<R, W> {
    /// Decides whether an updated row reloads its component: `(widget,
    /// position, entity)` with the component as the position's section.
    pub fn reload_policy<F>(mut self, policy: F) -> Self
    where
        F: Fn(&W, IndexPath, &R::Entity) -> bool + Send + Sync + 'static,
    {
        self.reload_policy = Some(Arc::new(policy));
        self
    }

    /// Replaces the adapter configuration.
    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the adapter.
    pub fn build(self) -> PickerAdapter<R, W> {
        let dispatcher = BatchDispatcher::new(self.queue, self.config.dispatch);
        let core = AdapterCore::new(
            "picker",
            &self.widget,
            self.result_set,
            PickerTranslator,
            self.reload_policy,
            dispatcher,
        );
        PickerAdapter {
            core,
            content: self.content,
        }
    }
}
