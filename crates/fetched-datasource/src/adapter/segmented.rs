//! Data source for segmented controls.
//!
//! A segmented control shows the rows of a single-section result set as
//! titled segments. Unlike the list widgets it does not query its data
//! source; the adapter pushes segments into it, starting with the initial
//! fetch.

use std::sync::Arc;

use fetched_datasource_core::logging::targets;
use fetched_datasource_core::{Result, Signal, UiQueue};

use crate::adapter::{AdapterCore, AdapterState};
use crate::batch::{Batch, Update};
use crate::capability::{ReloadPolicy, SegmentTitleProvider};
use crate::config::AdapterConfig;
use crate::dispatch::{BatchDispatcher, BatchReport};
use crate::position::IndexPath;
use crate::result_set::ResultSet;
use crate::translate::SegmentedTranslator;
use crate::widget::SegmentedWidget;

/// Bridges a single-section [`ResultSet`] to a [`SegmentedWidget`].
pub struct SegmentedAdapter<R: ResultSet, W: SegmentedWidget> {
    core: Arc<AdapterCore<R, W, SegmentedTranslator<W, R::Entity>>>,
}

impl<R: ResultSet, W: SegmentedWidget> SegmentedAdapter<R, W> {
    /// Starts building an adapter for `widget`.
    pub fn builder<F>(
        widget: &Arc<W>,
        result_set: Arc<R>,
        queue: UiQueue,
        titles: F,
    ) -> SegmentedAdapterBuilder<R, W>
    where
        F: Fn(&W, usize, &R::Entity) -> String + Send + Sync + 'static,
    {
        SegmentedAdapterBuilder {
            widget: widget.clone(),
            result_set,
            queue,
            titles: Arc::new(titles),
            reload_policy: None,
            config: AdapterConfig::default(),
        }
    }

    /// Subscribes, fetches, and inserts one segment per fetched entity.
    ///
    /// The initial segments are applied like any other batch: in place on
    /// the UI thread, or posted to the UI queue.
    pub fn perform_fetch(&self) -> Result<()> {
        self.core.perform_fetch()?;

        let Some(widget) = self.core.widget() else {
            tracing::debug!(target: targets::ADAPTER, "segmented widget released before initial population");
            return Ok(());
        };

        let translator = self.core.translator();
        let animated = translator.animated();
        let count = self.core.item_count(0);
        let mut updates: Vec<Update<W>> = Vec::with_capacity(count);
        for index in 0..count {
            let entity = self.core.entity_at(IndexPath::new(0, index));
            let title = translator.title(&widget, index, &entity);
            updates.push(Box::new(move |w: &W| {
                w.insert_segment(Some(title), index, animated)
            }));
        }

        if !updates.is_empty() {
            self.core.dispatch(Batch::from_updates(updates));
        }
        Ok(())
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

    /// Number of fetched entities; zero before the first fetch.
    pub fn number_of_segments(&self) -> usize {
        self.core.item_count(0)
    }

    /// The title the entity at `index` renders as.
    pub fn title_at(&self, widget: &W, index: usize) -> Option<String> {
        let entity = self.core.object_at(IndexPath::new(0, index))?;
        Some(self.core.translator().title(widget, index, &entity))
    }

    /// The entity at `index`, if any.
    pub fn object_at(&self, index: usize) -> Option<R::Entity> {
        self.core.object_at(IndexPath::new(0, index))
    }

    /// The segment index of `entity`, if it is part of the results.
    pub fn index_for(&self, entity: &R::Entity) -> Option<usize> {
        self.core
            .result_set()
            .index_path_for(entity)
            .map(|path| path.row)
    }

    /// Every fetched entity, or `None` before the first fetch.
    pub fn fetched_objects(&self) -> Option<Vec<R::Entity>> {
        self.core.result_set().fetched_objects()
    }
}

/// Builder for [`SegmentedAdapter`].
pub struct SegmentedAdapterBuilder<R: ResultSet, W: SegmentedWidget> {
    widget: Arc<W>,
    result_set: Arc<R>,
    queue: UiQueue,
    titles: SegmentTitleProvider<W, R::Entity>,
    reload_policy: Option<ReloadPolicy<W, R::Entity>>,
    config: AdapterConfig,
}

impl<R: ResultSet, W: SegmentedWidget> SegmentedAdapterBuilder<R, W> {
    /// Decides whether an updated entity is retitled. Defaults to always.
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
    pub fn build(self) -> SegmentedAdapter<R, W> {
        let dispatcher = BatchDispatcher::new(self.queue, self.config.dispatch);
        let translator = SegmentedTranslator::new(self.titles, self.config.animate_segments);
        let core = AdapterCore::new(
            "segmented",
            &self.widget,
            self.result_set,
            translator,
            self.reload_policy,
            dispatcher,
        );
        SegmentedAdapter { core }
    }
}
