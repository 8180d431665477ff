//! Fetched-results data sources for list widgets.
//!
//! A live query over a store reports each transaction as a stream of
//! fine-grained changes. The adapters in this crate collect those changes
//! into one batch per transaction, translate them into the mutation
//! primitives of a table, collection, picker or segmented widget, and apply
//! the batch atomically on the UI-owning thread, wherever the transaction
//! happened.
//!
//! ```text
//!   store thread                           UI thread
//!   ────────────                           ─────────
//!   will_change_content ─> begin
//!   did_change_*        ─> translate ─> record
//!   did_change_content  ─> end ─> dispatch ──post──> apply batch to widget
//! ```
//!
//! The adapters also implement the query side of a data source: counts, cell
//! provisioning, section titles, index navigation, and edit commits.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use fetched_datasource::store::MemoryResultSet;
//! use fetched_datasource::{
//!     BatchUpdates, ConcurrencyMode, IndexPath, PickerAdapter, PickerContent, PickerWidget,
//!     UiQueue,
//! };
//!
//! #[derive(Default)]
//! struct Wheel {
//!     reloads: Mutex<Vec<usize>>,
//! }
//!
//! impl BatchUpdates for Wheel {}
//!
//! impl PickerWidget for Wheel {
//!     type View = String;
//!
//!     fn reload_component(&self, component: usize) {
//!         self.reloads.lock().unwrap().push(component);
//!     }
//!
//!     fn reload_all_components(&self) {}
//! }
//!
//! # fn main() -> fetched_datasource::Result<()> {
//! let ui = UiQueue::for_current_thread();
//! let wheel = Arc::new(Wheel::default());
//! let sizes = Arc::new(MemoryResultSet::single_section(
//!     ConcurrencyMode::MainQueue,
//!     vec!["small", "large"],
//! ));
//!
//! let picker = PickerAdapter::builder(
//!     &wheel,
//!     sizes.clone(),
//!     ui.clone(),
//!     PickerContent::titles(|_, _, _, size: &&str| size.to_string()),
//! )
//! .build();
//! picker.perform_fetch()?;
//! assert_eq!(picker.number_of_rows(0), 2);
//!
//! sizes.transaction(|tx| tx.insert(IndexPath::new(0, 1), "medium"));
//! assert_eq!(*wheel.reloads.lock().unwrap(), vec![0]);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod batch;
pub mod capability;
pub mod change;
pub mod config;
pub mod dispatch;
pub mod insertion;
pub mod position;
pub mod presentation;
pub mod result_set;
pub mod store;
pub mod translate;
pub mod widget;

pub use fetched_datasource_core::{
    ConnectionId, DataSourceError, Result, SerialQueue, SerialQueueBuilder, SerialQueueConfig,
    Signal, StoreError, StoreResult, ThreadAffinity, UiQueue,
};

pub use adapter::{
    AdapterState, CollectionAdapter, CollectionAdapterBuilder, EditCompletion, EditStyle,
    PickerAdapter, PickerAdapterBuilder, PickerContent, SegmentedAdapter,
    SegmentedAdapterBuilder, TableAdapter, TableAdapterBuilder,
};
pub use batch::{Batch, BatchAccumulator, Update};
pub use capability::{
    CellProvider, InsertionCapability, InsertionCompletion, MoveCapability, MoveHandler,
    PickerTitleProvider, PickerViewProvider, ReloadPolicy, SegmentTitleProvider,
    SupplementaryProvider,
};
pub use change::{ChangeEvent, ChangeKind};
pub use config::{AdapterConfig, CompletionMode, DispatchConfig, RowAnimation, ThreadPolicy};
pub use dispatch::{BatchDispatcher, BatchReport};
pub use insertion::{EntityFactory, StoreInsertion};
pub use position::{IndexPath, IndexTarget};
pub use presentation::{
    Dismissal, Presentable, PresentationHandle, PresentationQueue, PresentationState,
};
pub use result_set::{
    ConcurrencyMode, ObserverId, ResultSet, ResultSetObserver, SectionInfo,
    default_section_index_title,
};
pub use translate::{
    CollectionTranslator, PickerTranslator, SegmentedTranslator, TableTranslator,
    UpdateTranslator,
};
pub use widget::{
    BatchCompletion, BatchUpdates, CollectionWidget, PickerWidget, SegmentedWidget, TableWidget,
};
