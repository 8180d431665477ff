//! Contracts between a live result set and its change observer.
//!
//! A [`ResultSet`] is an ordered, optionally sectioned view over a store
//! query. It exposes its current contents and notifies one
//! [`ResultSetObserver`] about every transaction that changes them:
//!
//! ```text
//! will_change_content()
//!     did_change_section(..) / did_change_object(..)   *
//! did_change_content()
//! ```
//!
//! The result set holds its observer weakly, so dropping the observer is
//! always safe even while notifications are in flight.

use std::sync::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

use fetched_datasource_core::StoreResult;

use crate::change::ChangeKind;
use crate::position::IndexPath;

/// The access discipline of the store behind a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConcurrencyMode {
    /// The store is confined to the UI-owning thread.
    #[default]
    MainQueue,
    /// The store serializes access on its own private queue.
    PrivateQueue,
    /// Legacy thread confinement: the store belongs to the thread that
    /// created it.
    Confinement,
}

/// Identity of a registered observer.
///
/// Used to make subscription idempotent and to let an observer unsubscribe
/// without affecting a different observer that replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

impl ObserverId {
    /// Allocates a fresh, process-unique ID.
    pub fn next() -> Self {
        Self(NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw value of this ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Metadata describing one section of a result set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionInfo {
    /// The section's name, e.g. the grouping key value.
    pub name: String,
    /// Title displayed in the section index.
    pub index_title: Option<String>,
    /// Number of entities in the section.
    pub number_of_objects: usize,
}

impl SectionInfo {
    /// Creates section metadata.
    pub fn new(name: impl Into<String>, index_title: Option<String>, number_of_objects: usize) -> Self {
        Self {
            name: name.into(),
            index_title,
            number_of_objects,
        }
    }
}

/// Derives an index title from a section name: its first character.
pub fn default_section_index_title(section_name: &str) -> Option<String> {
    section_name.chars().next().map(String::from)
}

/// Receives the change notifications of a [`ResultSet`].
///
/// Notifications arrive on whatever thread the store mutates on.
pub trait ResultSetObserver<T>: Send + Sync {
    /// A transaction is about to report changes.
    fn will_change_content(&self);

    /// A section was inserted or deleted.
    fn did_change_section(&self, section: &SectionInfo, section_index: usize, kind: ChangeKind);

    /// An entity was inserted, deleted, moved or updated.
    fn did_change_object(
        &self,
        entity: &T,
        old: Option<IndexPath>,
        kind: ChangeKind,
        new: Option<IndexPath>,
    );

    /// The transaction has reported all of its changes.
    fn did_change_content(&self);

    /// The index title for a section with the given name.
    fn section_index_title(&self, section_name: &str) -> Option<String> {
        default_section_index_title(section_name)
    }
}

/// A live, ordered, optionally sectioned query over a store.
///
/// Implementations are externally synchronized: every method may be called
/// from any thread. Notifications must be delivered without holding locks
/// that the query methods take, and one transaction must be fully reported,
/// from `will_change_content` to `did_change_content`, before the next
/// begins.
pub trait ResultSet: Send + Sync + 'static {
    /// The entity type produced by the query.
    type Entity: Clone + Send + Sync + 'static;

    /// Executes the query synchronously, replacing the current contents.
    fn perform_fetch(&self) -> StoreResult<()>;

    /// Number of sections, or `None` before the first successful fetch.
    fn section_count(&self) -> Option<usize>;

    /// Metadata of the section at `section`, if fetched and in range.
    fn section_info(&self, section: usize) -> Option<SectionInfo>;

    /// The entity at `position`, if fetched and in range.
    fn object_at(&self, position: IndexPath) -> Option<Self::Entity>;

    /// The position of `entity`, if it is part of the results.
    fn index_path_for(&self, entity: &Self::Entity) -> Option<IndexPath>;

    /// Every fetched entity in order, or `None` before the first fetch.
    fn fetched_objects(&self) -> Option<Vec<Self::Entity>>;

    /// Index titles of all sections, in section order, without duplicates.
    fn section_index_titles(&self) -> Vec<String>;

    /// The section that an index title at `at` should jump to.
    fn section_for_index_title(&self, title: &str, at: usize) -> usize;

    /// The store's access discipline.
    fn concurrency_mode(&self) -> ConcurrencyMode;

    /// The currently registered observer.
    fn observer(&self) -> Option<ObserverId>;

    /// Registers `observer`, replacing any previous one.
    fn set_observer(&self, id: ObserverId, observer: Weak<dyn ResultSetObserver<Self::Entity>>);

    /// Unregisters the observer if it is still the one registered as `id`.
    fn clear_observer(&self, id: ObserverId);

    /// Stages removal of `entity` from the store.
    fn delete_object(&self, entity: &Self::Entity) -> StoreResult<()>;

    /// Stages insertion of `entity` into the store.
    fn insert_object(&self, entity: Self::Entity) -> StoreResult<()>;

    /// Persists staged changes, notifying the observer of their effect.
    fn save(&self) -> StoreResult<()>;

    /// Metadata of every section, or `None` before the first fetch.
    fn sections(&self) -> Option<Vec<SectionInfo>> {
        let count = self.section_count()?;
        Some((0..count).filter_map(|i| self.section_info(i)).collect())
    }
}
