//! An in-memory result set.
//!
//! `MemoryResultSet` keeps its entities in sections held in memory and
//! reports every [`transaction`](MemoryResultSet::transaction) to its
//! observer on the calling thread: begin, one notification per mutation in
//! the order performed, end. Positions in notifications are the positions at
//! the moment each mutation was applied.
//!
//! Deletions and insertions requested through the [`ResultSet`] editing
//! methods are staged and only applied, as one transaction, by
//! [`save`](ResultSet::save).
//!
//! Transactions from different threads are serialized: a store-owned
//! delivery lock is held from the first mutation until the end notification,
//! so an observer never sees two transactions interleave.
//!
//! # Example
//!
//! ```
//! use fetched_datasource::store::MemoryResultSet;
//! use fetched_datasource::{ConcurrencyMode, IndexPath, ResultSet};
//!
//! let results = MemoryResultSet::with_sections(
//!     ConcurrencyMode::MainQueue,
//!     vec![("Fruit", vec!["apple", "banana"])],
//! );
//! results.perform_fetch().unwrap();
//!
//! results.transaction(|tx| {
//!     tx.insert(IndexPath::new(0, 2), "cherry");
//!     tx.delete(IndexPath::new(0, 0));
//! });
//! assert_eq!(results.fetched_objects(), Some(vec!["banana", "cherry"]));
//! ```

use std::sync::Weak;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Mutex, ReentrantMutex, RwLock};

use fetched_datasource_core::logging::targets;
use fetched_datasource_core::{StoreError, StoreResult};

use crate::change::ChangeKind;
use crate::position::IndexPath;
use crate::result_set::{
    ConcurrencyMode, ObserverId, ResultSet, ResultSetObserver, SectionInfo,
    default_section_index_title,
};

struct MemorySection<T> {
    name: String,
    objects: Vec<T>,
}

enum Staged<T> {
    Insert(T),
    Delete(T),
}

enum Notification<T> {
    Section {
        name: String,
        number_of_objects: usize,
        index: usize,
        kind: ChangeKind,
    },
    Object {
        entity: T,
        old: Option<IndexPath>,
        kind: ChangeKind,
        new: Option<IndexPath>,
    },
}

struct ObserverSlot<T> {
    id: ObserverId,
    observer: Weak<dyn ResultSetObserver<T>>,
}

/// Mutations performed inside [`MemoryResultSet::transaction`].
///
/// Every method applies its mutation immediately and queues the matching
/// notification. Out-of-range positions panic, like slice indexing.
pub struct Transaction<'a, T> {
    sections: &'a mut Vec<MemorySection<T>>,
    notifications: Vec<Notification<T>>,
}

impl<T: Clone + PartialEq> Transaction<'_, T> {
    /// Number of sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Number of entities in `section`.
    pub fn section_len(&self, section: usize) -> usize {
        self.sections[section].objects.len()
    }

    /// The entity at `at`, if any.
    pub fn get(&self, at: IndexPath) -> Option<&T> {
        self.sections.get(at.section)?.objects.get(at.row)
    }

    /// The current position of `entity`.
    pub fn position_of(&self, entity: &T) -> Option<IndexPath> {
        position_in(self.sections, entity)
    }

    /// Inserts an empty section named `name` at `index`.
    pub fn insert_section(&mut self, index: usize, name: impl Into<String>) {
        let name = name.into();
        self.sections.insert(
            index,
            MemorySection {
                name: name.clone(),
                objects: Vec::new(),
            },
        );
        self.notifications.push(Notification::Section {
            name,
            number_of_objects: 0,
            index,
            kind: ChangeKind::Insert,
        });
    }

    /// Deletes the section at `index` with all of its entities.
    ///
    /// Only the section deletion is reported, as a store would.
    pub fn delete_section(&mut self, index: usize) {
        let section = self.sections.remove(index);
        self.notifications.push(Notification::Section {
            name: section.name,
            number_of_objects: section.objects.len(),
            index,
            kind: ChangeKind::Delete,
        });
    }

    /// Inserts `entity` at `at`.
    pub fn insert(&mut self, at: IndexPath, entity: T) {
        self.sections[at.section].objects.insert(at.row, entity.clone());
        self.notifications.push(Notification::Object {
            entity,
            old: None,
            kind: ChangeKind::Insert,
            new: Some(at),
        });
    }

    /// Removes and returns the entity at `at`.
    pub fn delete(&mut self, at: IndexPath) -> T {
        let entity = self.sections[at.section].objects.remove(at.row);
        self.notifications.push(Notification::Object {
            entity: entity.clone(),
            old: Some(at),
            kind: ChangeKind::Delete,
            new: None,
        });
        entity
    }

    /// Moves the entity at `from` so that it ends up at `to`.
    pub fn move_item(&mut self, from: IndexPath, to: IndexPath) {
        let entity = self.sections[from.section].objects.remove(from.row);
        self.sections[to.section].objects.insert(to.row, entity.clone());
        self.notifications.push(Notification::Object {
            entity,
            old: Some(from),
            kind: ChangeKind::Move,
            new: Some(to),
        });
    }

    /// Replaces the entity at `at` with `entity`.
    pub fn update(&mut self, at: IndexPath, entity: T) {
        self.sections[at.section].objects[at.row] = entity.clone();
        self.notifications.push(Notification::Object {
            entity,
            old: Some(at),
            kind: ChangeKind::Update,
            new: Some(at),
        });
    }

    /// Reports a section change without mutating anything.
    ///
    /// Lets a caller relay notifications from another source verbatim,
    /// including kinds the adapters reject or do not know.
    pub fn notify_section(&mut self, index: usize, kind: ChangeKind) {
        let (name, number_of_objects) = self
            .sections
            .get(index)
            .map(|s| (s.name.clone(), s.objects.len()))
            .unwrap_or_default();
        self.notifications.push(Notification::Section {
            name,
            number_of_objects,
            index,
            kind,
        });
    }

    /// Reports an object change without mutating anything.
    pub fn notify_object(
        &mut self,
        entity: T,
        old: Option<IndexPath>,
        kind: ChangeKind,
        new: Option<IndexPath>,
    ) {
        self.notifications.push(Notification::Object {
            entity,
            old,
            kind,
            new,
        });
    }
}

fn position_in<T: PartialEq>(sections: &[MemorySection<T>], entity: &T) -> Option<IndexPath> {
    sections.iter().enumerate().find_map(|(section, s)| {
        s.objects
            .iter()
            .position(|candidate| candidate == entity)
            .map(|row| IndexPath::new(section, row))
    })
}

/// A sectioned result set held in memory.
pub struct MemoryResultSet<T> {
    sections: RwLock<Vec<MemorySection<T>>>,
    delivery: ReentrantMutex<()>,
    fetched: AtomicBool,
    fetch_count: AtomicUsize,
    staged: Mutex<Vec<Staged<T>>>,
    observer: Mutex<Option<ObserverSlot<T>>>,
    mode: ConcurrencyMode,
    fetch_failure: Mutex<Option<StoreError>>,
    save_failure: Mutex<Option<StoreError>>,
}

impl<T> std::fmt::Debug for MemoryResultSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryResultSet")
            .field("sections", &self.sections.read().len())
            .field("fetched", &self.fetched.load(Ordering::Acquire))
            .field("mode", &self.mode)
            .finish()
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> MemoryResultSet<T> {
    /// Creates an empty result set with no sections.
    pub fn new(mode: ConcurrencyMode) -> Self {
        Self::with_sections(mode, Vec::<(String, Vec<T>)>::new())
    }

    /// Creates a result set with one unnamed section.
    pub fn single_section(mode: ConcurrencyMode, objects: Vec<T>) -> Self {
        Self::with_sections(mode, vec![(String::new(), objects)])
    }

    /// Creates a result set with the given named sections.
    pub fn with_sections<N: Into<String>>(mode: ConcurrencyMode, sections: Vec<(N, Vec<T>)>) -> Self {
        let sections = sections
            .into_iter()
            .map(|(name, objects)| MemorySection {
                name: name.into(),
                objects,
            })
            .collect();
        Self {
            sections: RwLock::new(sections),
            delivery: ReentrantMutex::new(()),
            fetched: AtomicBool::new(false),
            fetch_count: AtomicUsize::new(0),
            staged: Mutex::new(Vec::new()),
            observer: Mutex::new(None),
            mode,
            fetch_failure: Mutex::new(None),
            save_failure: Mutex::new(None),
        }
    }

    /// Makes the next [`perform_fetch`](ResultSet::perform_fetch) fail.
    pub fn fail_next_fetch(&self, error: StoreError) {
        *self.fetch_failure.lock() = Some(error);
    }

    /// Makes the next [`save`](ResultSet::save) fail, keeping staged changes.
    pub fn fail_next_save(&self, error: StoreError) {
        *self.save_failure.lock() = Some(error);
    }

    /// Number of successful fetches so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::Acquire)
    }

    /// Number of staged, unsaved changes.
    pub fn staged_count(&self) -> usize {
        self.staged.lock().len()
    }

    /// Performs mutations as one transaction and reports them.
    ///
    /// The observer is notified on the calling thread after the mutations
    /// are applied. Only the delivery lock is held while it runs, so it may
    /// query the result set. Concurrent transactions wait for the one in
    /// progress to be fully reported. Nothing is reported before the first
    /// successful fetch.
    pub fn transaction<F, Out>(&self, mutate: F) -> Out
    where
        F: FnOnce(&mut Transaction<'_, T>) -> Out,
    {
        let _delivery = self.delivery.lock();
        let (out, notifications) = {
            let mut sections = self.sections.write();
            let mut tx = Transaction {
                sections: &mut sections,
                notifications: Vec::new(),
            };
            let out = mutate(&mut tx);
            (out, tx.notifications)
        };
        self.deliver(notifications);
        out
    }

    fn current_observer(&self) -> Option<std::sync::Arc<dyn ResultSetObserver<T>>> {
        self.observer.lock().as_ref()?.observer.upgrade()
    }

    fn deliver(&self, notifications: Vec<Notification<T>>) {
        if !self.fetched.load(Ordering::Acquire) {
            return;
        }
        let Some(observer) = self.current_observer() else {
            return;
        };

        tracing::trace!(target: targets::STORE, changes = notifications.len(), "delivering transaction");
        observer.will_change_content();
        for notification in notifications {
            match notification {
                Notification::Section {
                    name,
                    number_of_objects,
                    index,
                    kind,
                } => {
                    let index_title = observer.section_index_title(&name);
                    let info = SectionInfo::new(name, index_title, number_of_objects);
                    observer.did_change_section(&info, index, kind);
                }
                Notification::Object {
                    entity,
                    old,
                    kind,
                    new,
                } => observer.did_change_object(&entity, old, kind, new),
            }
        }
        observer.did_change_content();
    }

    fn index_title(&self, name: &str) -> Option<String> {
        match self.current_observer() {
            Some(observer) => observer.section_index_title(name),
            None => default_section_index_title(name),
        }
    }

    fn section_names(&self) -> Vec<String> {
        self.sections.read().iter().map(|s| s.name.clone()).collect()
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ResultSet for MemoryResultSet<T> {
    type Entity = T;

    fn perform_fetch(&self) -> StoreResult<()> {
        if let Some(error) = self.fetch_failure.lock().take() {
            tracing::debug!(target: targets::STORE, %error, "fetch failed");
            return Err(error);
        }
        self.fetched.store(true, Ordering::Release);
        self.fetch_count.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn section_count(&self) -> Option<usize> {
        if !self.fetched.load(Ordering::Acquire) {
            return None;
        }
        Some(self.sections.read().len())
    }

    fn section_info(&self, section: usize) -> Option<SectionInfo> {
        if !self.fetched.load(Ordering::Acquire) {
            return None;
        }
        let (name, count) = {
            let sections = self.sections.read();
            let s = sections.get(section)?;
            (s.name.clone(), s.objects.len())
        };
        let index_title = self.index_title(&name);
        Some(SectionInfo::new(name, index_title, count))
    }

    fn object_at(&self, position: IndexPath) -> Option<T> {
        if !self.fetched.load(Ordering::Acquire) {
            return None;
        }
        self.sections
            .read()
            .get(position.section)?
            .objects
            .get(position.row)
            .cloned()
    }

    fn index_path_for(&self, entity: &T) -> Option<IndexPath> {
        if !self.fetched.load(Ordering::Acquire) {
            return None;
        }
        position_in(&self.sections.read(), entity)
    }

    fn fetched_objects(&self) -> Option<Vec<T>> {
        if !self.fetched.load(Ordering::Acquire) {
            return None;
        }
        Some(
            self.sections
                .read()
                .iter()
                .flat_map(|s| s.objects.iter().cloned())
                .collect(),
        )
    }

    fn section_index_titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = Vec::new();
        for name in self.section_names() {
            if let Some(title) = self.index_title(&name) {
                if !titles.contains(&title) {
                    titles.push(title);
                }
            }
        }
        titles
    }

    fn section_for_index_title(&self, title: &str, at: usize) -> usize {
        let names = self.section_names();
        names
            .iter()
            .position(|name| self.index_title(name).as_deref() == Some(title))
            .unwrap_or_else(|| at.min(names.len().saturating_sub(1)))
    }

    fn concurrency_mode(&self) -> ConcurrencyMode {
        self.mode
    }

    fn observer(&self) -> Option<ObserverId> {
        self.observer.lock().as_ref().map(|slot| slot.id)
    }

    fn set_observer(&self, id: ObserverId, observer: Weak<dyn ResultSetObserver<T>>) {
        *self.observer.lock() = Some(ObserverSlot { id, observer });
        tracing::trace!(target: targets::STORE, id = id.as_u64(), "observer registered");
    }

    fn clear_observer(&self, id: ObserverId) {
        let mut slot = self.observer.lock();
        if slot.as_ref().is_some_and(|current| current.id == id) {
            *slot = None;
            tracing::trace!(target: targets::STORE, id = id.as_u64(), "observer cleared");
        }
    }

    fn delete_object(&self, entity: &T) -> StoreResult<()> {
        if position_in(&self.sections.read(), entity).is_none() {
            return Err(StoreError::ObjectNotFound);
        }
        self.staged.lock().push(Staged::Delete(entity.clone()));
        Ok(())
    }

    fn insert_object(&self, entity: T) -> StoreResult<()> {
        self.staged.lock().push(Staged::Insert(entity));
        Ok(())
    }

    /// Applies staged changes in the order they were staged.
    ///
    /// Inserted entities are appended to the last section, which is created
    /// if there is none. A staged deletion of an entity that is already gone
    /// is skipped. Concurrent saves are serialized with transactions.
    fn save(&self) -> StoreResult<()> {
        if let Some(error) = self.save_failure.lock().take() {
            tracing::debug!(target: targets::STORE, %error, "save failed");
            return Err(error);
        }

        // Held across the drain: a save returns only after everything staged
        // before it has been reported.
        let _delivery = self.delivery.lock();
        let staged = std::mem::take(&mut *self.staged.lock());
        if staged.is_empty() {
            return Ok(());
        }

        tracing::debug!(target: targets::STORE, changes = staged.len(), "saving staged changes");
        self.transaction(|tx| {
            for change in staged {
                match change {
                    Staged::Delete(entity) => {
                        if let Some(at) = tx.position_of(&entity) {
                            tx.delete(at);
                        }
                    }
                    Staged::Insert(entity) => {
                        if tx.section_count() == 0 {
                            tx.insert_section(0, "");
                        }
                        let section = tx.section_count() - 1;
                        let row = tx.section_len(section);
                        tx.insert(IndexPath::new(section, row), entity);
                    }
                }
            }
        });
        Ok(())
    }
}
