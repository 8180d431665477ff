//! Recording widgets and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::Mutex;

use fetched_datasource::{
    BatchCompletion, BatchReport, BatchUpdates, CollectionWidget, IndexPath, PickerWidget,
    RowAnimation, SegmentedWidget, Signal, TableWidget,
};

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub name: String,
    pub age: u32,
}

pub fn person(name: &str, age: u32) -> Person {
    Person {
        name: name.to_string(),
        age,
    }
}

pub fn people(names: &[&str]) -> Vec<Person> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| person(name, 20 + i as u32))
        .collect()
}

/// Ordered record of widget calls, noting calls made off the owning thread.
pub struct CallLog {
    entries: Mutex<Vec<String>>,
    owner: ThreadId,
    off_thread: AtomicUsize,
}

impl CallLog {
    fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            owner: thread::current().id(),
            off_thread: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, entry: impl Into<String>) {
        if thread::current().id() != self.owner {
            self.off_thread.fetch_add(1, Ordering::SeqCst);
        }
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn off_thread_calls(&self) -> usize {
        self.off_thread.load(Ordering::SeqCst)
    }
}

fn paths(positions: &[IndexPath]) -> String {
    positions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wraps the widget calls of one `perform_batch_updates` in `batch{` / `}`,
/// or of a bracket in `begin` / `end`.
pub struct RecordingTable {
    pub log: CallLog,
    batched: bool,
    interrupt: bool,
}

impl RecordingTable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            log: CallLog::new(),
            batched: true,
            interrupt: false,
        })
    }

    pub fn bracketed() -> Arc<Self> {
        Arc::new(Self {
            log: CallLog::new(),
            batched: false,
            interrupt: false,
        })
    }

    /// Reports every batch animation as interrupted.
    pub fn interrupting() -> Arc<Self> {
        Arc::new(Self {
            log: CallLog::new(),
            batched: true,
            interrupt: true,
        })
    }
}

impl BatchUpdates for RecordingTable {
    fn supports_batch_updates(&self) -> bool {
        self.batched
    }

    fn perform_batch_updates(&self, updates: &mut dyn FnMut(), completion: Option<BatchCompletion>) {
        self.log.push("batch{");
        updates();
        self.log.push("}");
        if let Some(completion) = completion {
            completion(!self.interrupt);
        }
    }

    fn begin_updates(&self) {
        self.log.push("begin");
    }

    fn end_updates(&self) {
        self.log.push("end");
    }
}

impl TableWidget for RecordingTable {
    type Cell = String;

    fn insert_sections(&self, sections: &[usize], _animation: RowAnimation) {
        self.log.push(format!("insert_sections {sections:?}"));
    }

    fn delete_sections(&self, sections: &[usize], _animation: RowAnimation) {
        self.log.push(format!("delete_sections {sections:?}"));
    }

    fn insert_rows(&self, rows: &[IndexPath], _animation: RowAnimation) {
        self.log.push(format!("insert_rows {}", paths(rows)));
    }

    fn delete_rows(&self, rows: &[IndexPath], _animation: RowAnimation) {
        self.log.push(format!("delete_rows {}", paths(rows)));
    }

    fn reload_rows(&self, rows: &[IndexPath], _animation: RowAnimation) {
        self.log.push(format!("reload_rows {}", paths(rows)));
    }

    fn move_row(&self, from: IndexPath, to: IndexPath) {
        self.log.push(format!("move_row {from} -> {to}"));
    }
}

pub struct RecordingCollection {
    pub log: CallLog,
}

impl RecordingCollection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { log: CallLog::new() })
    }
}

impl BatchUpdates for RecordingCollection {
    fn supports_batch_updates(&self) -> bool {
        true
    }

    fn perform_batch_updates(&self, updates: &mut dyn FnMut(), completion: Option<BatchCompletion>) {
        self.log.push("batch{");
        updates();
        self.log.push("}");
        if let Some(completion) = completion {
            completion(true);
        }
    }
}

impl CollectionWidget for RecordingCollection {
    type Cell = String;
    type SupplementaryView = String;

    fn insert_sections(&self, sections: &[usize]) {
        self.log.push(format!("insert_sections {sections:?}"));
    }

    fn delete_sections(&self, sections: &[usize]) {
        self.log.push(format!("delete_sections {sections:?}"));
    }

    fn insert_items(&self, items: &[IndexPath]) {
        self.log.push(format!("insert_items {}", paths(items)));
    }

    fn delete_items(&self, items: &[IndexPath]) {
        self.log.push(format!("delete_items {}", paths(items)));
    }

    fn reload_items(&self, items: &[IndexPath]) {
        self.log.push(format!("reload_items {}", paths(items)));
    }

    fn move_item(&self, from: IndexPath, to: IndexPath) {
        self.log.push(format!("move_item {from} -> {to}"));
    }
}

/// Pickers have no batch API; every batch is bracketed.
pub struct RecordingPicker {
    pub log: CallLog,
}

impl RecordingPicker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { log: CallLog::new() })
    }
}

impl BatchUpdates for RecordingPicker {
    fn begin_updates(&self) {
        self.log.push("begin");
    }

    fn end_updates(&self) {
        self.log.push("end");
    }
}

impl PickerWidget for RecordingPicker {
    type View = String;

    fn reload_component(&self, component: usize) {
        self.log.push(format!("reload_component {component}"));
    }

    fn reload_all_components(&self) {
        self.log.push("reload_all_components");
    }
}

/// A segmented control that keeps its segments, so tests can check the
/// resulting titles as well as the calls.
pub struct RecordingSegments {
    pub log: CallLog,
    titles: Mutex<Vec<Option<String>>>,
}

impl RecordingSegments {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            log: CallLog::new(),
            titles: Mutex::new(Vec::new()),
        })
    }

    pub fn titles(&self) -> Vec<String> {
        self.titles
            .lock()
            .iter()
            .map(|title| title.clone().unwrap_or_default())
            .collect()
    }
}

impl BatchUpdates for RecordingSegments {}

impl SegmentedWidget for RecordingSegments {
    fn insert_segment(&self, title: Option<String>, index: usize, _animated: bool) {
        self.log
            .push(format!("insert_segment {} {index}", title.as_deref().unwrap_or("-")));
        self.titles.lock().insert(index, title);
    }

    fn remove_segment(&self, index: usize, _animated: bool) {
        self.log.push(format!("remove_segment {index}"));
        self.titles.lock().remove(index);
    }

    fn title_for_segment(&self, index: usize) -> Option<String> {
        self.titles.lock().get(index).cloned().flatten()
    }

    fn number_of_segments(&self) -> usize {
        self.titles.lock().len()
    }
}

/// Collects every report emitted on `signal`.
pub fn collect_reports(signal: &Signal<BatchReport>) -> Arc<Mutex<Vec<BatchReport>>> {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = reports.clone();
    signal.connect(move |report: &BatchReport| sink.lock().push(*report));
    reports
}
