//! Tests for the segmented-control adapter.

mod common;

use std::sync::Arc;

use common::{RecordingSegments, TIMEOUT, collect_reports};
use fetched_datasource::store::MemoryResultSet;
use fetched_datasource::{
    AdapterConfig, ChangeKind, ConcurrencyMode, IndexPath, SegmentedAdapter, UiQueue,
};

type Results = MemoryResultSet<&'static str>;

fn tabs(mode: ConcurrencyMode) -> Arc<Results> {
    Arc::new(MemoryResultSet::single_section(mode, vec!["day", "week", "month"]))
}

fn segmented(
    ui: &UiQueue,
    control: &Arc<RecordingSegments>,
    results: &Arc<Results>,
) -> SegmentedAdapter<Results, RecordingSegments> {
    SegmentedAdapter::builder(control, results.clone(), ui.clone(), |_, _, tab: &&'static str| {
        tab.to_uppercase()
    })
    .build()
}

#[test]
fn test_fetch_populates_segments() {
    let ui = UiQueue::for_current_thread();
    let control = RecordingSegments::new();
    let results = tabs(ConcurrencyMode::MainQueue);
    let adapter = segmented(&ui, &control, &results);

    assert_eq!(adapter.number_of_segments(), 0);
    adapter.perform_fetch().unwrap();

    assert_eq!(control.titles(), vec!["DAY", "WEEK", "MONTH"]);
    assert_eq!(adapter.number_of_segments(), 3);
    assert_eq!(adapter.title_at(&control, 1).as_deref(), Some("WEEK"));
    assert_eq!(adapter.object_at(2), Some("month"));
    assert_eq!(adapter.index_for(&"week"), Some(1));
    assert_eq!(adapter.index_for(&"year"), None);
}

#[test]
fn test_store_off_ui_thread_populates_through_queue() {
    let ui = UiQueue::for_current_thread();
    let control = RecordingSegments::new();
    let results = tabs(ConcurrencyMode::PrivateQueue);
    let adapter = segmented(&ui, &control, &results);
    let reports = collect_reports(adapter.batch_applied());

    adapter.perform_fetch().unwrap();
    assert!(control.titles().is_empty());

    assert!(ui.run_until(TIMEOUT, || !reports.lock().is_empty()));
    assert_eq!(control.titles(), vec!["DAY", "WEEK", "MONTH"]);
    assert!(!reports.lock()[0].inline);
}

#[test]
fn test_segment_changes() {
    let ui = UiQueue::for_current_thread();
    let control = RecordingSegments::new();
    let results = tabs(ConcurrencyMode::MainQueue);
    let adapter = segmented(&ui, &control, &results);
    adapter.perform_fetch().unwrap();
    control.log.take();

    results.transaction(|tx| tx.insert(IndexPath::new(0, 3), "year"));
    assert_eq!(control.titles(), vec!["DAY", "WEEK", "MONTH", "YEAR"]);

    results.transaction(|tx| {
        tx.delete(IndexPath::new(0, 0));
    });
    assert_eq!(control.titles(), vec!["WEEK", "MONTH", "YEAR"]);

    results.transaction(|tx| tx.move_item(IndexPath::new(0, 2), IndexPath::new(0, 0)));
    assert_eq!(control.titles(), vec!["YEAR", "WEEK", "MONTH"]);

    results.transaction(|tx| tx.update(IndexPath::new(0, 1), "fortnight"));
    assert_eq!(control.titles(), vec!["YEAR", "FORTNIGHT", "MONTH"]);

    assert_eq!(
        control.log.take(),
        vec![
            "insert_segment YEAR 3",
            "remove_segment 0",
            "remove_segment 2",
            "insert_segment YEAR 0",
            "remove_segment 1",
            "insert_segment FORTNIGHT 1",
        ]
    );
}

#[test]
fn test_reload_policy_keeps_old_title() {
    let ui = UiQueue::for_current_thread();
    let control = RecordingSegments::new();
    let results = tabs(ConcurrencyMode::MainQueue);
    let adapter = SegmentedAdapter::builder(&control, results.clone(), ui.clone(), |_, _, tab: &&'static str| {
        tab.to_string()
    })
    .reload_policy(|_, _, tab: &&'static str| tab.len() > 3)
    .config(AdapterConfig::new().with_animated_segments(false))
    .build();
    adapter.perform_fetch().unwrap();

    results.transaction(|tx| tx.update(IndexPath::new(0, 0), "dia"));
    assert_eq!(control.titles(), vec!["day", "week", "month"]);

    results.transaction(|tx| tx.update(IndexPath::new(0, 0), "daily"));
    assert_eq!(control.titles(), vec!["daily", "week", "month"]);
}

#[test]
fn test_section_insert_and_delete_are_ignored() {
    let ui = UiQueue::for_current_thread();
    let control = RecordingSegments::new();
    let results = tabs(ConcurrencyMode::MainQueue);
    let adapter = segmented(&ui, &control, &results);
    let reports = collect_reports(adapter.batch_applied());
    adapter.perform_fetch().unwrap();
    control.log.take();
    reports.lock().clear();

    results.transaction(|tx| {
        tx.notify_section(0, ChangeKind::Insert);
        tx.notify_section(0, ChangeKind::Delete);
    });

    assert!(control.log.entries().is_empty());
    assert!(reports.lock().is_empty());
}

#[test]
#[should_panic(expected = "invalid section change type")]
fn test_section_update_is_fatal() {
    let ui = UiQueue::for_current_thread();
    let control = RecordingSegments::new();
    let results = tabs(ConcurrencyMode::MainQueue);
    let adapter = segmented(&ui, &control, &results);
    adapter.perform_fetch().unwrap();

    results.transaction(|tx| tx.notify_section(0, ChangeKind::Update));
}

#[test]
fn test_empty_results_insert_nothing() {
    let ui = UiQueue::for_current_thread();
    let control = RecordingSegments::new();
    let results: Arc<Results> = Arc::new(MemoryResultSet::new(ConcurrencyMode::MainQueue));
    let adapter = segmented(&ui, &control, &results);
    let reports = collect_reports(adapter.batch_applied());

    adapter.perform_fetch().unwrap();
    assert_eq!(adapter.number_of_segments(), 0);
    assert!(reports.lock().is_empty());
}
