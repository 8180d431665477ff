//! Tests for the collection adapter.

mod common;

use std::sync::Arc;

use common::{Person, RecordingCollection, people, person};
use fetched_datasource::store::MemoryResultSet;
use fetched_datasource::{
    CollectionAdapter, ConcurrencyMode, EditStyle, IndexPath, IndexTarget, MoveHandler, ResultSet,
    UiQueue,
};

type Results = MemoryResultSet<Person>;

fn grouped() -> Arc<Results> {
    Arc::new(MemoryResultSet::with_sections(
        ConcurrencyMode::MainQueue,
        vec![
            ("Berlin", people(&["Ann", "Bob"])),
            ("Lisbon", people(&["Cid"])),
            ("London", people(&["Dee", "Eve", "Fay"])),
        ],
    ))
}

fn collection_adapter(
    ui: &UiQueue,
    grid: &Arc<RecordingCollection>,
    results: &Arc<Results>,
) -> CollectionAdapter<Results, RecordingCollection> {
    CollectionAdapter::builder(grid, results.clone(), ui.clone(), |_, _, p: &Person| {
        p.name.clone()
    })
    .supplementary(|_, kind: &str, at: IndexPath, p: &Person| format!("{kind} {at} {}", p.name))
    .build()
}

#[test]
fn test_item_translation() {
    let ui = UiQueue::for_current_thread();
    let grid = RecordingCollection::new();
    let results = grouped();
    let adapter = collection_adapter(&ui, &grid, &results);
    adapter.perform_fetch().unwrap();

    results.transaction(|tx| {
        tx.delete_section(1);
        tx.insert(IndexPath::new(0, 2), person("Gus", 30));
        tx.move_item(IndexPath::new(1, 2), IndexPath::new(0, 0));
        tx.update(IndexPath::new(1, 0), person("Dee", 50));
        tx.insert_section(2, "Madrid");
    });

    assert_eq!(
        grid.log.take(),
        vec![
            "batch{",
            "delete_sections [1]",
            "insert_items [0, 2]",
            "move_item [1, 2] -> [0, 0]",
            "reload_items [1, 0]",
            "insert_sections [2]",
            "}",
        ]
    );
    assert_eq!(adapter.number_of_sections(), 3);
    assert_eq!(adapter.number_of_items(0), 4);
    assert_eq!(adapter.number_of_items(2), 0);
}

#[test]
fn test_cells_and_supplementary_views() {
    let ui = UiQueue::for_current_thread();
    let grid = RecordingCollection::new();
    let results = grouped();
    let adapter = collection_adapter(&ui, &grid, &results);
    adapter.perform_fetch().unwrap();

    assert_eq!(adapter.cell_at(&grid, IndexPath::new(2, 1)), "Eve");
    assert!(adapter.has_supplementary_views());
    assert_eq!(
        adapter.supplementary_view(&grid, "header", IndexPath::new(1, 0)),
        "header [1, 0] Cid"
    );
}

#[test]
#[should_panic(expected = "without a supplementary provider")]
fn test_supplementary_view_without_provider_panics() {
    let ui = UiQueue::for_current_thread();
    let grid = RecordingCollection::new();
    let results = grouped();
    let adapter = CollectionAdapter::builder(&grid, results.clone(), ui.clone(), |_, _, p: &Person| {
        p.name.clone()
    })
    .build();
    adapter.perform_fetch().unwrap();

    assert!(!adapter.has_supplementary_views());
    adapter.supplementary_view(&grid, "footer", IndexPath::new(0, 0));
}

#[test]
fn test_index_navigation_targets_sections() {
    let ui = UiQueue::for_current_thread();
    let grid = RecordingCollection::new();
    let results = grouped();
    let adapter = collection_adapter(&ui, &grid, &results);
    adapter.perform_fetch().unwrap();

    assert_eq!(adapter.index_titles(), vec!["B", "L"]);
    assert_eq!(adapter.index_target_for_title("L", 1), IndexTarget::Section(1));
    assert_eq!(adapter.index_target_for_title("B", 0).section(), 0);
}

#[test]
fn test_reload_policy_and_delete_commit() {
    let ui = UiQueue::for_current_thread();
    let grid = RecordingCollection::new();
    let results = grouped();
    let adapter = CollectionAdapter::builder(&grid, results.clone(), ui.clone(), |_, _, p: &Person| {
        p.name.clone()
    })
    .reload_policy(|_, at: IndexPath, _: &Person| at.section != 2)
    .build();
    adapter.perform_fetch().unwrap();

    results.transaction(|tx| {
        tx.update(IndexPath::new(2, 0), person("Dee", 99));
        tx.update(IndexPath::new(0, 1), person("Bob", 99));
    });
    assert_eq!(grid.log.take(), vec!["batch{", "reload_items [0, 1]", "}"]);

    adapter
        .commit_edit(EditStyle::Delete, IndexPath::new(1, 0), None)
        .unwrap();
    results.save().unwrap();
    assert_eq!(grid.log.take(), vec!["batch{", "delete_items [1, 0]", "}"]);
    assert_eq!(adapter.number_of_items(1), 0);
}

#[test]
fn test_move_handler_drives_reordering() {
    let ui = UiQueue::for_current_thread();
    let grid = RecordingCollection::new();
    let results = grouped();
    let store = results.clone();

    let adapter = CollectionAdapter::builder(&grid, results.clone(), ui.clone(), |_, _, p: &Person| {
        p.name.clone()
    })
    .mover(
        MoveHandler::<RecordingCollection>::new()
            .with_can_move(|_, _| true)
            .with_move(move |_, from: IndexPath, to: IndexPath| {
                store.transaction(|tx| tx.move_item(from, to));
            }),
    )
    .build();
    adapter.perform_fetch().unwrap();

    assert!(adapter.can_move_item(&grid, IndexPath::new(0, 0)));
    adapter.move_item(&grid, IndexPath::new(0, 0), IndexPath::new(0, 1));
    let names: Vec<String> = adapter
        .fetched_objects()
        .unwrap_or_default()
        .into_iter()
        .take(2)
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Bob", "Ann"]);
    assert_eq!(grid.log.take(), vec!["batch{", "move_item [0, 0] -> [0, 1]", "}"]);
}
