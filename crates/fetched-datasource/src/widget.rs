//! Contracts of the list widgets driven by data sources.
//!
//! The host toolkit implements these traits for its widgets. Every method is
//! called on the UI-owning thread only; the `Send + Sync` bounds exist so that
//! weak handles to a widget can travel with a batch posted to the UI queue.

use crate::config::RowAnimation;
use crate::position::IndexPath;

/// Invoked by the widget once a batch's animations ended.
///
/// The argument is `false` when the animations were interrupted.
pub type BatchCompletion = Box<dyn FnOnce(bool) + Send>;

/// Atomic batch-update support shared by all list widgets.
pub trait BatchUpdates: Send + Sync + 'static {
    /// Returns `true` if [`perform_batch_updates`](Self::perform_batch_updates)
    /// is available. Widgets without it get a
    /// [`begin_updates`](Self::begin_updates)/[`end_updates`](Self::end_updates)
    /// bracket instead.
    fn supports_batch_updates(&self) -> bool {
        false
    }

    /// Runs `updates` as one atomic animated batch.
    ///
    /// `updates` must be called exactly once. The default runs it inside the
    /// begin/end bracket and reports completion immediately.
    fn perform_batch_updates(&self, updates: &mut dyn FnMut(), completion: Option<BatchCompletion>) {
        self.begin_updates();
        updates();
        self.end_updates();
        if let Some(completion) = completion {
            completion(true);
        }
    }

    /// Opens a group of mutations that animate together.
    fn begin_updates(&self) {}

    /// Closes the group opened by [`begin_updates`](Self::begin_updates).
    fn end_updates(&self) {}
}

/// A sectioned list of rows.
pub trait TableWidget: BatchUpdates {
    /// Cell type produced for rows.
    type Cell;

    /// Inserts sections.
    fn insert_sections(&self, sections: &[usize], animation: RowAnimation);
    /// Deletes sections.
    fn delete_sections(&self, sections: &[usize], animation: RowAnimation);
    /// Inserts rows.
    fn insert_rows(&self, rows: &[IndexPath], animation: RowAnimation);
    /// Deletes rows.
    fn delete_rows(&self, rows: &[IndexPath], animation: RowAnimation);
    /// Re-renders rows in place.
    fn reload_rows(&self, rows: &[IndexPath], animation: RowAnimation);
    /// Moves a row.
    fn move_row(&self, from: IndexPath, to: IndexPath);
}

/// A sectioned grid of items with supplementary views.
pub trait CollectionWidget: BatchUpdates {
    /// Cell type produced for items.
    type Cell;
    /// View type produced for headers, footers and other supplementary
    /// elements.
    type SupplementaryView;

    /// Inserts sections.
    fn insert_sections(&self, sections: &[usize]);
    /// Deletes sections.
    fn delete_sections(&self, sections: &[usize]);
    /// Inserts items.
    fn insert_items(&self, items: &[IndexPath]);
    /// Deletes items.
    fn delete_items(&self, items: &[IndexPath]);
    /// Re-renders items in place.
    fn reload_items(&self, items: &[IndexPath]);
    /// Moves an item.
    fn move_item(&self, from: IndexPath, to: IndexPath);
}

/// A spinning-wheel selector with one column (component) per section.
///
/// Pickers have no fine-grained mutation primitives; they can only reload.
pub trait PickerWidget: BatchUpdates {
    /// View type produced for rows.
    type View;

    /// Re-queries the rows of one component.
    fn reload_component(&self, component: usize);
    /// Re-queries every component.
    fn reload_all_components(&self);
}

/// A horizontal row of titled segments backed by a single section.
pub trait SegmentedWidget: BatchUpdates {
    /// Inserts a segment with `title` at `index`.
    fn insert_segment(&self, title: Option<String>, index: usize, animated: bool);
    /// Removes the segment at `index`.
    fn remove_segment(&self, index: usize, animated: bool);
    /// The title of the segment at `index`.
    fn title_for_segment(&self, index: usize) -> Option<String>;
    /// The number of segments currently shown.
    fn number_of_segments(&self) -> usize;
}
