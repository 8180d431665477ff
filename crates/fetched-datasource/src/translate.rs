//! Per-widget translation of change events into deferred widget mutations.
//!
//! | event            | table / collection      | picker                              | segmented                 |
//! |------------------|-------------------------|-------------------------------------|---------------------------|
//! | section inserted | insert section          | reload all components               | ignored                   |
//! | section deleted  | delete section          | reload all components               | ignored                   |
//! | item inserted    | insert row              | reload component                    | insert titled segment     |
//! | item deleted     | delete row              | reload component                    | remove segment            |
//! | item moved       | move row                | reload old and new component        | remove, reinsert          |
//! | item updated     | reload row              | reload component                    | remove, reinsert retitled |
//!
//! Reload-policy consultation happens before translation; translators only
//! see updates that were accepted.

use crate::batch::Update;
use crate::capability::SegmentTitleProvider;
use crate::change::ChangeEvent;
use crate::config::RowAnimation;
use crate::widget::{CollectionWidget, PickerWidget, SegmentedWidget, TableWidget};

/// Maps change events onto deferred mutations of one widget kind.
pub trait UpdateTranslator<W, T>: Send + Sync + 'static {
    /// Translates `event` into an update, or `None` if the widget needs no
    /// mutation for it.
    ///
    /// `widget` is the live widget at recording time and `subject` is the
    /// entity reported with an item event.
    fn translate(&self, widget: &W, event: ChangeEvent<T>, subject: Option<&T>) -> Option<Update<W>>;
}

/// Row and section instructions for table widgets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableTranslator {
    animation: RowAnimation,
}

impl TableTranslator {
    /// Creates a translator that animates with `animation`.
    pub fn new(animation: RowAnimation) -> Self {
        Self { animation }
    }
}

impl<W: TableWidget, T: 'static> UpdateTranslator<W, T> for TableTranslator {
    fn translate(&self, _widget: &W, event: ChangeEvent<T>, _subject: Option<&T>) -> Option<Update<W>> {
        let animation = self.animation;
        let update: Update<W> = match event {
            ChangeEvent::SectionInserted { section } => {
                Box::new(move |w: &W| w.insert_sections(&[section], animation))
            }
            ChangeEvent::SectionDeleted { section } => {
                Box::new(move |w: &W| w.delete_sections(&[section], animation))
            }
            ChangeEvent::ItemInserted { new_position } => {
                Box::new(move |w: &W| w.insert_rows(&[new_position], animation))
            }
            ChangeEvent::ItemDeleted { old_position } => {
                Box::new(move |w: &W| w.delete_rows(&[old_position], animation))
            }
            ChangeEvent::ItemMoved {
                old_position,
                new_position,
            } => Box::new(move |w: &W| w.move_row(old_position, new_position)),
            ChangeEvent::ItemUpdated { position, .. } => {
                Box::new(move |w: &W| w.reload_rows(&[position], animation))
            }
        };
        Some(update)
    }
}

/// Item and section instructions for collection widgets.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionTranslator;

impl<W: CollectionWidget, T: 'static> UpdateTranslator<W, T> for CollectionTranslator {
    fn translate(&self, _widget: &W, event: ChangeEvent<T>, _subject: Option<&T>) -> Option<Update<W>> {
        let update: Update<W> = match event {
            ChangeEvent::SectionInserted { section } => {
                Box::new(move |w: &W| w.insert_sections(&[section]))
            }
            ChangeEvent::SectionDeleted { section } => {
                Box::new(move |w: &W| w.delete_sections(&[section]))
            }
            ChangeEvent::ItemInserted { new_position } => {
                Box::new(move |w: &W| w.insert_items(&[new_position]))
            }
            ChangeEvent::ItemDeleted { old_position } => {
                Box::new(move |w: &W| w.delete_items(&[old_position]))
            }
            ChangeEvent::ItemMoved {
                old_position,
                new_position,
            } => Box::new(move |w: &W| w.move_item(old_position, new_position)),
            ChangeEvent::ItemUpdated { position, .. } => {
                Box::new(move |w: &W| w.reload_items(&[position]))
            }
        };
        Some(update)
    }
}

/// Component reloads for picker widgets.
///
/// Components correspond to sections.
#[derive(Debug, Clone, Copy, Default)]
pub struct PickerTranslator;

impl<W: PickerWidget, T: 'static> UpdateTranslator<W, T> for PickerTranslator {
    fn translate(&self, _widget: &W, event: ChangeEvent<T>, _subject: Option<&T>) -> Option<Update<W>> {
        let update: Update<W> = match event {
            ChangeEvent::SectionInserted { .. } | ChangeEvent::SectionDeleted { .. } => {
                Box::new(|w: &W| w.reload_all_components())
            }
            ChangeEvent::ItemInserted { new_position } => {
                Box::new(move |w: &W| w.reload_component(new_position.section))
            }
            ChangeEvent::ItemDeleted { old_position } => {
                Box::new(move |w: &W| w.reload_component(old_position.section))
            }
            ChangeEvent::ItemMoved {
                old_position,
                new_position,
            } => Box::new(move |w: &W| {
                w.reload_component(old_position.section);
                if new_position.section != old_position.section {
                    w.reload_component(new_position.section);
                }
            }),
            ChangeEvent::ItemUpdated { position, .. } => {
                Box::new(move |w: &W| w.reload_component(position.section))
            }
        };
        Some(update)
    }
}

/// Segment insertions and removals for segmented widgets.
///
/// Segments are the rows of the first section. Section events carry no
/// meaning for a single-row widget and translate to nothing.
pub struct SegmentedTranslator<W, T> {
    titles: SegmentTitleProvider<W, T>,
    animated: bool,
}

impl<W, T> SegmentedTranslator<W, T> {
    /// Creates a translator rendering titles with `titles`.
    pub fn new(titles: SegmentTitleProvider<W, T>, animated: bool) -> Self {
        Self { titles, animated }
    }

    /// Renders the title of `entity` shown at `index`.
    pub fn title(&self, widget: &W, index: usize, entity: &T) -> String {
        (self.titles)(widget, index, entity)
    }

    /// Whether segment mutations animate.
    pub fn animated(&self) -> bool {
        self.animated
    }
}

impl<W, T> UpdateTranslator<W, T> for SegmentedTranslator<W, T>
where
    W: SegmentedWidget,
    T: 'static,
{
    fn translate(&self, widget: &W, event: ChangeEvent<T>, subject: Option<&T>) -> Option<Update<W>> {
        let animated = self.animated;
        let update: Update<W> = match event {
            ChangeEvent::SectionInserted { .. } | ChangeEvent::SectionDeleted { .. } => {
                return None;
            }
            ChangeEvent::ItemInserted { new_position } => {
                let index = new_position.row;
                let title = subject.map(|entity| self.title(widget, index, entity));
                Box::new(move |w: &W| w.insert_segment(title, index, animated))
            }
            ChangeEvent::ItemDeleted { old_position } => {
                let index = old_position.row;
                Box::new(move |w: &W| w.remove_segment(index, animated))
            }
            ChangeEvent::ItemMoved {
                old_position,
                new_position,
            } => {
                let (from, to) = (old_position.row, new_position.row);
                Box::new(move |w: &W| {
                    let title = w.title_for_segment(from);
                    w.remove_segment(from, animated);
                    w.insert_segment(title, to, animated);
                })
            }
            ChangeEvent::ItemUpdated { position, entity } => {
                let index = position.row;
                let title = self.title(widget, index, &entity);
                Box::new(move |w: &W| {
                    w.remove_segment(index, animated);
                    w.insert_segment(Some(title), index, animated);
                })
            }
        };
        Some(update)
    }
}
