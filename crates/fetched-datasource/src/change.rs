//! The change-event model.
//!
//! A result set reports each elementary mutation of a transaction as a raw
//! `(kind, old position, new position)` notification. [`ChangeEvent`] is the
//! validated form of one such notification: a tagged variant that only
//! carries the positions meaningful for its kind.
//!
//! Events are kept in the order the store delivered them. Nothing here sorts
//! or coalesces them.

use std::fmt;

use crate::position::IndexPath;

/// The kind of change reported by a result set.
///
/// `Unknown` carries the raw tag of a change kind this version does not
/// recognize. Such notifications are logged and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// An entity or section was inserted.
    Insert,
    /// An entity or section was deleted.
    Delete,
    /// An entity moved to a different position.
    Move,
    /// An entity's properties changed in place.
    Update,
    /// A change kind introduced after this version.
    Unknown(u8),
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Insert => f.write_str("insert"),
            ChangeKind::Delete => f.write_str("delete"),
            ChangeKind::Move => f.write_str("move"),
            ChangeKind::Update => f.write_str("update"),
            ChangeKind::Unknown(tag) => write!(f, "unknown({tag})"),
        }
    }
}

/// One atomic mutation within a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent<T> {
    /// A section was inserted at `section`.
    SectionInserted {
        /// Index of the new section.
        section: usize,
    },
    /// The section at `section` was deleted.
    SectionDeleted {
        /// Index the section had before deletion.
        section: usize,
    },
    /// An entity appeared at `new_position`.
    ItemInserted {
        /// Position of the inserted entity.
        new_position: IndexPath,
    },
    /// The entity at `old_position` was removed.
    ItemDeleted {
        /// Position the entity had before deletion.
        old_position: IndexPath,
    },
    /// An entity moved from `old_position` to `new_position`.
    ItemMoved {
        /// Position before the move.
        old_position: IndexPath,
        /// Position after the move.
        new_position: IndexPath,
    },
    /// The entity at `position` changed in place.
    ItemUpdated {
        /// Position of the changed entity.
        position: IndexPath,
        /// The entity after the change.
        entity: T,
    },
}

impl<T> ChangeEvent<T> {
    /// Validates a raw section notification.
    ///
    /// Returns `None` for unknown kinds.
    ///
    /// # Panics
    ///
    /// Sections can only be inserted or deleted. A section move or update has
    /// no corresponding widget instruction and panics.
    pub fn from_section(kind: ChangeKind, section: usize) -> Option<Self> {
        match kind {
            ChangeKind::Insert => Some(ChangeEvent::SectionInserted { section }),
            ChangeKind::Delete => Some(ChangeEvent::SectionDeleted { section }),
            ChangeKind::Move | ChangeKind::Update => {
                panic!("invalid section change type: {kind} at section {section}")
            }
            ChangeKind::Unknown(_) => None,
        }
    }

    /// Validates a raw item notification.
    ///
    /// Returns `None` for unknown kinds. An update reports `old` when the
    /// store provides it, falling back to `new`.
    ///
    /// # Panics
    ///
    /// Panics if a position required by `kind` is missing.
    pub fn from_item(
        kind: ChangeKind,
        old: Option<IndexPath>,
        new: Option<IndexPath>,
        entity: T,
    ) -> Option<Self> {
        let event = match kind {
            ChangeKind::Insert => ChangeEvent::ItemInserted {
                new_position: required(new, kind, "new"),
            },
            ChangeKind::Delete => ChangeEvent::ItemDeleted {
                old_position: required(old, kind, "old"),
            },
            ChangeKind::Move => ChangeEvent::ItemMoved {
                old_position: required(old, kind, "old"),
                new_position: required(new, kind, "new"),
            },
            ChangeKind::Update => ChangeEvent::ItemUpdated {
                position: required(old.or(new), kind, "old"),
                entity,
            },
            ChangeKind::Unknown(_) => return None,
        };
        Some(event)
    }

    /// The kind of this event.
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::SectionInserted { .. } | ChangeEvent::ItemInserted { .. } => {
                ChangeKind::Insert
            }
            ChangeEvent::SectionDeleted { .. } | ChangeEvent::ItemDeleted { .. } => {
                ChangeKind::Delete
            }
            ChangeEvent::ItemMoved { .. } => ChangeKind::Move,
            ChangeEvent::ItemUpdated { .. } => ChangeKind::Update,
        }
    }

    /// Returns `true` for section-level events.
    pub fn is_section_change(&self) -> bool {
        matches!(
            self,
            ChangeEvent::SectionInserted { .. } | ChangeEvent::SectionDeleted { .. }
        )
    }
}

fn required(position: Option<IndexPath>, kind: ChangeKind, which: &str) -> IndexPath {
    match position {
        Some(position) => position,
        None => panic!("{kind} change reported without its {which} position"),
    }
}
