//! Positions within a sectioned result set.
//!
//! An [`IndexPath`] addresses one entity by section and row. Positions are
//! only meaningful between a successful fetch and the next transaction
//! boundary; after the result set changes, previously obtained positions may
//! point at a different entity or at nothing.

use std::fmt;

/// The position of an entity within a sectioned result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct IndexPath {
    /// The section containing the entity.
    pub section: usize,
    /// The row of the entity within its section.
    pub row: usize,
}

impl IndexPath {
    /// Creates a new index path.
    #[inline]
    pub const fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }

    /// Returns the index path of the row at `row` in the same section.
    #[inline]
    pub const fn with_row(self, row: usize) -> Self {
        Self {
            section: self.section,
            row,
        }
    }
}

impl From<(usize, usize)> for IndexPath {
    fn from((section, row): (usize, usize)) -> Self {
        Self::new(section, row)
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.section, self.row)
    }
}

/// Where an index title jumps to.
///
/// Collection widgets accept either a whole section or a specific item as the
/// target of a jump-to-letter gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexTarget {
    /// The entire section at this index.
    Section(usize),
    /// A specific item.
    Item(IndexPath),
}

impl IndexTarget {
    /// The section this target lands in.
    pub fn section(&self) -> usize {
        match self {
            IndexTarget::Section(section) => *section,
            IndexTarget::Item(path) => path.section,
        }
    }
}
