//! Mutation model emitted by the store for persistence and events.

use crate::types::{Generation, HikeId};

/// One successful change to the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A hike was created and prepended.
    Created {
        /// New hike id.
        id: HikeId,
    },
    /// A hike's fields were replaced in place.
    Updated {
        /// Updated hike id.
        id: HikeId,
    },
    /// A hike was removed.
    Deleted {
        /// Removed hike id.
        id: HikeId,
    },
    /// The whole collection was emptied.
    Cleared,
}

/// A change stamped with the generation of the write it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    /// Persistence generation assigned to this change.
    pub generation: Generation,
    /// Change body.
    pub change: Change,
}

impl AppliedChange {
    /// True when the persisted blob should be removed rather than rewritten.
    pub fn removes_blob(&self) -> bool {
        matches!(self.change, Change::Cleared)
    }
}
