//! Runtime event stream payloads and persistence status.

use crate::types::{Generation, HikeId};

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HikeEvent {
    /// A new hike was created.
    Created {
        /// Created hike id.
        id: HikeId,
    },
    /// An existing hike was updated.
    Updated {
        /// Updated hike id.
        id: HikeId,
    },
    /// A hike was deleted.
    Deleted {
        /// Deleted hike id.
        id: HikeId,
    },
    /// The whole collection was reset.
    Reset,
    /// The collection as of this generation is durable.
    Persisted {
        /// Generation written.
        generation: Generation,
    },
    /// Writing this generation failed; memory stays authoritative.
    PersistFailed {
        /// Generation that failed.
        generation: Generation,
        /// Rendered failure.
        error: String,
    },
}

/// Observable persistence progress.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersistStatus {
    /// Latest generation handed to the persistence worker.
    pub issued: Generation,
    /// Latest generation the worker finished, successfully or not.
    pub attempted: Generation,
    /// Latest generation known durable.
    pub durable: Generation,
    /// Failure of the latest attempt, cleared by the next success.
    pub last_error: Option<String>,
}

impl PersistStatus {
    /// True when every issued generation has been attempted.
    pub fn is_settled(&self) -> bool {
        self.attempted >= self.issued
    }

    /// True when durable state matches memory.
    pub fn is_in_sync(&self) -> bool {
        self.durable >= self.issued
    }
}
