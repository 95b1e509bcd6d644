//! In-memory authoritative store.

/// Authoritative hike store and id minting.
pub mod store;
