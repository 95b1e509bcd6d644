//! Authoritative in-memory hike records with whole-collection blob
//! persistence.
//!
//! # Examples
//!
//! In-memory usage with [`core::store::HikeStore`]:
//! ```
//! use hikelog::{
//!     core::store::HikeStore,
//!     hike::HikeDraft,
//!     validate::normalize,
//! };
//!
//! let draft = HikeDraft {
//!     name: "Mission Peak".to_string(),
//!     location: "Fremont".to_string(),
//!     date: "2024-05-01 08:30".to_string(),
//!     length_km: "9.6".to_string(),
//!     ..HikeDraft::default()
//! };
//!
//! let mut store = HikeStore::new();
//! let fields = normalize(&draft, None).expect("valid draft");
//! let (id, _change) = store.insert(fields);
//! assert_eq!(store.get(&id).map(|h| h.length_km), Some(9.6));
//! ```
//!
//! Runtime usage with a SQLite blob store:
//! ```no_run
//! use hikelog::{
//!     form::HikeForm,
//!     persist::sqlite::SqliteBlobStore,
//!     runtime::handle::{open_hikelog, RuntimeConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let blobs = SqliteBlobStore::open("hikes.db").expect("open sqlite");
//! let handle = open_hikelog(Box::new(blobs), RuntimeConfig::default())
//!     .await
//!     .expect("open");
//!
//! let mut form = HikeForm::new();
//! form.draft.name = "Rancho San Antonio".to_string();
//! form.draft.location = "Cupertino".to_string();
//! form.draft.date = "2024-06-02 07:00".to_string();
//! form.draft.length_km = "12".to_string();
//! let _id = form.save(&handle).await.expect("save");
//!
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Core in-memory store.
pub mod core;
/// Form draft state and save workflow.
pub mod form;
/// Hike domain records, drafts, and normalized fields.
pub mod hike;
/// Location provider contract.
pub mod location;
/// Change model emitted by store mutations.
pub mod op;
/// Blob store abstraction, in-memory and SQLite implementations.
pub mod persist;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Shared primitive types.
pub mod types;
/// Draft validation.
pub mod validate;
