//! Key-value persistence for organizer data.
//!
//! # Responsibility
//! - Store each collection as one JSON blob under a well-known key.
//! - Keep SQL details inside the store boundary.
//!
//! # Invariants
//! - Lenient reads default to empty values when a blob is missing or corrupt.
//! - Writes always replace the whole blob for a key.

pub mod keys;
pub mod kv_store;
pub mod stamps;

pub use kv_store::{JsonStore, KeyValueStore, SqliteKvStore, StoreError, StoreResult};
