//! Domain records persisted in the key-value store.
//!
//! # Invariants
//! - Every record is serialized with the field names used by stored data.
//! - Record ids are stable and never reused.

pub mod account;
pub mod budget;
pub mod category;
pub mod game;
pub mod goals;
pub mod money;
pub mod period;
pub mod settings;
pub mod template;
pub mod toy_car;
pub mod transaction;
