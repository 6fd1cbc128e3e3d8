//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store reads/writes into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.
//!
//! Every service is generic over [`crate::store::KeyValueStore`] and can be
//! built over a borrowed store, so services compose without owning the
//! connection.

mod backup_records;
pub mod backup_service;
pub mod dashboard_service;
pub mod finance_service;
pub mod game_service;
pub mod settings_service;
pub mod toy_service;
