//! Finance transaction filtering and aggregation engine.
//!
//! # Responsibility
//! - Pure functions over in-memory transaction slices: filtering, sorting,
//!   month summaries, installment/recurring expansion, insights and alerts.
//! - CSV/JSON import-export of transactions.
//!
//! # Invariants
//! - Nothing in this module touches the store or the system clock; callers
//!   pass `today` explicitly.

pub mod alerts;
pub mod csv_io;
pub mod filter;
pub mod installments;
pub mod insights;
pub mod summary;
