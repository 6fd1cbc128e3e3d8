//! Flutter bridge surface for the organizer core.

pub mod api;
