//! Core domain logic for the personal organizer.
//! This crate is the single source of truth for business invariants.

pub mod csv_text;
pub mod db;
pub mod finance;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod service;
pub mod store;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use metadata::{GameMetadataProvider, MetadataError, RawgClient};
pub use model::game::{Game, GameMetadata, GameStatus};
pub use model::toy_car::ToyCar;
pub use model::transaction::{Transaction, TransactionKind};
pub use service::backup_service::BackupService;
pub use service::dashboard_service::DashboardService;
pub use service::finance_service::{FinanceError, FinanceService, NewTransaction};
pub use service::game_service::GameService;
pub use service::settings_service::SettingsService;
pub use service::toy_service::ToyService;
pub use store::{JsonStore, KeyValueStore, SqliteKvStore, StoreError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
