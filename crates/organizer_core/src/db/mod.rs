//! SQLite file that holds the organizer's JSON blobs.
//!
//! The database has a single `kv_entries` table; every module stores its
//! collection as one JSON value under a fixed key (see [`crate::store::keys`]).
//!
//! # Invariants
//! - `PRAGMA user_version` records the last applied migration.
//! - A file written by a newer build is refused, never downgraded.
//! - No store key is read or written before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// Folder for the database file could not be created.
    DataDir { path: PathBuf, source: io::Error },
    Sqlite(rusqlite::Error),
    /// The file was migrated by a newer build of the organizer.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataDir { path, source } => {
                write!(f, "cannot create data folder `{}`: {source}", path.display())
            }
            Self::Sqlite(err) => write!(f, "store database error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store schema version {db_version} is newer than supported {latest_supported}; update the app"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DataDir { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
