//! Key-value store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide raw string get/set/remove over `kv_entries`.
//! - Layer typed JSON load/save helpers on top of any store.
//!
//! # Invariants
//! - `set_raw` is an upsert; a key holds at most one value.
//! - `load_json` never fails on bad payloads, `load_json_strict` does.

use crate::db::DbError;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer error for transport and payload failures.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Persisted blob under `key` is not valid JSON for the requested type.
    Corrupt {
        key: String,
        message: String,
    },
    Serialize {
        key: String,
        message: String,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Corrupt { key, message } => {
                write!(f, "stored value under `{key}` is invalid: {message}")
            }
            Self::Serialize { key, message } => {
                write!(f, "failed to serialize value for `{key}`: {message}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Corrupt { .. } | Self::Serialize { .. } => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Raw string key-value storage.
pub trait KeyValueStore {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>>;
    fn set_raw(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Returns whether a value was present.
    fn remove(&self, key: &str) -> StoreResult<bool>;
    /// Returns all keys in ascending order.
    fn keys(&self) -> StoreResult<Vec<String>>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_raw(key)
    }

    fn set_raw(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set_raw(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        (**self).remove(key)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        (**self).keys()
    }
}

/// Typed JSON helpers available on every [`KeyValueStore`].
pub trait JsonStore: KeyValueStore {
    /// Loads `key` as `T`, falling back to `default` when missing or corrupt.
    ///
    /// Transport errors still propagate.
    fn load_json<T: DeserializeOwned>(&self, key: &str, default: T) -> StoreResult<T> {
        match self.load_json_strict(key) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Ok(default),
            Err(StoreError::Corrupt { key, message }) => {
                warn!(
                    "event=store_load module=store status=fallback key={} reason=corrupt_payload detail={}",
                    key,
                    message.replace(['\n', '\r'], " ")
                );
                Ok(default)
            }
            Err(err) => Err(err),
        }
    }

    /// Loads `key` as `T`, surfacing corrupt payloads as errors.
    fn load_json_strict<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StoreError::Corrupt {
                key: key.to_string(),
                message: err.to_string(),
            })
    }

    fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_string(value).map_err(|err| StoreError::Serialize {
            key: key.to_string(),
            message: err.to_string(),
        })?;
        self.set_raw(key, &raw)
    }
}

impl<S: KeyValueStore + ?Sized> JsonStore for S {}

/// SQLite-backed key-value store.
#[derive(Clone, Copy)]
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl KeyValueStore for SqliteKvStore<'_> {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_raw(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", params![key])?;
        Ok(changed > 0)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_entries ORDER BY key ASC;")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for key in rows {
            keys.push(key?);
        }
        Ok(keys)
    }
}
