//! Epoch-millisecond timestamps stored as plain digit strings.

use crate::store::{KeyValueStore, StoreResult};
use chrono::{DateTime, Utc};

/// Reads a timestamp; unparsable values read as absent.
pub fn read_timestamp<S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
) -> StoreResult<Option<DateTime<Utc>>> {
    Ok(store
        .get_raw(key)?
        .and_then(|raw| raw.trim().trim_matches('"').parse::<i64>().ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis))
}

pub fn write_timestamp<S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
    at: DateTime<Utc>,
) -> StoreResult<()> {
    store.set_raw(key, &at.timestamp_millis().to_string())
}

/// Whether more than `interval` has passed since the stored timestamp.
///
/// A missing timestamp is always due.
pub fn is_due<S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
    interval: chrono::Duration,
    now: DateTime<Utc>,
) -> StoreResult<bool> {
    Ok(match read_timestamp(store, key)? {
        Some(last) => now - last > interval,
        None => true,
    })
}

#[cfg(test)]
mod tests {
    use super::{is_due, read_timestamp, write_timestamp};
    use crate::db::open_db_in_memory;
    use crate::store::{KeyValueStore, SqliteKvStore};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn timestamps_round_trip_and_gate_intervals() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::new(&conn);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

        assert!(is_due(&store, "last", Duration::minutes(30), at).unwrap());
        write_timestamp(&store, "last", at).unwrap();
        assert_eq!(read_timestamp(&store, "last").unwrap(), Some(at));
        assert!(!is_due(&store, "last", Duration::minutes(30), at + Duration::minutes(30)).unwrap());
        assert!(is_due(&store, "last", Duration::minutes(30), at + Duration::minutes(31)).unwrap());

        store.set_raw("last", "garbage").unwrap();
        assert_eq!(read_timestamp(&store, "last").unwrap(), None);
    }
}
