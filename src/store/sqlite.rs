//! SQLite-backed stores
//!
//! All schema creation is idempotent (`IF NOT EXISTS`) so opening an
//! existing database is a no-op. Event timestamps are stored in epoch
//! milliseconds, dot timestamps in epoch seconds; the `(timestamp,
//! dot_analyst)` primary key plus `ON CONFLICT DO NOTHING` gives the
//! insert-if-absent semantics the whole engine relies on.

use super::{DotRecord, DotStore, InsertOutcome, LabelStore, SentimentEvent, StoreError};
use crate::dot_core::DotVersion;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

fn open_connection(db_path: impl AsRef<Path>) -> Result<Connection, StoreError> {
    if let Some(parent) = db_path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Database(format!("create db directory: {}", e)))?;
        }
    }

    let conn = Connection::open(db_path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

/// Read access to the classifier's output tables.
pub struct SqliteLabelStore {
    conn: Mutex<Connection>,
}

impl SqliteLabelStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = open_connection(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS sentiment_events (
                post_hash TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                sentiment_analyst TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_events_analyst_timestamp
             ON sentiment_events(sentiment_analyst, timestamp)",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sentiment_data (
                post_hash TEXT NOT NULL,
                sentiment_analyst TEXT NOT NULL,
                sentiment_data TEXT NOT NULL,
                PRIMARY KEY (post_hash, sentiment_analyst)
            )",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Test/seed helper: record an event and its label in one step.
    pub fn insert_event(
        &self,
        post_hash: &str,
        timestamp_ms: i64,
        analyst: &str,
        label: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sentiment_events (post_hash, timestamp, sentiment_analyst)
             VALUES (?1, ?2, ?3)",
            params![post_hash, timestamp_ms, analyst],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO sentiment_data (post_hash, sentiment_analyst, sentiment_data)
             VALUES (?1, ?2, ?3)",
            params![post_hash, analyst, label],
        )?;
        Ok(())
    }

    /// Test/seed helper: event row without a matching label row.
    pub fn insert_unlabeled_event(
        &self,
        post_hash: &str,
        timestamp_ms: i64,
        analyst: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sentiment_events (post_hash, timestamp, sentiment_analyst)
             VALUES (?1, ?2, ?3)",
            params![post_hash, timestamp_ms, analyst],
        )?;
        Ok(())
    }
}

impl LabelStore for SqliteLabelStore {
    fn events_in_range(
        &self,
        analyst: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<SentimentEvent>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT post_hash, timestamp FROM sentiment_events
             WHERE timestamp >= ?1 AND timestamp < ?2 AND sentiment_analyst = ?3
             ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map(params![start_ms, end_ms, analyst], |row| {
            Ok(SentimentEvent {
                post_hash: row.get(0)?,
                timestamp_ms: row.get(1)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    fn lookup_label(&self, post_hash: &str, analyst: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let label = conn
            .query_row(
                "SELECT sentiment_data FROM sentiment_data
                 WHERE post_hash = ?1 AND sentiment_analyst = ?2",
                params![post_hash, analyst],
                |row| row.get(0),
            )
            .optional()?;
        Ok(label)
    }

    fn min_event_timestamp(&self, analyst: &str) -> Result<Option<i64>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let ts: Option<i64> = conn.query_row(
            "SELECT min(timestamp) FROM sentiment_events WHERE sentiment_analyst = ?1",
            params![analyst],
            |row| row.get(0),
        )?;
        Ok(ts)
    }

    fn max_event_timestamp(&self, analyst: &str) -> Result<Option<i64>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let ts: Option<i64> = conn.query_row(
            "SELECT max(timestamp) FROM sentiment_events WHERE sentiment_analyst = ?1",
            params![analyst],
            |row| row.get(0),
        )?;
        Ok(ts)
    }
}

/// Append-only storage for the persisted dot series.
pub struct SqliteDotStore {
    conn: Mutex<Connection>,
}

impl SqliteDotStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = open_connection(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS dot_data (
                timestamp INTEGER NOT NULL,
                dot_analyst TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (timestamp, dot_analyst)
            )",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl DotStore for SqliteDotStore {
    fn latest(&self, version: DotVersion) -> Result<Option<DotRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                "SELECT timestamp, data FROM dot_data
                 WHERE dot_analyst = ?1 ORDER BY timestamp DESC LIMIT 1",
                params![version.as_str()],
                |row| {
                    Ok(DotRecord {
                        timestamp: row.get(0)?,
                        state: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn get(&self, version: DotVersion, timestamp: i64) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let state = conn
            .query_row(
                "SELECT data FROM dot_data WHERE timestamp = ?1 AND dot_analyst = ?2",
                params![timestamp, version.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(state)
    }

    fn insert_if_absent(
        &self,
        version: DotVersion,
        timestamp: i64,
        state: &str,
    ) -> Result<InsertOutcome, StoreError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "INSERT INTO dot_data (timestamp, dot_analyst, data)
             VALUES (?1, ?2, ?3) ON CONFLICT DO NOTHING",
            params![timestamp, version.as_str(), state],
        )?;
        if changed == 1 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::AlreadyExists)
        }
    }

    fn timestamps(&self, version: DotVersion) -> Result<Vec<i64>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT timestamp FROM dot_data WHERE dot_analyst = ?1 ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map(params![version.as_str()], |row| row.get(0))?;

        let mut timestamps = Vec::new();
        for row in rows {
            timestamps.push(row?);
        }
        Ok(timestamps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_insert_if_absent_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = SqliteDotStore::open(dir.path().join("test.db")).unwrap();

        let first = store
            .insert_if_absent(DotVersion::V1, 60, r#"{"d":0.5}"#)
            .unwrap();
        assert_eq!(first, InsertOutcome::Inserted);

        // Second attempt must not change the stored value
        let second = store
            .insert_if_absent(DotVersion::V1, 60, r#"{"d":0.9}"#)
            .unwrap();
        assert_eq!(second, InsertOutcome::AlreadyExists);

        let stored = store.get(DotVersion::V1, 60).unwrap().unwrap();
        assert_eq!(stored, r#"{"d":0.5}"#);
    }

    #[test]
    fn test_versions_do_not_collide() {
        let dir = tempdir().unwrap();
        let store = SqliteDotStore::open(dir.path().join("test.db")).unwrap();

        store
            .insert_if_absent(DotVersion::V1, 60, r#"{"d":0.1}"#)
            .unwrap();
        store
            .insert_if_absent(DotVersion::V2, 60, r#"{"d":0.2,"s":[]}"#)
            .unwrap();

        assert_eq!(
            store.get(DotVersion::V1, 60).unwrap().unwrap(),
            r#"{"d":0.1}"#
        );
        assert_eq!(
            store.get(DotVersion::V2, 60).unwrap().unwrap(),
            r#"{"d":0.2,"s":[]}"#
        );
    }

    #[test]
    fn test_latest_and_timestamps_ordering() {
        let dir = tempdir().unwrap();
        let store = SqliteDotStore::open(dir.path().join("test.db")).unwrap();

        for ts in [180, 60, 120] {
            store
                .insert_if_absent(DotVersion::V1, ts, r#"{"d":0.0}"#)
                .unwrap();
        }

        let latest = store.latest(DotVersion::V1).unwrap().unwrap();
        assert_eq!(latest.timestamp, 180);
        assert_eq!(store.timestamps(DotVersion::V1).unwrap(), vec![60, 120, 180]);
    }

    #[test]
    fn test_label_store_range_and_lookup() {
        let dir = tempdir().unwrap();
        let store = SqliteLabelStore::open(dir.path().join("test.db")).unwrap();

        store.insert_event("p1", 60_000, "v3", "positive").unwrap();
        store.insert_event("p2", 119_999, "v3", "negative").unwrap();
        store.insert_event("p3", 120_000, "v3", "neutral").unwrap();
        store.insert_unlabeled_event("p4", 61_000, "v3").unwrap();

        // Half-open range: p3 falls in the next bucket
        let events = store.events_in_range("v3", 60_000, 120_000).unwrap();
        let hashes: Vec<&str> = events.iter().map(|e| e.post_hash.as_str()).collect();
        assert_eq!(hashes, vec!["p1", "p4", "p2"]);

        assert_eq!(
            store.lookup_label("p1", "v3").unwrap(),
            Some("positive".to_string())
        );
        assert_eq!(store.lookup_label("p4", "v3").unwrap(), None);

        assert_eq!(store.min_event_timestamp("v3").unwrap(), Some(60_000));
        assert_eq!(store.max_event_timestamp("v3").unwrap(), Some(120_000));
        assert_eq!(store.min_event_timestamp("v9").unwrap(), None);
    }
}
