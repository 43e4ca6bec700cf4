//! Persisted dataset.
//!
//! A single SQLite table keyed by (zone, ts_utc). Writes always replace the
//! whole snapshot inside one transaction, so readers see either the previous
//! table or the new one, never a mix.

use chrono::DateTime;
use rtm_core::{
    CanonicalRecord, EnrichedRecord, EnrichedTable, Error, Result, SentimentBucket, Zone,
};
use rusqlite::{params, Connection, OpenFlags, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS market_hours (
    zone             TEXT    NOT NULL,
    ts_utc           INTEGER NOT NULL,
    price            REAL,
    system_load      REAL,
    price_baseline   REAL,
    price_mad        REAL,
    price_z          REAL    NOT NULL,
    price_score      REAL    NOT NULL,
    load_baseline    REAL,
    load_pct_dev     REAL    NOT NULL,
    load_score       REAL    NOT NULL,
    sentiment        REAL    NOT NULL,
    sentiment_bucket TEXT    NOT NULL,
    PRIMARY KEY (zone, ts_utc)
);
"#;

const SELECT_ALL: &str = r#"
SELECT zone, ts_utc, price, system_load,
       price_baseline, price_mad, price_z, price_score,
       load_baseline, load_pct_dev, load_score,
       sentiment, sentiment_bucket
FROM market_hours
ORDER BY zone, ts_utc
"#;

const INSERT: &str = r#"
INSERT INTO market_hours (
    zone, ts_utc, price, system_load,
    price_baseline, price_mad, price_z, price_score,
    load_baseline, load_pct_dev, load_score,
    sentiment, sentiment_bucket
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
"#;

fn db_err(e: rusqlite::Error) -> Error {
    Error::database(e.to_string())
}

/// One stored row before validation.
struct StoredRow {
    zone: String,
    ts_utc: i64,
    price: Option<f64>,
    system_load: Option<f64>,
    price_baseline: Option<f64>,
    price_mad: Option<f64>,
    price_z: f64,
    price_score: f64,
    load_baseline: Option<f64>,
    load_pct_dev: f64,
    load_score: f64,
    sentiment: f64,
    sentiment_bucket: String,
}

impl StoredRow {
    fn into_record(self) -> Result<EnrichedRecord> {
        let zone: Zone = self.zone.parse()?;
        let timestamp = DateTime::from_timestamp(self.ts_utc, 0)
            .ok_or_else(|| Error::data(format!("timestamp out of range: {}", self.ts_utc)))?;
        let sentiment_bucket: SentimentBucket = self.sentiment_bucket.parse()?;

        Ok(EnrichedRecord {
            record: CanonicalRecord {
                timestamp,
                zone,
                price: self.price,
                system_load: self.system_load,
            },
            price_baseline: self.price_baseline,
            price_mad: self.price_mad,
            price_z: self.price_z,
            price_score: self.price_score,
            load_baseline: self.load_baseline,
            load_pct_dev: self.load_pct_dev,
            load_score: self.load_score,
            sentiment: self.sentiment,
            sentiment_bucket,
        })
    }
}

fn read_all(conn: &Connection) -> Result<EnrichedTable> {
    let mut stmt = conn.prepare(SELECT_ALL).map_err(db_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredRow {
                zone: row.get(0)?,
                ts_utc: row.get(1)?,
                price: row.get(2)?,
                system_load: row.get(3)?,
                price_baseline: row.get(4)?,
                price_mad: row.get(5)?,
                price_z: row.get(6)?,
                price_score: row.get(7)?,
                load_baseline: row.get(8)?,
                load_pct_dev: row.get(9)?,
                load_score: row.get(10)?,
                sentiment: row.get(11)?,
                sentiment_bucket: row.get(12)?,
            })
        })
        .map_err(db_err)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row.map_err(db_err)?.into_record()?);
    }
    // SQL text order and `Zone` order agree; sort anyway in case of collation overrides.
    records.sort_by_key(|r| r.key());
    Ok(records)
}

fn write_all(conn: &Connection, records: &[EnrichedRecord]) -> Result<()> {
    conn.execute("DELETE FROM market_hours", []).map_err(db_err)?;
    let mut stmt = conn.prepare(INSERT).map_err(db_err)?;
    for r in records {
        stmt.execute(params![
            r.record.zone.as_str(),
            r.record.timestamp.timestamp(),
            r.record.price,
            r.record.system_load,
            r.price_baseline,
            r.price_mad,
            r.price_z,
            r.price_score,
            r.load_baseline,
            r.load_pct_dev,
            r.load_score,
            r.sentiment,
            r.sentiment_bucket.as_str(),
        ])
        .map_err(db_err)?;
    }
    Ok(())
}

/// SQLite-backed dataset store.
pub struct DatasetStore {
    conn: Connection,
}

impl DatasetStore {
    /// Open (or create) a writable store.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(db_err)?;
        conn.busy_timeout(busy_timeout).map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        tracing::debug!(path = %path.display(), "opened dataset store");
        Ok(Self { conn })
    }

    /// Open an existing store for reading only.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(db_err)?;
        Ok(Self { conn })
    }

    /// In-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self { conn })
    }

    /// Load the whole table, sorted by (zone, timestamp).
    pub fn load(&self) -> Result<EnrichedTable> {
        read_all(&self.conn)
    }

    /// Number of stored rows.
    pub fn row_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM market_hours", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(count as usize)
    }

    /// Atomically replace the stored table.
    pub fn replace(&mut self, records: &[EnrichedRecord]) -> Result<()> {
        let tx = self.conn.transaction().map_err(db_err)?;
        write_all(&tx, records)?;
        tx.commit().map_err(db_err)?;
        tracing::debug!(rows = records.len(), "replaced dataset");
        Ok(())
    }

    /// Read-modify-write under the database write lock.
    ///
    /// `f` receives the current table and returns the table to persist.
    /// Concurrent updaters block (up to the busy timeout) until this commits;
    /// if `f` fails nothing is written.
    pub fn update_with<F>(&mut self, f: F) -> Result<EnrichedTable>
    where
        F: FnOnce(EnrichedTable) -> Result<EnrichedTable>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;
        let existing = read_all(&tx)?;
        let updated = f(existing)?;
        write_all(&tx, &updated)?;
        tx.commit().map_err(db_err)?;
        tracing::debug!(rows = updated.len(), "updated dataset");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    fn enriched(zone: Zone, h: i64, price: f64) -> EnrichedRecord {
        EnrichedRecord {
            record: CanonicalRecord {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                    + ChronoDuration::hours(h),
                zone,
                price: Some(price),
                system_load: None,
            },
            price_baseline: Some(price),
            price_mad: None,
            price_z: 0.0,
            price_score: 50.0,
            load_baseline: None,
            load_pct_dev: 0.0,
            load_score: 50.0,
            sentiment: 50.0,
            sentiment_bucket: SentimentBucket::Yellow,
        }
    }

    #[test]
    fn test_empty_store() {
        let store = DatasetStore::open_in_memory().unwrap();
        assert!(store.load().unwrap().is_empty());
        assert_eq!(store.row_count().unwrap(), 0);
    }

    #[test]
    fn test_replace_and_load() {
        let mut store = DatasetStore::open_in_memory().unwrap();
        let records = vec![
            enriched(Zone::West, 1, 3.0),
            enriched(Zone::HbNorth, 0, 1.0),
            enriched(Zone::West, 0, 2.0),
        ];
        store.replace(&records).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0], records[1]);
        assert_eq!(loaded[1], records[2]);
        assert_eq!(loaded[2], records[0]);
    }

    #[test]
    fn test_replace_is_full_snapshot() {
        let mut store = DatasetStore::open_in_memory().unwrap();
        store.replace(&[enriched(Zone::North, 0, 1.0), enriched(Zone::North, 1, 1.0)]).unwrap();
        store.replace(&[enriched(Zone::South, 5, 9.0)]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].record.zone, Zone::South);
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let mut store = DatasetStore::open_in_memory().unwrap();
        store.replace(&[enriched(Zone::North, 0, 1.0)]).unwrap();

        let result = store.update_with(|_| Err(Error::Other("boom".into())));
        assert!(result.is_err());
        assert_eq!(store.load().unwrap(), vec![enriched(Zone::North, 0, 1.0)]);
    }

    #[test]
    fn test_update_with_sees_existing() {
        let mut store = DatasetStore::open_in_memory().unwrap();
        store.replace(&[enriched(Zone::North, 0, 1.0)]).unwrap();

        let updated = store
            .update_with(|mut existing| {
                assert_eq!(existing.len(), 1);
                existing.push(enriched(Zone::North, 1, 2.0));
                Ok(existing)
            })
            .unwrap();
        assert_eq!(updated.len(), 2);
        assert_eq!(store.row_count().unwrap(), 2);
    }

    #[test]
    fn test_file_store_and_read_only_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rtm.sqlite3");

        let mut writer = DatasetStore::open(&path, Duration::from_secs(1)).unwrap();
        writer.replace(&[enriched(Zone::Houston, 2, 7.5)]).unwrap();

        let reader = DatasetStore::open_read_only(&path).unwrap();
        let loaded = reader.load().unwrap();
        assert_eq!(loaded, vec![enriched(Zone::Houston, 2, 7.5)]);
    }

    #[test]
    fn test_read_only_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DatasetStore::open_read_only(dir.path().join("absent.sqlite3")).is_err());
    }

    #[test]
    fn test_unknown_zone_in_storage_is_data_error() {
        let store = DatasetStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO market_hours VALUES ('PANHANDLE', 0, 1.0, NULL, NULL, NULL, 0, 50, NULL, 0, 50, 50, 'yellow')",
                [],
            )
            .unwrap();
        assert!(matches!(store.load(), Err(Error::Data(_))));
    }
}
