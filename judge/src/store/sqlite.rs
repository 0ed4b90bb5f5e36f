//! SQLite backend for the record store.
//!
//! The database file is shared with the player agents on the same host. Each
//! write bumps a global revision counter; watches poll for rows whose
//! revision is newer than the last one they delivered.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::{Key, Record, RecordStore};

/// SQLite-based record store.
///
/// Uses a Mutex for thread-safety since rusqlite Connection is not Sync.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    owner: String,
    poll_interval: Duration,
}

impl SqliteStore {
    /// Open (or create) the store at `db_path`, writing as `owner`.
    pub fn open(db_path: &str, owner: impl Into<String>, poll_interval: Duration) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::with_connection(conn, owner.into(), poll_interval)
    }

    /// A private in-memory store.
    #[cfg(test)]
    pub fn in_memory(owner: impl Into<String>, poll_interval: Duration) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, owner.into(), poll_interval)
    }

    fn with_connection(conn: Connection, owner: String, poll_interval: Duration) -> Result<Self> {
        // Players write to the same file; wait for their locks instead of failing
        conn.busy_timeout(Duration::from_secs(5))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                kind TEXT NOT NULL,
                namespace TEXT NOT NULL,
                name TEXT NOT NULL,
                owner TEXT NOT NULL,
                value TEXT NOT NULL,
                revision INTEGER NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (kind, namespace, name)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_records_revision ON records(revision)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            owner,
            poll_interval,
        })
    }

    /// Write `value` at `key` attributed to `owner`.
    ///
    /// This is what every client of the shared file does; [`RecordStore::set`]
    /// calls it with the store's own identity.
    pub fn put_as(&self, owner: &str, key: &Key, value: &str) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO records (kind, namespace, name, owner, value, revision)
             VALUES (?1, ?2, ?3, ?4, ?5, (SELECT COALESCE(MAX(revision), 0) + 1 FROM records))
             ON CONFLICT(kind, namespace, name) DO UPDATE SET
                owner = excluded.owner,
                value = excluded.value,
                revision = excluded.revision,
                updated_at = CURRENT_TIMESTAMP",
            params![key.kind, key.namespace, key.name, owner, value],
        )?;
        Ok(())
    }

    fn latest_revision(conn: &Mutex<Connection>) -> Result<i64> {
        let conn = lock(conn)?;
        let revision = conn.query_row(
            "SELECT COALESCE(MAX(revision), 0) FROM records",
            [],
            |row| row.get(0),
        )?;
        Ok(revision)
    }

    /// Records matching `filter` written after `after`, with their revisions.
    fn changes_since(conn: &Mutex<Connection>, filter: &Key, after: i64) -> Result<Vec<(i64, Record)>> {
        let conn = lock(conn)?;
        let mut stmt = conn.prepare_cached(
            "SELECT revision, kind, namespace, name, owner, value FROM records
             WHERE (?1 = '' OR kind = ?1)
               AND (?2 = '' OR namespace = ?2)
               AND (?3 = '' OR name = ?3)
               AND revision > ?4
             ORDER BY revision",
        )?;

        let rows = stmt.query_map(
            params![filter.kind, filter.namespace, filter.name, after],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    Record {
                        key: Key {
                            kind: row.get(1)?,
                            namespace: row.get(2)?,
                            name: row.get(3)?,
                        },
                        owner: row.get(4)?,
                        value: row.get(5)?,
                    },
                ))
            },
        )?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<std::sync::MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn set(&self, key: &Key, value: &str) -> Result<()> {
        self.put_as(&self.owner, key, value)
    }

    async fn find(&self, filter: &Key) -> Result<Vec<Record>> {
        let records = Self::changes_since(&self.conn, filter, 0)?;
        Ok(records.into_iter().map(|(_, record)| record).collect())
    }

    async fn watch(&self, filter: &Key, sink: mpsc::Sender<Record>) -> Result<()> {
        let conn = Arc::clone(&self.conn);
        let filter = filter.clone();
        let period = self.poll_interval;
        let mut last_seen = Self::latest_revision(&conn)?;
        debug!(%filter, revision = last_seen, "Watching for changes");

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let changes = match Self::changes_since(&conn, &filter, last_seen) {
                    Ok(changes) => changes,
                    Err(e) => {
                        warn!(%filter, "Failed to poll store: {}", e);
                        continue;
                    }
                };

                for (revision, record) in changes {
                    last_seen = revision;
                    if sink.send(record).await.is_err() {
                        debug!(%filter, "Watch receiver dropped, stopping");
                        return;
                    }
                }
            }
        });

        Ok(())
    }
}
