//! In-process record store used by the judge tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

use super::{Key, Record, RecordStore};

pub struct MemoryStore {
    owner: String,
    records: Mutex<Vec<Record>>,
    watchers: Mutex<Vec<(Key, mpsc::Sender<Record>)>>,
    failing_sets: AtomicUsize,
    attempted_sets: AtomicUsize,
}

impl MemoryStore {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            records: Mutex::new(Vec::new()),
            watchers: Mutex::new(Vec::new()),
            failing_sets: AtomicUsize::new(0),
            attempted_sets: AtomicUsize::new(0),
        }
    }

    /// Write as another client, notifying matching watchers.
    pub async fn put_as(&self, owner: &str, key: Key, value: impl Into<String>) {
        let record = Record {
            key,
            owner: owner.to_string(),
            value: value.into(),
        };

        {
            let mut records = self.records.lock().unwrap();
            records.retain(|r| r.key != record.key);
            records.push(record.clone());
        }

        let sinks: Vec<_> = self
            .watchers
            .lock()
            .unwrap()
            .iter()
            .filter(|(filter, _)| record.key.matches(filter))
            .map(|(_, sink)| sink.clone())
            .collect();
        for sink in sinks {
            let _ = sink.send(record.clone()).await;
        }
    }

    /// Make the next `count` calls to `set` fail.
    pub fn fail_next_sets(&self, count: usize) {
        self.failing_sets.store(count, Ordering::SeqCst);
    }

    /// Number of `set` calls made so far, failed ones included.
    pub fn attempted_sets(&self) -> usize {
        self.attempted_sets.load(Ordering::SeqCst)
    }

    pub fn get(&self, key: &Key) -> Option<Record> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| &r.key == key)
            .cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn set(&self, key: &Key, value: &str) -> Result<()> {
        self.attempted_sets.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_sets.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_sets.store(failing - 1, Ordering::SeqCst);
            return Err(anyhow!("store unavailable"));
        }
        self.put_as(&self.owner.clone(), key.clone(), value).await;
        Ok(())
    }

    async fn find(&self, filter: &Key) -> Result<Vec<Record>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.key.matches(filter))
            .cloned()
            .collect())
    }

    async fn watch(&self, filter: &Key, sink: mpsc::Sender<Record>) -> Result<()> {
        self.watchers.lock().unwrap().push((filter.clone(), sink));
        Ok(())
    }
}
