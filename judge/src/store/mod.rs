//! Shared record store the judge and the players talk through.
//!
//! Every record is addressed by a [`Key`] (type tag, namespace, name), carries
//! the identity of the client that wrote it, and holds an opaque string value.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::store::{Key, RecordStore, SqliteStore};
//!
//! let store = SqliteStore::open("./data/store.db", "judge", poll_interval)?;
//!
//! // Subscribe to every action in the namespace
//! store.watch(&Key::new("action", "paper-soccer", ""), tx).await?;
//! ```

#[cfg(test)]
pub mod memory;
mod sqlite;

#[cfg(test)]
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

/// Record address. Empty fields act as wildcards when used as a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Key {
    /// Type tag, e.g. `register` or `action`
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl Key {
    pub fn new(kind: impl Into<String>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// True when this key falls under `filter`.
    pub fn matches(&self, filter: &Key) -> bool {
        fn field(value: &str, wanted: &str) -> bool {
            wanted.is_empty() || value == wanted
        }
        field(&self.kind, &filter.kind)
            && field(&self.namespace, &filter.namespace)
            && field(&self.name, &filter.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// A stored value together with who wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Key,
    /// Identity of the writing client, assigned by the store
    pub owner: String,
    pub value: String,
}

/// Abstract interface to the shared key-value store.
///
/// Writes made through this interface are attributed to the store client's
/// own identity.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create or overwrite the record at `key`.
    async fn set(&self, key: &Key, value: &str) -> Result<()>;

    /// All records currently matching `filter`, oldest write first.
    async fn find(&self, filter: &Key) -> Result<Vec<Record>>;

    /// Forward every future write matching `filter` into `sink`.
    ///
    /// Delivery stops once the receiving side is dropped.
    async fn watch(&self, filter: &Key, sink: mpsc::Sender<Record>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_matches_wildcards() {
        let key = Key::new("action", "paper-soccer", "alice");
        assert!(key.matches(&Key::default()));
        assert!(key.matches(&Key::new("action", "paper-soccer", "")));
        assert!(key.matches(&Key::new("", "", "alice")));
        assert!(!key.matches(&Key::new("register", "paper-soccer", "")));
        assert!(!key.matches(&Key::new("action", "chess", "")));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(
            Key::new("verdict", "paper-soccer", "world").to_string(),
            "verdict/paper-soccer/world"
        );
    }
}
