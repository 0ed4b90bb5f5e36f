//! Glue between the judge and the record store.
//!
//! The controller knows the record layout of a paper soccer game: where the
//! world is published, where the result goes, and how players register. It
//! retries writes forever on a fixed backoff; a store outage stalls the game
//! but never ends it.

use anyhow::Result;
use async_trait::async_trait;
use games_paper_soccer::World;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep};
use tracing::{debug, error, info, warn};

use crate::store::{Key, Record, RecordStore};

pub const TYPE_VERDICT: &str = "verdict";
pub const TYPE_ACTION: &str = "action";
pub const TYPE_REGISTER: &str = "register";
pub const TYPE_END_OF_GAME: &str = "end-of-game";
pub const WORLD_NAME: &str = "world";

/// What the judge needs from the outside world to report progress.
#[async_trait]
pub trait WorldPublisher: Send + Sync {
    /// Publish the current world snapshot.
    async fn publish_world(&self, world: &World);

    /// Publish the owner identity of the winner.
    async fn publish_winner(&self, owner: &str);
}

/// Owner identity ↔ player name, fixed once both players have registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRegistry {
    /// (owner, name) in registration order
    players: [(String, String); 2],
    by_owner: HashMap<String, String>,
}

impl PlayerRegistry {
    /// Build a registry from two registration records.
    ///
    /// Returns `None` unless owners and names are both distinct.
    pub fn from_records(first: &Record, second: &Record) -> Option<Self> {
        Self::new(
            (first.owner.clone(), first.key.name.clone()),
            (second.owner.clone(), second.key.name.clone()),
        )
    }

    pub fn new(first: (String, String), second: (String, String)) -> Option<Self> {
        if first.0 == second.0 || first.1 == second.1 {
            return None;
        }
        let by_owner = [&first, &second]
            .into_iter()
            .map(|(owner, name)| (owner.clone(), name.clone()))
            .collect();
        Some(Self {
            players: [first, second],
            by_owner,
        })
    }

    /// The player name registered by `owner`.
    pub fn name_of(&self, owner: &str) -> Option<&str> {
        self.by_owner.get(owner).map(String::as_str)
    }

    /// The owner that registered `name`.
    pub fn owner_of(&self, name: &str) -> Option<&str> {
        self.players
            .iter()
            .find(|(_, n)| n == name)
            .map(|(owner, _)| owner.as_str())
    }

    /// Player names in registration order.
    pub fn names(&self) -> (&str, &str) {
        (&self.players[0].1, &self.players[1].1)
    }
}

pub struct Controller {
    store: Arc<dyn RecordStore>,
    namespace: String,
    retry_interval: Duration,
    register_poll: Duration,
}

impl Controller {
    pub fn new(
        store: Arc<dyn RecordStore>,
        namespace: impl Into<String>,
        retry_interval: Duration,
        register_poll: Duration,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            retry_interval,
            register_poll,
        }
    }

    /// Start forwarding every action in the namespace into `sink`.
    pub async fn subscribe_actions(&self, sink: mpsc::Sender<Record>) -> Result<()> {
        let filter = Key::new(TYPE_ACTION, self.namespace.as_str(), "");
        self.store.watch(&filter, sink).await?;
        info!(namespace = %self.namespace, "Subscribed to player actions");
        Ok(())
    }

    /// Poll for registrations until exactly two distinct players are present.
    pub async fn receipt_players(&self) -> PlayerRegistry {
        let filter = Key::new(TYPE_REGISTER, self.namespace.as_str(), "");
        let mut ticker = interval(self.register_poll);

        loop {
            ticker.tick().await;
            let records = match self.store.find(&filter).await {
                Ok(records) => records,
                Err(e) => {
                    warn!("Failed to look up registrations: {}", e);
                    continue;
                }
            };

            match records.as_slice() {
                [first, second] => match PlayerRegistry::from_records(first, second) {
                    Some(registry) => {
                        let (p1, p2) = registry.names();
                        info!(player1 = p1, player2 = p2, "Both players registered");
                        return registry;
                    }
                    None => warn!("Registrations must use distinct owners and names, waiting"),
                },
                _ => debug!(count = records.len(), "Waiting for two registrations"),
            }
        }
    }

    async fn set_with_retry(&self, key: &Key, value: &str) {
        let mut attempt: u32 = 0;
        loop {
            match self.store.set(key, value).await {
                Ok(()) => return,
                Err(e) => {
                    attempt += 1;
                    warn!(%key, attempt, "Failed to write record: {}", e);
                    sleep(self.retry_interval).await;
                }
            }
        }
    }
}

#[async_trait]
impl WorldPublisher for Controller {
    async fn publish_world(&self, world: &World) {
        let value = match serde_json::to_string(world) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to serialize world: {}", e);
                return;
            }
        };
        let key = Key::new(TYPE_VERDICT, self.namespace.as_str(), WORLD_NAME);
        self.set_with_retry(&key, &value).await;
    }

    async fn publish_winner(&self, owner: &str) {
        let key = Key::new(TYPE_END_OF_GAME, self.namespace.as_str(), "");
        self.set_with_retry(&key, owner).await;
        info!(winner = owner, "Published end of game");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use games_paper_soccer::Game;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const NS: &str = "paper-soccer";

    fn controller(store: &Arc<MemoryStore>) -> Controller {
        Controller::new(
            Arc::clone(store) as Arc<dyn RecordStore>,
            NS,
            Duration::from_secs(3),
            Duration::from_secs(3),
        )
    }

    fn register(name: &str) -> Key {
        Key::new(TYPE_REGISTER, NS, name)
    }

    #[test]
    fn test_registry_lookups() {
        let registry = PlayerRegistry::new(
            ("owner-a".into(), "alice".into()),
            ("owner-b".into(), "bob".into()),
        )
        .unwrap();
        assert_eq!(registry.name_of("owner-a"), Some("alice"));
        assert_eq!(registry.name_of("owner-x"), None);
        assert_eq!(registry.owner_of("bob"), Some("owner-b"));
        assert_eq!(registry.names(), ("alice", "bob"));
    }

    #[test]
    fn test_registry_rejects_shared_owner_or_name() {
        assert!(PlayerRegistry::new(("o".into(), "a".into()), ("o".into(), "b".into())).is_none());
        assert!(PlayerRegistry::new(("o1".into(), "a".into()), ("o2".into(), "a".into())).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_receipt_players_waits_for_both() {
        let store = Arc::new(MemoryStore::new("judge"));
        let controller = controller(&store);
        store.put_as("owner-a", register("alice"), "").await;

        let waiting = tokio::spawn(async move { controller.receipt_players().await });
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!waiting.is_finished());

        store.put_as("owner-b", register("bob"), "").await;
        let registry = waiting.await.unwrap();
        assert_eq!(registry.names(), ("alice", "bob"));
        assert_eq!(registry.name_of("owner-b"), Some("bob"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_world_retries_until_store_recovers() {
        let store = Arc::new(MemoryStore::new("judge"));
        let controller = controller(&store);
        store.fail_next_sets(2);

        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let game = Game::start("alice", "bob", 11, 15, &mut rng).unwrap();
        controller.publish_world(game.world()).await;

        assert_eq!(store.attempted_sets(), 3);
        let record = store.get(&Key::new(TYPE_VERDICT, NS, WORLD_NAME)).unwrap();
        assert_eq!(record.owner, "judge");
        let published: World = serde_json::from_str(&record.value).unwrap();
        assert_eq!(&published, game.world());
    }

    #[tokio::test]
    async fn test_publish_winner_writes_end_of_game() {
        let store = Arc::new(MemoryStore::new("judge"));
        controller(&store).publish_winner("owner-b").await;

        let record = store.get(&Key::new(TYPE_END_OF_GAME, NS, "")).unwrap();
        assert_eq!(record.value, "owner-b");
    }

    #[tokio::test]
    async fn test_subscribe_actions_filters_by_type() {
        let store = Arc::new(MemoryStore::new("judge"));
        let (tx, mut rx) = mpsc::channel(4);
        controller(&store).subscribe_actions(tx).await.unwrap();

        store.put_as("owner-a", register("alice"), "").await;
        store
            .put_as("owner-a", Key::new(TYPE_ACTION, NS, "alice"), "{}")
            .await;

        let record = rx.recv().await.unwrap();
        assert_eq!(record.key.kind, TYPE_ACTION);
        assert!(rx.try_recv().is_err());
    }
}
