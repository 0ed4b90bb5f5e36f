//! Routes action notifications from the store to the judge.

use games_paper_soccer::Move;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::controller::{PlayerRegistry, TYPE_ACTION};
use crate::judge::{GameOutcome, Judge};
use crate::store::Record;

pub struct Dispatcher {
    judge: Judge,
    registry: PlayerRegistry,
    notifications: mpsc::Receiver<Record>,
}

impl Dispatcher {
    pub fn new(judge: Judge, registry: PlayerRegistry, notifications: mpsc::Receiver<Record>) -> Self {
        Self {
            judge,
            registry,
            notifications,
        }
    }

    /// Drain notifications one at a time until the game ends.
    ///
    /// Returns `None` if the notification stream closes first.
    pub async fn run(mut self) -> Option<GameOutcome> {
        while let Some(record) = self.notifications.recv().await {
            let Some((name, mv)) = self.accept(&record) else {
                continue;
            };
            if let Some(outcome) = self.judge.judge(&name, mv).await {
                info!(winner = %outcome.winner.name, "Dispatcher finished");
                return Some(outcome);
            }
        }

        warn!("Action stream closed before the game ended");
        None
    }

    /// Check the sender identity and decode the move payload.
    fn accept(&self, record: &Record) -> Option<(String, Move)> {
        if record.key.kind != TYPE_ACTION {
            debug!(key = %record.key, "Ignoring non-action record");
            return None;
        }

        match self.registry.name_of(&record.owner) {
            Some(name) if name == record.key.name => {}
            registered => {
                debug!(
                    key = %record.key,
                    owner = %record.owner,
                    registered = ?registered,
                    "Dropping action from mismatched sender"
                );
                return None;
            }
        }

        match serde_json::from_str::<Move>(&record.value) {
            Ok(mv) => Some((record.key.name.clone(), mv)),
            Err(e) => {
                debug!(key = %record.key, "Dropping undecodable action: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{
        Controller, WorldPublisher, TYPE_END_OF_GAME, TYPE_REGISTER, TYPE_VERDICT, WORLD_NAME,
    };
    use crate::store::{Key, MemoryStore, RecordStore};
    use games_paper_soccer::{Game, Position, Side, World};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::task::JoinHandle;

    const NS: &str = "paper-soccer";

    struct Harness {
        store: Arc<MemoryStore>,
        judge: Judge,
        dispatcher: JoinHandle<Option<GameOutcome>>,
    }

    /// alice (owner-a) attacks the top goal and moves first, ball at `ball`.
    async fn harness(ball: Position) -> Harness {
        let store = Arc::new(MemoryStore::new("judge"));
        let controller = Arc::new(Controller::new(
            Arc::clone(&store) as Arc<dyn RecordStore>,
            NS,
            Duration::from_secs(3),
            Duration::from_secs(3),
        ));
        let (tx, rx) = mpsc::channel(16);
        controller.subscribe_actions(tx).await.unwrap();

        let registry = PlayerRegistry::new(
            ("owner-a".into(), "alice".into()),
            ("owner-b".into(), "bob".into()),
        )
        .unwrap();

        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let mut world = World::new("alice", "bob", 11, 15, &mut rng).unwrap();
        world.player1.side = Side::Top;
        world.player2.side = Side::Down;
        world.ball_pos = ball;

        let (judge, _supervisor) = Judge::start(
            Game::new(world),
            registry.clone(),
            controller as Arc<dyn WorldPublisher>,
            Duration::from_secs(3),
        )
        .await;
        let dispatcher = tokio::spawn(Dispatcher::new(judge.clone(), registry, rx).run());

        Harness {
            store,
            judge,
            dispatcher,
        }
    }

    async fn act(store: &MemoryStore, owner: &str, name: &str, payload: &str) {
        store
            .put_as(owner, Key::new(TYPE_ACTION, NS, name), payload)
            .await;
        // Let the dispatcher drain the notification
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    fn published_world(store: &MemoryStore) -> World {
        let record = store.get(&Key::new(TYPE_VERDICT, NS, WORLD_NAME)).unwrap();
        serde_json::from_str(&record.value).unwrap()
    }

    const KICK: &str = r#"{"from":{"x":5,"y":7},"to":{"x":6,"y":7}}"#;

    #[tokio::test(start_paused = true)]
    async fn test_valid_action_is_judged_and_published() {
        let h = harness(Position::new(5, 7)).await;
        act(&h.store, "owner-a", "alice", KICK).await;

        let world = published_world(&h.store);
        assert_eq!(world.turn, "bob");
        assert_eq!(world.ball_pos, Position::new(6, 7));
        assert_eq!(world.moves.len(), 1);
        assert_eq!(world, h.judge.world().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spoofed_sender_is_dropped() {
        let h = harness(Position::new(5, 7)).await;
        // owner-b writing under alice's name
        act(&h.store, "owner-b", "alice", KICK).await;
        // an unregistered owner
        act(&h.store, "owner-x", "alice", KICK).await;

        let world = h.judge.world().await;
        assert_eq!(world.turn, "alice");
        assert!(world.moves.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_payload_is_dropped_without_forfeit() {
        let h = harness(Position::new(5, 7)).await;
        act(&h.store, "owner-a", "alice", "not json").await;
        act(&h.store, "owner-a", "alice", r#"{"from":{"x":5}}"#).await;

        assert_eq!(h.judge.world().await.turn, "alice");

        act(&h.store, "owner-a", "alice", KICK).await;
        assert_eq!(h.judge.world().await.turn, "bob");
    }

    #[tokio::test(start_paused = true)]
    async fn test_game_to_completion() {
        let h = harness(Position::new(5, 2)).await;

        // Valid step towards the top goal, bob stalls until timeout
        act(&h.store, "owner-a", "alice", r#"{"from":{"x":5,"y":2},"to":{"x":5,"y":1}}"#).await;
        assert_eq!(h.judge.world().await.turn, "bob");
        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(h.judge.world().await.turn, "alice");

        // Reversed orientation is accepted
        act(&h.store, "owner-a", "alice", r#"{"from":{"x":5,"y":0},"to":{"x":5,"y":1}}"#).await;

        let outcome = h.dispatcher.await.unwrap().unwrap();
        assert_eq!(outcome.winner.name, "alice");
        assert_eq!(outcome.winner_owner, "owner-a");

        let end = h.store.get(&Key::new(TYPE_END_OF_GAME, NS, "")).unwrap();
        assert_eq!(end.value, "owner-a");
        assert_eq!(end.owner, "judge");
        assert!(published_world(&h.store).turn.is_empty());
    }

    fn record(kind: &str, owner: &str, name: &str, value: &str) -> Record {
        Record {
            key: Key::new(kind, NS, name),
            owner: owner.into(),
            value: value.into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_accept_only_takes_actions() {
        let judge = harness(Position::new(5, 7)).await.judge;
        let (_tx, rx) = mpsc::channel(1);
        let registry = PlayerRegistry::new(
            ("owner-a".into(), "alice".into()),
            ("owner-b".into(), "bob".into()),
        )
        .unwrap();
        let dispatcher = Dispatcher::new(judge, registry, rx);

        for kind in [TYPE_REGISTER, TYPE_VERDICT, TYPE_END_OF_GAME] {
            assert_eq!(dispatcher.accept(&record(kind, "owner-a", "alice", KICK)), None);
        }

        let (name, mv) = dispatcher
            .accept(&record(TYPE_ACTION, "owner-a", "alice", KICK))
            .unwrap();
        assert_eq!(name, "alice");
        assert_eq!(mv, Move::new(Position::new(5, 7), Position::new(6, 7)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_stream_ends_without_outcome() {
        let judge = harness(Position::new(5, 7)).await.judge;
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        let registry = PlayerRegistry::new(
            ("owner-a".into(), "alice".into()),
            ("owner-b".into(), "bob".into()),
        )
        .unwrap();
        assert_eq!(Dispatcher::new(judge, registry, rx).run().await, None);
    }
}
