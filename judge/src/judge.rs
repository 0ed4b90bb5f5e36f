//! The referee: owns the game and serialises moves against turn timers.
//!
//! Every accepted move or forfeit bumps a turn token and arms a timer for the
//! new token. Both submissions and timer expiries go through the same lock, so
//! classification, application and publication never interleave.

use games_paper_soccer::{Game, Move, MoveResult, Player, Verdict, World};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::controller::{PlayerRegistry, WorldPublisher};
use crate::timeout::{supervise, TurnTimer};

/// How a finished game ended.
#[derive(Debug, Clone, PartialEq)]
pub struct GameOutcome {
    pub winner: Player,
    /// Store identity of the winning player
    pub winner_owner: String,
    /// The verdict that ended the game
    pub result: MoveResult,
}

struct JudgeState {
    game: Game,
    /// Generation counter, bumped on every processed move or forfeit
    token: u64,
}

struct Inner {
    state: Mutex<JudgeState>,
    publisher: Arc<dyn WorldPublisher>,
    registry: PlayerRegistry,
    timer: TurnTimer,
}

#[derive(Clone)]
pub struct Judge {
    inner: Arc<Inner>,
}

impl Judge {
    /// Publish the kickoff world and start the clock for the first player.
    ///
    /// Returns the judge along with the handle of its timer supervisor.
    pub async fn start(
        game: Game,
        registry: PlayerRegistry,
        publisher: Arc<dyn WorldPublisher>,
        turn_timeout: Duration,
    ) -> (Self, JoinHandle<()>) {
        let (timer, commands) = TurnTimer::channel();
        let judge = Self {
            inner: Arc::new(Inner {
                state: Mutex::new(JudgeState { game, token: 0 }),
                publisher,
                registry,
                timer,
            }),
        };

        let on_expire = {
            let judge = judge.clone();
            move |token| {
                let judge = judge.clone();
                async move { judge.expire(token).await }
            }
        };
        let supervisor = tokio::spawn(supervise(commands, turn_timeout, on_expire));

        {
            let state = judge.inner.state.lock().await;
            let world = state.game.world();
            info!(
                player1 = %world.player1.name,
                side1 = %world.player1.side,
                player2 = %world.player2.name,
                side2 = %world.player2.side,
                ball = %world.ball_pos,
                "Game started"
            );
            judge.inner.publisher.publish_world(world).await;
            judge.inner.timer.arm(state.token);
        }

        (judge, supervisor)
    }

    /// Judge a move submitted by player `name`.
    ///
    /// Returns the outcome once the move ends the game. Submissions that are
    /// out of turn, from unknown players or after the end are dropped.
    pub async fn judge(&self, name: &str, mv: Move) -> Option<GameOutcome> {
        let mut state = self.inner.state.lock().await;

        let verdict = match state.game.submit(name, mv) {
            Ok(verdict) => verdict,
            Err(e) => {
                debug!(player = name, "Dropping submission: {}", e);
                return None;
            }
        };

        self.conclude(&mut state, verdict).await
    }

    /// Timer callback: forfeit the turn if `token` is still current.
    pub async fn expire(&self, token: u64) {
        let mut state = self.inner.state.lock().await;
        if state.token != token {
            debug!(token, current = state.token, "Stale turn timer, ignoring");
            return;
        }

        let Some(verdict) = state.game.forfeit() else {
            debug!(token, "Game already over, ignoring timer");
            return;
        };
        info!(player = %verdict.mover.name, "Turn timed out");
        self.conclude(&mut state, verdict).await;
    }

    /// Abort every pending timer.
    pub fn shutdown(&self) {
        self.inner.timer.stop();
    }

    /// Snapshot of the current world.
    #[cfg(test)]
    pub async fn world(&self) -> World {
        self.inner.state.lock().await.game.world().clone()
    }

    async fn conclude(&self, state: &mut JudgeState, verdict: Verdict) -> Option<GameOutcome> {
        state.token += 1;
        info!(
            player = %verdict.mover.name,
            result = %verdict.result,
            ball = %state.game.world().ball_pos,
            token = state.token,
            "Verdict"
        );
        self.inner.publisher.publish_world(state.game.world()).await;

        let Some(winner) = verdict.winner else {
            self.inner.timer.arm(state.token);
            return None;
        };

        let winner_owner = match self.inner.registry.owner_of(&winner.name) {
            Some(owner) => owner.to_string(),
            None => {
                warn!(winner = %winner.name, "Winner has no registered owner, publishing name");
                winner.name.clone()
            }
        };
        info!(winner = %winner.name, owner = %winner_owner, "Game over");
        self.inner.publisher.publish_winner(&winner_owner).await;
        self.inner.timer.stop();

        Some(GameOutcome {
            winner,
            winner_owner,
            result: verdict.result,
        })
    }
}
