//! Turn state machine on top of the world model.

use crate::board::{Move, Player, World, WorldError};
use crate::rules::{self, MoveResult, Playground};
use rand::Rng;
use thiserror::Error;

/// Why a submission was not judged at all.
///
/// None of these forfeit the turn; the submission is simply dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("'{0}' is not playing this game")]
    UnknownPlayer(String),
    #[error("it is not {0}'s turn")]
    NotYourTurn(String),
    #[error("the game is over")]
    GameOver,
}

/// Where the game stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Player1ToMove,
    Player2ToMove,
    GameOver,
}

/// The effect of one judged move or forfeit.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub result: MoveResult,
    /// The player the verdict was passed on.
    pub mover: Player,
    /// The edge appended to the world, if any.
    pub recorded: Option<Move>,
    /// Set when the verdict ended the game.
    pub winner: Option<Player>,
}

/// A running game: the world plus its derived occupancy grid.
#[derive(Debug, Clone)]
pub struct Game {
    world: World,
    playground: Playground,
    winner: Option<Player>,
}

impl Game {
    /// Wrap an existing world, rebuilding the occupancy grid from it.
    pub fn new(world: World) -> Self {
        let playground = Playground::from_world(&world);
        Self {
            world,
            playground,
            winner: None,
        }
    }

    /// Create the kickoff position for two players.
    pub fn start<R: Rng + ?Sized>(
        player1: impl Into<String>,
        player2: impl Into<String>,
        width: i32,
        height: i32,
        rng: &mut R,
    ) -> Result<Self, WorldError> {
        World::new(player1, player2, width, height, rng).map(Self::new)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn playground(&self) -> &Playground {
        &self.playground
    }

    pub fn winner(&self) -> Option<&Player> {
        self.winner.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.world.is_over()
    }

    pub fn state(&self) -> TurnState {
        if self.world.is_over() {
            TurnState::GameOver
        } else if self.world.turn == self.world.player1.name {
            TurnState::Player1ToMove
        } else {
            TurnState::Player2ToMove
        }
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        rules::legal_moves(&self.world)
    }

    pub fn classify(&self, player: &Player, mv: &Move) -> MoveResult {
        rules::classify(&self.world, &self.playground, player, mv)
    }

    /// Judge a move submitted under `name` and apply the verdict.
    ///
    /// Submissions from unknown players, out of turn, or after the game has
    /// ended are rejected without touching the state.
    pub fn submit(&mut self, name: &str, mv: Move) -> Result<Verdict, SubmitError> {
        if self.is_over() {
            return Err(SubmitError::GameOver);
        }
        let player = self
            .world
            .player(name)
            .cloned()
            .ok_or_else(|| SubmitError::UnknownPlayer(name.to_string()))?;
        if self.world.turn != player.name {
            return Err(SubmitError::NotYourTurn(player.name));
        }

        let result = self.classify(&player, &mv);
        let recorded = match result {
            MoveResult::Invalid => None,
            _ => rules::resolve_move(&self.world, &mv).map(|m| m.with_player(player.clone())),
        };

        Ok(self.apply(player, recorded, result))
    }

    /// Force an invalid verdict on the player to move, passing the turn.
    ///
    /// Returns `None` once the game is over.
    pub fn forfeit(&mut self) -> Option<Verdict> {
        let player = self.world.current_player()?.clone();
        Some(self.apply(player, None, MoveResult::Invalid))
    }

    fn apply(&mut self, mover: Player, recorded: Option<Move>, result: MoveResult) -> Verdict {
        match result {
            MoveResult::Valid | MoveResult::Invalid => self.pass_turn(),
            MoveResult::Prize => {}
            MoveResult::Winning => self.finish(mover.clone()),
            MoveResult::Losing => {
                if let Some(opponent) = self.world.opponent_of(&mover.name).cloned() {
                    self.finish(opponent);
                }
            }
        }

        if let Some(mv) = &recorded {
            self.playground.record(mv);
            self.world.ball_pos = mv.to;
            self.world.moves.push(mv.clone());
        }

        Verdict {
            result,
            mover,
            recorded,
            winner: self.winner.clone(),
        }
    }

    fn pass_turn(&mut self) {
        self.world.turn = if self.world.turn == self.world.player1.name {
            self.world.player2.name.clone()
        } else {
            self.world.player1.name.clone()
        };
    }

    fn finish(&mut self, winner: Player) {
        self.world.turn.clear();
        self.winner = Some(winner);
    }
}
