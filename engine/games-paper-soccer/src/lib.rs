//! Paper soccer rules for the judge
//!
//! Paper soccer is played on a grid of vertices. The ball starts on the centre
//! vertex and each move draws one unit edge (straight or diagonal) from the
//! ball to a neighbouring vertex. An edge can be drawn only once. Landing on a
//! vertex that already has an edge attached grants the mover another move.
//! A player wins by moving the ball into the goal they attack and loses by
//! scoring an own goal or by getting stuck on a fully enclosed vertex.
//!
//! # Board Layout
//!
//! An 11×15 board. Walls (pre-filled edges) cover the outer ring of unit cells
//! except for the three goal-mouth vertices in the middle of the short edges:
//! ```text
//!   x: 0 1 2 3 4 5 6 7 8 9 10
//! y=0  + + + + + G + + + + +      <- goal of the `top` side (columns 4..=6)
//!      + #               # +
//!      + #               # +
//!      ...     (5,7) = kickoff
//!      + #               # +
//! y=14 + + + + + G + + + + +      <- goal of the `down` side
//! ```
//!
//! # Usage
//!
//! ```rust
//! use games_paper_soccer::{Game, Move, MoveResult, Position};
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let mut game = Game::start("alice", "bob", 11, 15, &mut rng).unwrap();
//!
//! let kick = Move::new(Position::new(5, 7), Position::new(6, 7));
//! let verdict = game.submit("alice", kick).unwrap();
//! assert_eq!(verdict.result, MoveResult::Valid);
//! assert_eq!(game.world().turn, "bob");
//! ```

mod board;
mod game;
mod rules;

pub use board::{generate_filled_moves, Move, Player, Position, Side, World, WorldError};
pub use game::{Game, SubmitError, TurnState, Verdict};
pub use rules::{
    classify, legal_moves, resolve_move, MoveResult, Playground, BLOCKING_OCCUPANCY, DIRECTIONS,
};
