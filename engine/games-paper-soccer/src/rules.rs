//! Move legality and outcome classification.

use crate::board::{Move, Player, Position, World};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Step table for the 8 neighbours of a vertex: E, NE, N, NW, W, SW, S, SE.
pub const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Landing on a vertex whose count is already at least this loses: the ball
/// is surrounded (8 possible edges minus one).
pub const BLOCKING_OCCUPANCY: u8 = 7;

/// How a submitted move was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveResult {
    #[serde(rename = "valid-move")]
    Valid,
    #[serde(rename = "invalid-move")]
    Invalid,
    #[serde(rename = "prize-move")]
    Prize,
    #[serde(rename = "winning-move")]
    Winning,
    #[serde(rename = "losing-move")]
    Losing,
}

impl MoveResult {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveResult::Valid => "valid-move",
            MoveResult::Invalid => "invalid-move",
            MoveResult::Prize => "prize-move",
            MoveResult::Winning => "winning-move",
            MoveResult::Losing => "losing-move",
        }
    }

    /// Winning and losing moves end the game.
    pub fn is_terminal(self) -> bool {
        matches!(self, MoveResult::Winning | MoveResult::Losing)
    }
}

impl fmt::Display for MoveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-vertex edge count used for prize and blocking checks.
///
/// Walls count at both of their endpoints; a played move counts only at the
/// vertex the ball landed on. Derived from a [`World`]; never serialised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playground {
    width: i32,
    height: i32,
    /// Column-major: index = x * height + y
    cells: Vec<u8>,
}

impl Playground {
    /// An empty grid with no edges at all.
    pub fn new(width: i32, height: i32) -> Self {
        let size = width.max(0) as usize * height.max(0) as usize;
        Self {
            width,
            height,
            cells: vec![0; size],
        }
    }

    /// Rebuild the counts from every wall and every played move of `world`.
    pub fn from_world(world: &World) -> Self {
        let mut playground = Self::new(world.width, world.height);
        for wall in &world.filled_moves {
            playground.record_wall(wall);
        }
        for mv in &world.moves {
            playground.record(mv);
        }
        playground
    }

    #[inline]
    fn index(&self, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.x >= self.width || pos.y < 0 || pos.y >= self.height {
            return None;
        }
        Some(pos.x as usize * self.height as usize + pos.y as usize)
    }

    /// Number of edges touching `pos`; 0 outside the grid.
    pub fn occupancy(&self, pos: Position) -> u8 {
        self.index(pos).map_or(0, |i| self.cells[i])
    }

    /// Count a played move at its destination.
    pub fn record(&mut self, mv: &Move) {
        self.bump(mv.to);
    }

    fn record_wall(&mut self, wall: &Move) {
        self.bump(wall.from);
        self.bump(wall.to);
    }

    fn bump(&mut self, pos: Position) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = self.cells[i].saturating_add(1);
        }
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }
}

/// Every edge the ball can still travel along, oriented away from the ball.
///
/// Order follows [`DIRECTIONS`].
pub fn legal_moves(world: &World) -> Vec<Move> {
    let ball = world.ball_pos;
    DIRECTIONS
        .iter()
        .map(|&(dx, dy)| ball.offset(dx, dy))
        .filter(|&to| world.in_bounds(to))
        .map(|to| Move::new(ball, to))
        .filter(|candidate| !world.is_drawn(candidate))
        .collect()
}

/// The legal edge matching `mv` in either orientation, oriented from the ball.
pub fn resolve_move(world: &World, mv: &Move) -> Option<Move> {
    legal_moves(world).into_iter().find(|legal| legal == mv)
}

/// Judge `mv` for `player` against the current world.
///
/// Checks run in strict priority: invalid, winning, losing (own goal or
/// blocked), prize, valid. Pure in `world` and `playground`.
pub fn classify(world: &World, playground: &Playground, player: &Player, mv: &Move) -> MoveResult {
    let Some(legal) = resolve_move(world, mv) else {
        return MoveResult::Invalid;
    };
    let to = legal.to;

    if world.is_goal_for(player.side, to) {
        return MoveResult::Winning;
    }

    if world.is_goal_for(player.side.opponent(), to) {
        return MoveResult::Losing;
    }

    let occupancy = playground.occupancy(to);
    if occupancy >= BLOCKING_OCCUPANCY {
        return MoveResult::Losing;
    }

    if occupancy > 0 {
        return MoveResult::Prize;
    }

    MoveResult::Valid
}
