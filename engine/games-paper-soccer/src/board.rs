//! Board geometry and the serialisable world snapshot.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while building a world.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("the height and width of the world must be odd, got {width}x{height}")]
    EvenDimensions { width: i32, height: i32 },
    #[error("the world must be at least 3x3, got {width}x{height}")]
    TooSmall { width: i32, height: i32 },
    #[error("both players are named '{0}'")]
    DuplicatePlayer(String),
}

/// A grid vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The vertex one step away in direction `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// True when `other` is one of the 8 neighbours of this vertex.
    pub fn is_adjacent(self, other: Position) -> bool {
        self != other && (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Which goal line a player attacks.
///
/// A `top` player scores on row 0, a `down` player on the last row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Down,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Top => Side::Down,
            Side::Down => Side::Top,
        }
    }

    /// Row of the goal line this side scores on.
    pub fn scoring_row(self, height: i32) -> i32 {
        match self {
            Side::Top => 0,
            Side::Down => height - 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Down => "down",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub side: Side,
}

impl Player {
    pub fn new(name: impl Into<String>, side: Side) -> Self {
        Self {
            name: name.into(),
            side,
        }
    }
}

/// An undirected edge between two neighbouring vertices.
///
/// Equality ignores both the orientation and the player tag, so
/// `Move::new(a, b) == Move::new(b, a)` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Move {
    /// Who drew the edge. `None` for pre-filled walls and raw action payloads.
    #[serde(rename = "Player", default, skip_serializing_if = "Option::is_none")]
    pub player: Option<Player>,
    pub from: Position,
    pub to: Position,
}

impl Move {
    pub fn new(from: Position, to: Position) -> Self {
        Self {
            player: None,
            from,
            to,
        }
    }

    pub fn with_player(mut self, player: Player) -> Self {
        self.player = Some(player);
        self
    }

    /// The same edge drawn in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            player: self.player.clone(),
            from: self.to,
            to: self.from,
        }
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        (self.from == other.from && self.to == other.to)
            || (self.from == other.to && self.to == other.from)
    }
}

impl Eq for Move {}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.player.as_ref().map_or("", |p| p.name.as_str());
        write!(f, "{{player: {}, from: {}, to: {}}}", name, self.from, self.to)
    }
}

/// The full game state, as published to the store after every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub width: i32,
    pub height: i32,
    /// Edges drawn by the players, in play order.
    pub moves: Vec<Move>,
    /// Walls and goal posts, fixed at setup.
    #[serde(rename = "filled-moves")]
    pub filled_moves: Vec<Move>,
    /// Name of the player to move; empty once the game is over.
    pub turn: String,
    #[serde(rename = "ball-pos")]
    pub ball_pos: Position,
    pub player1: Player,
    pub player2: Player,
}

impl World {
    /// Build the kickoff world.
    ///
    /// Sides are drawn with a fair coin from `rng`; `player1` always moves
    /// first regardless of the side it gets.
    pub fn new<R: Rng + ?Sized>(
        player1: impl Into<String>,
        player2: impl Into<String>,
        width: i32,
        height: i32,
        rng: &mut R,
    ) -> Result<Self, WorldError> {
        if width % 2 == 0 || height % 2 == 0 {
            return Err(WorldError::EvenDimensions { width, height });
        }
        if width < 3 || height < 3 {
            return Err(WorldError::TooSmall { width, height });
        }

        let (name1, name2) = (player1.into(), player2.into());
        if name1 == name2 {
            return Err(WorldError::DuplicatePlayer(name1));
        }

        let (side1, side2) = if rng.gen_bool(0.5) {
            (Side::Top, Side::Down)
        } else {
            (Side::Down, Side::Top)
        };

        Ok(Self {
            width,
            height,
            moves: Vec::new(),
            filled_moves: generate_filled_moves(width, height),
            turn: name1.clone(),
            ball_pos: Position::new(width / 2, height / 2),
            player1: Player::new(name1, side1),
            player2: Player::new(name2, side2),
        })
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// True when `pos` lies inside the goal mouth `side` scores on.
    pub fn is_goal_for(&self, side: Side, pos: Position) -> bool {
        pos.y == side.scoring_row(self.height) && (pos.x - self.width / 2).abs() < 2
    }

    /// True when `mv` is already drawn, either as a wall or by a player.
    pub fn is_drawn(&self, mv: &Move) -> bool {
        self.moves.iter().chain(&self.filled_moves).any(|m| m == mv)
    }

    pub fn is_over(&self) -> bool {
        self.turn.is_empty()
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        [&self.player1, &self.player2]
            .into_iter()
            .find(|p| p.name == name)
    }

    /// The other player of the pair, if `name` is one of them.
    pub fn opponent_of(&self, name: &str) -> Option<&Player> {
        if name == self.player1.name {
            Some(&self.player2)
        } else if name == self.player2.name {
            Some(&self.player1)
        } else {
            None
        }
    }

    /// The player whose turn it is, `None` once the game has ended.
    pub fn current_player(&self) -> Option<&Player> {
        self.player(&self.turn)
    }
}

/// Generate the wall and goal-post edges of a `width`×`height` board.
///
/// Every unit cell along the top and bottom rows (except the two goal-mouth
/// cells either side of the centre column) and along the left and right
/// columns contributes its 4 sides and 2 diagonals. Edges shared between
/// neighbouring cells are kept once. The 4 goal posts link each goal's centre
/// vertex to its left and right neighbours.
pub fn generate_filled_moves(width: i32, height: i32) -> Vec<Move> {
    let mut moves = Vec::new();
    let center = width / 2;

    for x in 0..width - 1 {
        if (center - 1..=center).contains(&x) {
            continue;
        }
        add_cell(&mut moves, Position::new(x, height - 2));
        add_cell(&mut moves, Position::new(x, 0));
    }

    for y in 0..height - 1 {
        add_cell(&mut moves, Position::new(0, y));
        add_cell(&mut moves, Position::new(width - 2, y));
    }

    for row in [0, height - 1] {
        let post = Position::new(center, row);
        add_edge(&mut moves, post, post.offset(-1, 0));
        add_edge(&mut moves, post, post.offset(1, 0));
    }

    moves
}

/// Add the 6 edges of the unit cell whose lowest corner is `corner`.
fn add_cell(moves: &mut Vec<Move>, corner: Position) {
    let a = corner;
    let b = corner.offset(1, 0);
    let c = corner.offset(0, 1);
    let d = corner.offset(1, 1);

    add_edge(moves, a, b);
    add_edge(moves, a, c);
    add_edge(moves, a, d);
    add_edge(moves, c, d);
    add_edge(moves, c, b);
    add_edge(moves, d, b);
}

fn add_edge(moves: &mut Vec<Move>, from: Position, to: Position) {
    let edge = Move::new(from, to);
    if !moves.contains(&edge) {
        moves.push(edge);
    }
}
