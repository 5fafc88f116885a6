//! Shot resolution and win detection.

use crate::core::board::{Board, Cell};
use core::fmt;

/// Result of firing at a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "std",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ShotOutcome {
    /// Coordinates outside the grid. Board unchanged.
    Invalid,
    /// A ship cell was struck.
    Hit,
    /// Open water was struck.
    Miss,
    /// The cell was already hit or missed. Board unchanged.
    AlreadyHit,
}

impl fmt::Display for ShotOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShotOutcome::Invalid => write!(f, "invalid"),
            ShotOutcome::Hit => write!(f, "hit"),
            ShotOutcome::Miss => write!(f, "miss"),
            ShotOutcome::AlreadyHit => write!(f, "already_hit"),
        }
    }
}

/// Fire at (`row`, `col`) on `board`.
pub fn apply_shot(board: &mut Board, row: i32, col: i32) -> ShotOutcome {
    let Some(index) = board.index(row, col) else {
        return ShotOutcome::Invalid;
    };
    match board.get(row, col) {
        Some(Cell::Ship) => {
            board.transition(index, Cell::Hit);
            ShotOutcome::Hit
        }
        Some(Cell::Empty) => {
            board.transition(index, Cell::Miss);
            ShotOutcome::Miss
        }
        _ => ShotOutcome::AlreadyHit,
    }
}

/// `true` when no ship cell is left standing on `board`.
pub fn check_winner(board: &Board) -> bool {
    board.count(Cell::Ship) == 0
}
