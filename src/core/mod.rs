//! Core battleship game engine (no_std compatible)
//!
//! This module contains the pure game logic: the board model, placement
//! validation, shot resolution and the per-session phase machine. It only
//! needs `alloc` and `rand`, so it can be reused outside the tokio server.

pub mod board;
pub mod common;
pub mod config;
pub mod game;
pub mod placement;
pub mod resolver;
pub mod ship;

// Re-export commonly used types
pub use board::{Board, Cell};
pub use common::{ActionError, ErrorKind, PlacementError};
pub use config::*;
pub use game::{GameId, GameSession, GameView, MoveOutcome, Phase, PlayerId, Seat};
pub use placement::{can_place, check_placement, place, place_fleet};
pub use resolver::{apply_shot, check_winner, ShotOutcome};
pub use ship::{Orientation, Placement, ShipDef};
