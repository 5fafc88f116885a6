//! Commonly used types and utilities for ease of import.

pub use crate::core::{
    apply_shot, can_place, check_winner, place, Board, Cell, GameSession, Orientation, Phase,
    Placement, ShotOutcome,
};

#[cfg(feature = "std")]
pub use crate::{GameServer, MemoryStore, ServerConfig, SessionStore};

#[cfg(feature = "std")]
pub use crate::transport::{in_memory::InMemoryTransport, tcp::TcpTransport, Transport};
