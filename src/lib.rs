#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod core;
#[cfg(feature = "std")]
pub mod config;
#[cfg(feature = "std")]
mod logging;
pub mod prelude;
#[cfg(feature = "std")]
pub mod protocol;
#[cfg(feature = "std")]
pub mod registry;
#[cfg(feature = "std")]
pub mod server;
#[cfg(feature = "std")]
pub mod store;
#[cfg(feature = "std")]
pub mod transport;
#[cfg(feature = "std")]
pub mod turn;

pub use crate::core::{
    apply_shot, can_place, check_placement, check_winner, place, place_fleet, ActionError, Board,
    Cell, ErrorKind, GameId, GameSession, GameView, MoveOutcome, Orientation, Phase, Placement,
    PlacementError, PlayerId, Seat, ShipDef, ShotOutcome, BOARD_SIZE, MAX_FLEET_ATTEMPTS,
    MAX_SHIP_ATTEMPTS, NUM_SHIPS, SHIPS, TOTAL_SHIP_CELLS,
};
#[cfg(feature = "std")]
pub use config::ServerConfig;
#[cfg(feature = "std")]
pub use logging::init_logging;
#[cfg(feature = "std")]
pub use protocol::{Action, Hello, ProtocolError, ServerMessage, PROTOCOL_VERSION};
#[cfg(feature = "std")]
pub use registry::{ConnectionHandle, Room, RoomRegistry};
#[cfg(feature = "std")]
pub use server::GameServer;
#[cfg(feature = "std")]
pub use store::{FileStore, MemoryStore, SessionStore, StoreError};
#[cfg(feature = "std")]
pub use transport::{in_memory::InMemoryTransport, tcp::TcpTransport, Transport};
