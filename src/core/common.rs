//! Error types shared by the board, placement and session logic.

use crate::core::game::Phase;

/// Category of an error reported back to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Illegal placement, bad coordinates, wrong phase or not your turn.
    Validation,
    /// Malformed record or unknown action.
    Protocol,
    /// Unknown session or player.
    NotFound,
    /// Delivery to a connection failed.
    Transport,
    /// The session store could not persist or load state.
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Protocol => "protocol",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Transport => "transport",
            ErrorKind::Storage => "storage",
        }
    }
}

/// Reasons a ship may not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    /// Ship length is zero, negative or longer than the board.
    InvalidLength,
    /// Part of the footprint lies outside the grid.
    OutOfBounds,
    /// A footprint cell is not empty.
    Occupied,
    /// A ship already touches the footprint, diagonals included.
    Adjacent,
}

impl core::fmt::Display for PlacementError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PlacementError::InvalidLength => write!(f, "Invalid ship size"),
            PlacementError::OutOfBounds => write!(f, "Ship placement is out of bounds"),
            PlacementError::Occupied => write!(f, "Ship placement overlaps with another ship"),
            PlacementError::Adjacent => write!(f, "Ship placement touches another ship"),
        }
    }
}

/// Errors returned by session actions. None of them change session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The action is not legal in the current phase.
    WrongPhase { action: &'static str, phase: Phase },
    /// A move was sent by the player who does not own the turn.
    NotYourTurn,
    /// The requested ship placement was rejected.
    InvalidPlacement(PlacementError),
    /// Shot coordinates lie outside the grid.
    InvalidCoordinates { row: i32, col: i32 },
    /// The targeted cell was already hit or missed.
    AlreadyTargeted { row: i32, col: i32 },
    /// The player already signalled that setup is complete.
    AlreadyReady,
    /// The player holds no seat in this session.
    NotSeated,
    /// Both seats are taken by other players.
    GameFull,
    /// Automatic placement ran out of attempts.
    FleetPlacementFailed,
}

impl ActionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::NotSeated | ActionError::GameFull => ErrorKind::NotFound,
            _ => ErrorKind::Validation,
        }
    }
}

impl From<PlacementError> for ActionError {
    fn from(err: PlacementError) -> Self {
        ActionError::InvalidPlacement(err)
    }
}

impl core::fmt::Display for ActionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ActionError::WrongPhase { action, phase } => {
                write!(f, "Action {} is not allowed while the game is {}", action, phase)
            }
            ActionError::NotYourTurn => write!(f, "Not your turn"),
            ActionError::InvalidPlacement(e) => write!(f, "Invalid ship placement: {}", e),
            ActionError::InvalidCoordinates { row, col } => {
                write!(f, "Invalid move: ({}, {}) is outside the board", row, col)
            }
            ActionError::AlreadyTargeted { row, col } => {
                write!(f, "Cell ({}, {}) has already been targeted", row, col)
            }
            ActionError::AlreadyReady => write!(f, "Player is already ready"),
            ActionError::NotSeated => write!(f, "Player is not part of this game"),
            ActionError::GameFull => write!(f, "Game already has two players"),
            ActionError::FleetPlacementFailed => write!(f, "Unable to place fleet"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PlacementError {}

#[cfg(feature = "std")]
impl std::error::Error for ActionError {}
