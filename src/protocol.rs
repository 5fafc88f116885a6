//! JSON records exchanged with clients.
//!
//! Every record is a single JSON object carrying an `action` field. The
//! first record on a connection is a handshake (`create_game` or
//! `join_game`); after that the client sends game [`Action`]s and the
//! server answers with [`ServerMessage`]s.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::{
    Cell, ErrorKind, GameId, GameView, MoveOutcome, Orientation, Phase, PlayerId, ShotOutcome,
};

pub const PROTOCOL_VERSION: u32 = 1;

/// Errors raised while decoding an inbound record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The record is not valid JSON or does not fit the named action.
    Malformed { action: String, reason: String },
    /// The `action` field names nothing this server understands.
    UnknownAction(String),
    /// The client speaks a different protocol version.
    VersionMismatch { expected: u32, got: u32 },
}

impl ProtocolError {
    /// Action name to report the error under.
    pub fn action(&self) -> &str {
        match self {
            ProtocolError::Malformed { action, .. } => action,
            ProtocolError::UnknownAction(action) => action,
            ProtocolError::VersionMismatch { .. } => "handshake",
        }
    }
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::Malformed { action, reason } => {
                write!(f, "Malformed {} message: {}", action, reason)
            }
            ProtocolError::UnknownAction(action) => write!(f, "Unknown action: {}", action),
            ProtocolError::VersionMismatch { expected, got } => write!(
                f,
                "Protocol version mismatch: expected {}, got {}",
                expected, got
            ),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Decode `record` into `T`, first checking that its `action` is one of `names`.
fn parse_tagged<T: DeserializeOwned>(record: &str, names: &[&str]) -> Result<T, ProtocolError> {
    let value: serde_json::Value =
        serde_json::from_str(record).map_err(|e| ProtocolError::Malformed {
            action: "unknown".to_string(),
            reason: e.to_string(),
        })?;
    let action = match value.get("action") {
        Some(serde_json::Value::String(name)) => name.clone(),
        _ => {
            return Err(ProtocolError::Malformed {
                action: "unknown".to_string(),
                reason: "missing action field".to_string(),
            })
        }
    };
    if !names.contains(&action.as_str()) {
        return Err(ProtocolError::UnknownAction(action));
    }
    serde_json::from_value(value).map_err(|e| ProtocolError::Malformed {
        action,
        reason: e.to_string(),
    })
}

/// First record on every connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Hello {
    /// Open a new game with the sender as first player.
    CreateGame {
        player_id: PlayerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<u32>,
    },
    /// Take the free seat of an existing game, or resume a held seat.
    JoinGame {
        game_id: GameId,
        player_id: PlayerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<u32>,
    },
}

impl Hello {
    pub const NAMES: [&'static str; 2] = ["create_game", "join_game"];

    pub fn parse(record: &str) -> Result<Hello, ProtocolError> {
        let hello: Hello = parse_tagged(record, &Self::NAMES)?;
        match hello.version() {
            Some(got) if got != PROTOCOL_VERSION => Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                got,
            }),
            _ => Ok(hello),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Hello::CreateGame { .. } => "create_game",
            Hello::JoinGame { .. } => "join_game",
        }
    }

    pub fn player_id(&self) -> PlayerId {
        match self {
            Hello::CreateGame { player_id, .. } | Hello::JoinGame { player_id, .. } => *player_id,
        }
    }

    fn version(&self) -> Option<u32> {
        match self {
            Hello::CreateGame { version, .. } | Hello::JoinGame { version, .. } => *version,
        }
    }
}

/// Game actions sent by a seated player. `x` is the row, `y` the column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    PlaceShip {
        x: i32,
        y: i32,
        size: i32,
        orientation: Orientation,
    },
    AutoPlace,
    Ready,
    MakeMove {
        x: i32,
        y: i32,
    },
    GetState,
}

impl Action {
    pub const NAMES: [&'static str; 5] =
        ["place_ship", "auto_place", "ready", "make_move", "get_state"];

    pub fn parse(record: &str) -> Result<Action, ProtocolError> {
        parse_tagged(record, &Self::NAMES)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::PlaceShip { .. } => "place_ship",
            Action::AutoPlace => "auto_place",
            Action::Ready => "ready",
            Action::MakeMove { .. } => "make_move",
            Action::GetState => "get_state",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Row/column pair echoed back in `move_result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Target {
    pub x: i32,
    pub y: i32,
}

/// Action-specific fields of an outbound record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Error {
        message: String,
        kind: &'static str,
    },
    Connected {
        game_id: GameId,
        player_id: PlayerId,
        game_status: Phase,
    },
    Board {
        board: Vec<Vec<Cell>>,
        game_status: Phase,
    },
    PlayerReady {
        player_id: PlayerId,
        game_status: Phase,
    },
    MoveResult {
        result: ShotOutcome,
        game_status: Phase,
        winner: Option<PlayerId>,
        #[serde(rename = "move")]
        target: Target,
        player: PlayerId,
        turn: Option<PlayerId>,
    },
    Timeout {
        player: PlayerId,
        turn: PlayerId,
        game_status: Phase,
    },
    Presence {
        player_id: PlayerId,
    },
    GameState(GameView),
}

/// `{status, action, ...payload}` record sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerMessage {
    pub status: Status,
    pub action: String,
    #[serde(flatten)]
    pub payload: Payload,
}

impl ServerMessage {
    pub fn success(action: impl Into<String>, payload: Payload) -> Self {
        Self {
            status: Status::Success,
            action: action.into(),
            payload,
        }
    }

    pub fn error(action: impl Into<String>, message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            status: Status::Error,
            action: action.into(),
            payload: Payload::Error {
                message: message.into(),
                kind: kind.as_str(),
            },
        }
    }

    pub fn connected(action: &str, game_id: GameId, player_id: PlayerId, phase: Phase) -> Self {
        Self::success(
            action,
            Payload::Connected {
                game_id,
                player_id,
                game_status: phase,
            },
        )
    }

    pub fn board(action: &str, board: Vec<Vec<Cell>>, phase: Phase) -> Self {
        Self::success(
            action,
            Payload::Board {
                board,
                game_status: phase,
            },
        )
    }

    pub fn game_state(view: GameView) -> Self {
        Self::success("game_state", Payload::GameState(view))
    }

    pub fn player_ready(action: &str, player_id: PlayerId, phase: Phase) -> Self {
        Self::success(
            action,
            Payload::PlayerReady {
                player_id,
                game_status: phase,
            },
        )
    }

    pub fn move_result(outcome: &MoveOutcome) -> Self {
        Self::success(
            "move_result",
            Payload::MoveResult {
                result: outcome.result,
                game_status: outcome.phase,
                winner: outcome.winner,
                target: Target {
                    x: outcome.row,
                    y: outcome.col,
                },
                player: outcome.player,
                turn: outcome.turn,
            },
        )
    }

    pub fn timeout(player: PlayerId, turn: PlayerId, phase: Phase) -> Self {
        Self::success(
            "timeout",
            Payload::Timeout {
                player,
                turn,
                game_status: phase,
            },
        )
    }

    pub fn player_joined(player_id: PlayerId) -> Self {
        Self::success("player_joined", Payload::Presence { player_id })
    }

    pub fn player_left(player_id: PlayerId) -> Self {
        Self::success("player_left", Payload::Presence { player_id })
    }

    /// Encode as a single-line JSON record.
    pub fn to_record(&self) -> anyhow::Result<String> {
        serde_json::to_string(self).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))
    }
}
