//! Authoritative phase and turn model for one game session.

use alloc::vec::Vec;
use core::fmt;
use rand::Rng;

use crate::core::{
    board::{Board, Cell},
    common::ActionError,
    config::SHIPS,
    placement::{place, place_fleet},
    resolver::{apply_shot, check_winner, ShotOutcome},
    ship::Placement,
};

pub type GameId = u64;
pub type PlayerId = u64;

/// Lifecycle phase of a session. Phases only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "std",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Phase {
    Waiting,
    Setup,
    Player1Ready,
    Player2Ready,
    InProgress,
    Finished,
}

impl Phase {
    /// Position in `[waiting, setup, *_ready, in_progress, finished]`.
    pub fn rank(self) -> u8 {
        match self {
            Phase::Waiting => 0,
            Phase::Setup => 1,
            Phase::Player1Ready | Phase::Player2Ready => 2,
            Phase::InProgress => 3,
            Phase::Finished => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Waiting => "waiting",
            Phase::Setup => "setup",
            Phase::Player1Ready => "player1_ready",
            Phase::Player2Ready => "player2_ready",
            Phase::InProgress => "in_progress",
            Phase::Finished => "finished",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two player slots of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }

    pub fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }
}

/// Result of a resolved move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub player: PlayerId,
    pub row: i32,
    pub col: i32,
    pub result: ShotOutcome,
    pub phase: Phase,
    pub winner: Option<PlayerId>,
    pub turn: Option<PlayerId>,
}

/// What one player is allowed to see of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GameView {
    pub game_id: GameId,
    pub game_status: Phase,
    pub player_id: PlayerId,
    pub opponent_id: Option<PlayerId>,
    pub turn: Option<PlayerId>,
    pub my_board: Vec<Vec<Cell>>,
    pub opponent_board: Vec<Vec<Cell>>,
    pub winner: Option<PlayerId>,
    pub is_my_turn: bool,
}

/// Two player slots, one board each, and the phase/turn bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GameSession {
    id: GameId,
    player1: PlayerId,
    player2: Option<PlayerId>,
    boards: [Board; 2],
    ready: [bool; 2],
    phase: Phase,
    turn: Option<PlayerId>,
    winner: Option<PlayerId>,
}

impl GameSession {
    /// A fresh session waiting for its second player.
    pub fn new(id: GameId, player1: PlayerId, board_size: usize) -> Self {
        Self {
            id,
            player1,
            player2: None,
            boards: [Board::new(board_size), Board::new(board_size)],
            ready: [false; 2],
            phase: Phase::Waiting,
            turn: None,
            winner: None,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn player1(&self) -> PlayerId {
        self.player1
    }

    pub fn player2(&self) -> Option<PlayerId> {
        self.player2
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turn(&self) -> Option<PlayerId> {
        self.turn
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn is_ready(&self, seat: Seat) -> bool {
        self.ready[seat.index()]
    }

    pub fn board(&self, seat: Seat) -> &Board {
        &self.boards[seat.index()]
    }

    /// Seat held by `player`, if any.
    pub fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        if player == self.player1 {
            Some(Seat::First)
        } else if self.player2 == Some(player) {
            Some(Seat::Second)
        } else {
            None
        }
    }

    pub fn player_at(&self, seat: Seat) -> Option<PlayerId> {
        match seat {
            Seat::First => Some(self.player1),
            Seat::Second => self.player2,
        }
    }

    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        self.seat_of(player).and_then(|s| self.player_at(s.other()))
    }

    fn seat(&self, player: PlayerId) -> Result<Seat, ActionError> {
        self.seat_of(player).ok_or(ActionError::NotSeated)
    }

    /// Seat `player`. Already-seated players resume without any change;
    /// a new player takes the free second seat and moves the session to
    /// `setup`.
    pub fn join(&mut self, player: PlayerId) -> Result<Seat, ActionError> {
        if let Some(seat) = self.seat_of(player) {
            return Ok(seat);
        }
        if self.player2.is_some() {
            return Err(ActionError::GameFull);
        }
        self.player2 = Some(player);
        if self.phase == Phase::Waiting {
            self.phase = Phase::Setup;
            self.turn = None;
        }
        Ok(Seat::Second)
    }

    /// Ships may only be placed before either player has signalled ready.
    fn check_setup(&self, action: &'static str) -> Result<(), ActionError> {
        if matches!(self.phase, Phase::Waiting | Phase::Setup) {
            Ok(())
        } else {
            Err(ActionError::WrongPhase {
                action,
                phase: self.phase,
            })
        }
    }

    /// Place one ship on `player`'s own board.
    pub fn place_ship(&mut self, player: PlayerId, placement: &Placement) -> Result<(), ActionError> {
        let seat = self.seat(player)?;
        self.check_setup("place_ship")?;
        place(&mut self.boards[seat.index()], placement)?;
        Ok(())
    }

    /// Replace `player`'s board with a randomly placed standard fleet.
    pub fn auto_place<R: Rng>(&mut self, player: PlayerId, rng: &mut R) -> Result<usize, ActionError> {
        let seat = self.seat(player)?;
        self.check_setup("auto_place")?;
        place_fleet(&mut self.boards[seat.index()], &SHIPS, rng)
    }

    /// Record that `player` finished setup. Once both players are ready
    /// combat starts with the first player owning the turn.
    pub fn ready(&mut self, player: PlayerId) -> Result<Phase, ActionError> {
        let seat = self.seat(player)?;
        match self.phase {
            Phase::Setup | Phase::Player1Ready | Phase::Player2Ready => {}
            phase => {
                return Err(ActionError::WrongPhase {
                    action: "ready",
                    phase,
                })
            }
        }
        if self.ready[seat.index()] {
            return Err(ActionError::AlreadyReady);
        }
        self.ready[seat.index()] = true;
        self.phase = if self.ready.iter().all(|&r| r) {
            self.turn = Some(self.player1);
            Phase::InProgress
        } else {
            match seat {
                Seat::First => Phase::Player1Ready,
                Seat::Second => Phase::Player2Ready,
            }
        };
        Ok(self.phase)
    }

    /// Fire at the opponent's board. A hit keeps the turn, a miss passes it,
    /// and sinking the last ship cell finishes the game with the mover as
    /// winner.
    pub fn make_move(&mut self, player: PlayerId, row: i32, col: i32) -> Result<MoveOutcome, ActionError> {
        let seat = self.seat(player)?;
        if self.phase != Phase::InProgress {
            return Err(ActionError::WrongPhase {
                action: "make_move",
                phase: self.phase,
            });
        }
        if self.turn != Some(player) {
            return Err(ActionError::NotYourTurn);
        }
        let target = &mut self.boards[seat.other().index()];
        let result = apply_shot(target, row, col);
        match result {
            ShotOutcome::Invalid => return Err(ActionError::InvalidCoordinates { row, col }),
            ShotOutcome::AlreadyHit => return Err(ActionError::AlreadyTargeted { row, col }),
            ShotOutcome::Hit => {
                if check_winner(target) {
                    self.phase = Phase::Finished;
                    self.winner = Some(player);
                }
            }
            ShotOutcome::Miss => {
                if check_winner(target) {
                    // Only reachable when the opponent never placed a ship.
                    self.phase = Phase::Finished;
                    self.winner = Some(player);
                } else {
                    self.turn = self.player_at(seat.other());
                }
            }
        }
        Ok(MoveOutcome {
            player,
            row,
            col,
            result,
            phase: self.phase,
            winner: self.winner,
            turn: self.turn,
        })
    }

    /// Pass the turn because its owner ran out of time. Returns the player
    /// who lost the turn and the player who now holds it.
    pub fn expire_turn(&mut self) -> Result<(PlayerId, PlayerId), ActionError> {
        if self.phase != Phase::InProgress {
            return Err(ActionError::WrongPhase {
                action: "timeout",
                phase: self.phase,
            });
        }
        let current = self.turn.ok_or(ActionError::NotYourTurn)?;
        let next = self.opponent_of(current).ok_or(ActionError::NotSeated)?;
        self.turn = Some(next);
        Ok((current, next))
    }

    /// Snapshot of the session as seen by `player`. The opponent's ships
    /// stay hidden until the game is finished.
    pub fn view_for(&self, player: PlayerId) -> Option<GameView> {
        let seat = self.seat_of(player)?;
        let own = &self.boards[seat.index()];
        let theirs = &self.boards[seat.other().index()];
        let opponent_board = if self.phase == Phase::Finished {
            theirs.rows()
        } else {
            theirs.redacted_rows()
        };
        Some(GameView {
            game_id: self.id,
            game_status: self.phase,
            player_id: player,
            opponent_id: self.player_at(seat.other()),
            turn: self.turn,
            my_board: own.rows(),
            opponent_board,
            winner: self.winner,
            is_my_turn: self.phase == Phase::InProgress && self.turn == Some(player),
        })
    }
}
