//! Ship placement validation and automatic fleet placement.
//!
//! Ships may not overlap and may not touch each other, diagonals included.

use crate::core::board::{Board, Cell};
use crate::core::common::{ActionError, PlacementError};
use crate::core::config::{MAX_FLEET_ATTEMPTS, MAX_SHIP_ATTEMPTS};
use crate::core::ship::{Orientation, Placement, ShipDef};
use rand::Rng;

const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Check every placement rule, reporting the first one that fails.
pub fn check_placement(board: &Board, placement: &Placement) -> Result<(), PlacementError> {
    if placement.length <= 0 || placement.length as usize > board.size() {
        return Err(PlacementError::InvalidLength);
    }
    if !placement.footprint().all(|(r, c)| board.contains(r, c)) {
        return Err(PlacementError::OutOfBounds);
    }
    if placement
        .footprint()
        .any(|(r, c)| board.get(r, c) != Some(Cell::Empty))
    {
        return Err(PlacementError::Occupied);
    }
    let touches = placement.footprint().any(|(r, c)| {
        NEIGHBOURS
            .iter()
            .any(|(dr, dc)| board.get(r + dr, c + dc) == Some(Cell::Ship))
    });
    if touches {
        return Err(PlacementError::Adjacent);
    }
    Ok(())
}

/// Whether `placement` may be put on `board`.
pub fn can_place(board: &Board, placement: &Placement) -> bool {
    check_placement(board, placement).is_ok()
}

/// Mark the footprint of `placement` as ship cells.
///
/// The placement is validated first; on error the board is left untouched.
pub fn place(board: &mut Board, placement: &Placement) -> Result<(), PlacementError> {
    check_placement(board, placement)?;
    for (r, c) in placement.footprint() {
        if let Some(i) = board.index(r, c) {
            board.transition(i, Cell::Ship);
        }
    }
    Ok(())
}

/// Pick a random placement for a ship of `length` that fits inside the grid.
fn random_candidate<R: Rng>(rng: &mut R, size: usize, length: usize) -> Option<Placement> {
    if length == 0 || length > size {
        return None;
    }
    let orientation = if rng.random() {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    };
    let (max_r, max_c) = match orientation {
        Orientation::Horizontal => (size - 1, size - length),
        Orientation::Vertical => (size - length, size - 1),
    };
    let r = rng.random_range(0..=max_r);
    let c = rng.random_range(0..=max_c);
    Some(Placement::new(r as i32, c as i32, length as i32, orientation))
}

/// Try to place every ship of `fleet` onto a fresh board of the same size.
fn try_fleet<R: Rng>(rng: &mut R, size: usize, fleet: &[ShipDef]) -> Option<Board> {
    let mut scratch = Board::new(size);
    'ships: for def in fleet {
        for _ in 0..MAX_SHIP_ATTEMPTS {
            let Some(candidate) = random_candidate(rng, size, def.length()) else {
                return None;
            };
            if place(&mut scratch, &candidate).is_ok() {
                continue 'ships;
            }
        }
        return None;
    }
    Some(scratch)
}

/// Replace `board` with a randomly placed `fleet`.
///
/// Each ship gets a bounded number of random attempts; if one ship runs out
/// the whole fleet is restarted from an empty board, up to a bounded number
/// of restarts. `board` is only replaced once a complete fleet has been
/// placed. Returns the number of fleet attempts used.
pub fn place_fleet<R: Rng>(
    board: &mut Board,
    fleet: &[ShipDef],
    rng: &mut R,
) -> Result<usize, ActionError> {
    for attempt in 1..=MAX_FLEET_ATTEMPTS {
        if let Some(placed) = try_fleet(rng, board.size(), fleet) {
            *board = placed;
            return Ok(attempt);
        }
    }
    Err(ActionError::FleetPlacementFailed)
}
