//! Ship definitions and placement requests.

use core::fmt;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "std",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Row and column step from one footprint cell to the next.
    pub fn step(self) -> (i32, i32) {
        match self {
            Orientation::Horizontal => (0, 1),
            Orientation::Vertical => (1, 0),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => write!(f, "horizontal"),
            Orientation::Vertical => write!(f, "vertical"),
        }
    }
}

/// Type of ship: name and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipDef {
    name: &'static str,
    length: usize,
}

impl ShipDef {
    /// Create a new ship definition.
    pub const fn new(name: &'static str, length: usize) -> Self {
        Self { name, length }
    }

    /// Ship's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ship's length.
    pub fn length(&self) -> usize {
        self.length
    }
}

/// A request to put a ship of `length` cells at (`row`, `col`).
///
/// Coordinates are signed so that requests pointing off the grid can be
/// rejected by the validator instead of failing to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub row: i32,
    pub col: i32,
    pub length: i32,
    pub orientation: Orientation,
}

impl Placement {
    pub fn new(row: i32, col: i32, length: i32, orientation: Orientation) -> Self {
        Self {
            row,
            col,
            length,
            orientation,
        }
    }

    /// Cells covered by the ship, origin first. Empty for non-positive lengths.
    pub fn footprint(&self) -> impl Iterator<Item = (i32, i32)> {
        let (dr, dc) = self.orientation.step();
        let (row, col) = (self.row, self.col);
        (0..self.length.max(0)).map(move |i| {
            (
                row.saturating_add(dr.saturating_mul(i)),
                col.saturating_add(dc.saturating_mul(i)),
            )
        })
    }
}
