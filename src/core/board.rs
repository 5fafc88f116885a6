//! Square game board and cell-state semantics.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

/// State of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "std",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Cell {
    #[default]
    Empty,
    Ship,
    Hit,
    Miss,
}

impl Cell {
    /// Whether `self -> next` is one of the three legal transitions:
    /// `empty -> ship`, `empty -> miss`, `ship -> hit`.
    pub fn can_become(self, next: Cell) -> bool {
        matches!(
            (self, next),
            (Cell::Empty, Cell::Ship) | (Cell::Empty, Cell::Miss) | (Cell::Ship, Cell::Hit)
        )
    }

    /// The cell as the opponent is allowed to see it.
    pub fn redacted(self) -> Cell {
        match self {
            Cell::Ship => Cell::Empty,
            other => other,
        }
    }

    fn symbol(self) -> char {
        match self {
            Cell::Empty => '~',
            Cell::Ship => 'S',
            Cell::Hit => 'X',
            Cell::Miss => 'O',
        }
    }
}

/// A square grid owned by one player of one session.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Create an all-empty board of `size`×`size` cells.
    pub fn new(size: usize) -> Self {
        Board {
            size,
            cells: vec![Cell::Empty; size * size],
        }
    }

    /// Side length of the grid.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Map signed coordinates to a cell index, `None` when off the grid.
    pub fn index(&self, row: i32, col: i32) -> Option<usize> {
        let (r, c) = (usize::try_from(row).ok()?, usize::try_from(col).ok()?);
        (r < self.size && c < self.size).then(|| r * self.size + c)
    }

    /// Whether (`row`, `col`) lies within the grid.
    pub fn contains(&self, row: i32, col: i32) -> bool {
        self.index(row, col).is_some()
    }

    /// Cell at (`row`, `col`), `None` when off the grid.
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        self.index(row, col).and_then(|i| self.cells.get(i).copied())
    }

    /// Move the cell at `index` to `next`. Returns `false` and leaves the
    /// board untouched when the transition is not part of the cell lattice.
    pub(crate) fn transition(&mut self, index: usize, next: Cell) -> bool {
        match self.cells.get_mut(index) {
            Some(cell) if cell.can_become(next) => {
                *cell = next;
                true
            }
            _ => false,
        }
    }

    /// Number of cells currently in `state`.
    pub fn count(&self, state: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == state).count()
    }

    /// Owner's view: every row, ships included.
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        self.cells.chunks(self.size.max(1)).map(|r| r.to_vec()).collect()
    }

    /// Opponent's view: ship cells that have not been hit show as empty.
    pub fn redacted_rows(&self) -> Vec<Vec<Cell>> {
        self.cells
            .chunks(self.size.max(1))
            .map(|r| r.iter().map(|c| c.redacted()).collect())
            .collect()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {}x{} {{", self.size, self.size)?;
        for row in self.cells.chunks(self.size.max(1)) {
            f.write_str("  ")?;
            for cell in row {
                write!(f, "{}", cell.symbol())?;
            }
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}
