//! Algebraic square names for board cells.
//!
//! Row 0 of the normalized board is rank 8 and column 0 is file `a`.
//! The convention only holds for the view produced by the mounting
//! correction in [`crate::mount`]; a rig that sees the board from
//! another side needs this mapping recalibrated as well.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grid::BOARD_CELLS;
use crate::types::{Cell, DiffError};

/// A board square such as `e4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Square {
    /// File index, `0` for `a` through `7` for `h`.
    file: u8,
    /// Rank number, `1..=8`.
    rank: u8,
}

/// Failure to parse a square name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid square {0:?}: expected a file a-h followed by a rank 1-8")]
pub struct ParseSquareError(String);

impl Square {
    /// The square for an on-board cell, or `None` when the cell lies
    /// outside the 8x8 grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_cell(cell: Cell) -> Option<Self> {
        if !cell.is_on_board() {
            return None;
        }
        Some(Self {
            file: cell.col as u8,
            rank: (BOARD_CELLS - cell.row) as u8,
        })
    }

    /// The grid cell this square occupies.
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn cell(self) -> Cell {
        Cell::new(BOARD_CELLS - self.rank as u32, self.file as u32)
    }

    /// File letter, `'a'..='h'`.
    #[must_use]
    pub const fn file(self) -> char {
        (b'a' + self.file) as char
    }

    /// Rank number, `1..=8`.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.rank
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank)
    }
}

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSquareError(s.to_owned());
        let &[file @ b'a'..=b'h', rank @ b'1'..=b'8'] = s.as_bytes() else {
            return Err(err());
        };
        Ok(Self {
            file: file - b'a',
            rank: rank - b'0',
        })
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

impl TryFrom<String> for Square {
    type Error = ParseSquareError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Name every cell, failing on the first one off the board.
///
/// # Errors
///
/// Returns [`DiffError::CellOutOfRange`] for a cell outside the 8x8 grid.
pub fn encode_cells(cells: &[Cell]) -> Result<Vec<Square>, DiffError> {
    cells
        .iter()
        .map(|&cell| Square::from_cell(cell).ok_or(DiffError::CellOutOfRange { cell }))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn name(row: u32, col: u32) -> String {
        Square::from_cell(Cell::new(row, col)).unwrap().to_string()
    }

    #[test]
    fn board_corners() {
        assert_eq!(name(0, 0), "a8");
        assert_eq!(name(7, 7), "h1");
        assert_eq!(name(0, 7), "h8");
        assert_eq!(name(7, 0), "a1");
    }

    #[test]
    fn interior_squares() {
        assert_eq!(name(1, 1), "b7");
        assert_eq!(name(4, 4), "e4");
        assert_eq!(name(6, 4), "e2");
    }

    #[test]
    fn off_board_cells_have_no_square() {
        assert!(Square::from_cell(Cell::new(8, 0)).is_none());
        assert!(Square::from_cell(Cell::new(0, 8)).is_none());
    }

    #[test]
    fn parse_and_cell_invert_from_cell() {
        for row in 0..8 {
            for col in 0..8 {
                let cell = Cell::new(row, col);
                let square = Square::from_cell(cell).unwrap();
                assert_eq!(square.cell(), cell);
                assert_eq!(square.to_string().parse::<Square>().unwrap(), square);
            }
        }
    }

    #[test]
    fn malformed_names_are_rejected() {
        for bad in ["", "e", "e9", "i4", "E4", "e40", "4e", "e0"] {
            assert!(bad.parse::<Square>().is_err(), "{bad:?} parsed");
        }
    }

    #[test]
    fn serializes_as_plain_string() {
        let square: Square = "g6".parse().unwrap();
        assert_eq!(serde_json::to_string(&square).unwrap(), "\"g6\"");
        let back: Square = serde_json::from_str("\"g6\"").unwrap();
        assert_eq!(back, square);
        assert!(serde_json::from_str::<Square>("\"z9\"").is_err());
    }

    #[test]
    fn encode_cells_reports_out_of_range() {
        let squares = encode_cells(&[Cell::new(4, 4), Cell::new(6, 4)]).unwrap();
        assert_eq!(squares.len(), 2);

        let err = encode_cells(&[Cell::new(4, 4), Cell::new(8, 1)]).unwrap_err();
        assert!(matches!(
            err,
            DiffError::CellOutOfRange { cell } if cell == Cell::new(8, 1)
        ));
    }
}
