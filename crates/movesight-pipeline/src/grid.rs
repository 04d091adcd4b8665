//! Map region centroids onto the 8x8 board grid.

use crate::types::{Cell, Dimensions};

/// Number of files and ranks on the board.
pub const BOARD_CELLS: u32 = 8;

/// Cell containing `centroid` on a normalized board of `board` size.
///
/// Cell width and height are `width / 8` and `height / 8` (integer
/// division). Coordinates are not clamped: a centroid past the last
/// column or row yields a cell with `row` or `col` of 8 or more, which
/// [`Cell::is_on_board`] reports.
#[must_use]
pub fn cell_for(centroid: (u32, u32), board: Dimensions) -> Cell {
    let cell_width = (board.width / BOARD_CELLS).max(1);
    let cell_height = (board.height / BOARD_CELLS).max(1);
    let (cx, cy) = centroid;
    Cell::new(cy / cell_height, cx / cell_width)
}
