//! The board engine: gravity placement, fullness, win detection.

use super::types::{Cell, Player};
use crate::error::MoveError;

/// Number of rows. Row 0 is the top, row 5 the bottom.
pub const ROWS: usize = 6;
/// Number of columns.
pub const COLS: usize = 7;

/// The four scan orientations: horizontal, vertical, diagonal down-right,
/// diagonal down-left.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// 6x7 grid stored row-major in a flat array.
///
/// The board is the sole owner of its cells; nothing outside this type
/// mutates them, and placement always fills the lowest empty cell of a
/// column, so a cell above an empty cell in the same column is always empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [Cell; ROWS * COLS],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; ROWS * COLS],
        }
    }

    /// Bounds-checked cell accessor.
    pub fn cell(&self, row: usize, column: usize) -> Option<Cell> {
        if row < ROWS && column < COLS {
            Some(self.cells[row * COLS + column])
        } else {
            None
        }
    }

    /// Drops a piece into `column`, filling the lowest empty cell, and
    /// returns the row it landed in.
    ///
    /// # Errors
    ///
    /// `InvalidColumn` if the column is out of range, `ColumnFull` if it
    /// already holds six pieces. The board is unchanged on error.
    pub fn drop_piece(&mut self, column: usize, player: Player) -> Result<usize, MoveError> {
        if column >= COLS {
            return Err(MoveError::InvalidColumn { column });
        }
        for row in (0..ROWS).rev() {
            if self.cells[row * COLS + column] == Cell::Empty {
                self.cells[row * COLS + column] = Cell::Occupied(player);
                return Ok(row);
            }
        }
        Err(MoveError::ColumnFull { column })
    }

    /// True iff the top cell of `column` is occupied.
    ///
    /// Out-of-range columns report not-full rather than an error; draw
    /// detection only ever asks about real columns.
    pub fn is_column_full(&self, column: usize) -> bool {
        if column >= COLS {
            return false;
        }
        self.cells[column] != Cell::Empty
    }

    /// True iff every column is full.
    pub fn is_full(&self) -> bool {
        (0..COLS).all(|column| self.is_column_full(column))
    }

    /// Scans the grid for four consecutive `player` cells along any of the
    /// four orientations. Lines that would leave the grid are skipped.
    pub fn check_win(&self, player: Player) -> bool {
        for row in 0..ROWS {
            for column in 0..COLS {
                for (dr, dc) in DIRECTIONS {
                    if self.line_matches(row, column, dr, dc, player) {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn line_matches(
        &self,
        row: usize,
        column: usize,
        dr: isize,
        dc: isize,
        player: Player,
    ) -> bool {
        let end_row = row as isize + 3 * dr;
        let end_col = column as isize + 3 * dc;
        if end_row < 0 || end_row >= ROWS as isize || end_col < 0 || end_col >= COLS as isize {
            return false;
        }
        (0..4).all(|i| {
            let r = (row as isize + i * dr) as usize;
            let c = (column as isize + i * dc) as usize;
            self.cells[r * COLS + c] == Cell::Occupied(player)
        })
    }

    /// Sets every cell to empty. Idempotent.
    pub fn reset(&mut self) {
        self.cells = [Cell::Empty; ROWS * COLS];
    }

    /// Formats the grid as text, one row per line, top row first.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in 0..ROWS {
            for column in 0..COLS {
                let symbol = match self.cells[row * COLS + column] {
                    Cell::Empty => '.',
                    Cell::Occupied(Player::Red) => 'R',
                    Cell::Occupied(Player::Yellow) => 'Y',
                };
                out.push(symbol);
                if column < COLS - 1 {
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
