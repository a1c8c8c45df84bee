//! Game board representation and collision detection

use crate::piece::Piece;
use crate::tetromino::TetrominoType;

/// Standard board dimensions
pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 22;
/// Rows at the top of the grid that sit above the visible play field
pub const HIDDEN_ROWS: usize = 2;

/// A cell on the board - either empty or filled by a tetromino type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(TetrominoType),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Filled(_))
    }
}

/// The game board
///
/// Cells are stored row-major with row 0 at the top, so index = y * width + x.
#[derive(Debug, Clone)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BOARD_WIDTH, BOARD_HEIGHT)
    }
}

impl Board {
    /// Create a new empty board
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    /// Get the cell at (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Set a cell at (x, y)
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    /// True iff every cell of the piece is in bounds and empty
    pub fn can_place(&self, piece: &Piece) -> bool {
        piece
            .cells()
            .iter()
            .all(|p| matches!(self.get(p.x, p.y), Some(Cell::Empty)))
    }

    /// Write the piece into the grid.
    ///
    /// The caller must have checked `can_place` first; nothing is re-validated
    /// here and out-of-bounds cells are silently dropped.
    pub fn lock(&mut self, piece: &Piece) {
        for p in piece.cells() {
            self.set(p.x, p.y, Cell::Filled(piece.kind));
        }
    }

    fn is_row_full(&self, y: usize) -> bool {
        self.row(y).iter().all(Cell::is_filled)
    }

    fn row(&self, y: usize) -> &[Cell] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    /// Indices of completely filled rows, ascending
    pub fn full_rows(&self) -> Vec<usize> {
        (0..self.height).filter(|&y| self.is_row_full(y)).collect()
    }

    /// Remove full rows, shift everything above them down and return the number removed
    pub fn clear_lines(&mut self) -> usize {
        let mut cleared = 0;
        let mut write_row = self.height;

        // Walk bottom-up, copying kept rows to the lowest free slot
        for read_row in (0..self.height).rev() {
            if self.is_row_full(read_row) {
                cleared += 1;
                continue;
            }
            write_row -= 1;
            if write_row != read_row {
                let (dst, src) = (write_row * self.width, read_row * self.width);
                self.cells.copy_within(src..src + self.width, dst);
            }
        }

        // Fill the top with empty rows
        self.cells[..write_row * self.width].fill(Cell::Empty);

        cleared
    }

    /// Flattened copy of the grid, row-major
    pub fn snapshot(&self) -> Vec<Cell> {
        self.cells.clone()
    }

    /// Reset every cell to empty
    pub fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
    }

    /// Check if the board is completely empty
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }
}
