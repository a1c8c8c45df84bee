//! Immutable state snapshot published to renderers

use crate::board::Cell;
use crate::piece::Piece;
use crate::tetromino::{Point, TetrominoType};
use std::collections::BTreeSet;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Engine created, no run started yet
    #[default]
    Ready,
    Running,
    Paused,
    /// Terminal until the next start/restart
    GameOver,
}

/// Everything a renderer needs to draw one frame
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameState {
    /// Flattened board, row-major (index = y * width + x)
    pub board: Vec<Cell>,
    pub width: usize,
    pub height: usize,
    /// Rows at the top of the board that are above the visible field
    pub hidden_rows: usize,
    pub active: Option<Piece>,
    /// Where the active piece would land
    pub ghost: Vec<Point>,
    pub hold: Option<TetrominoType>,
    pub can_hold: bool,
    pub next_queue: Vec<TetrominoType>,
    pub score: u64,
    pub lines: u32,
    pub level: u32,
    pub phase: Phase,
    pub game_over: bool,
    pub paused: bool,
    /// Rows shown as flashing while a clear is pending
    pub flashing_rows: BTreeSet<usize>,
    pub high_score: u64,
    /// Set on game over when the run beat the previous best
    pub new_high_score: bool,
}

impl GameState {
    /// Cell at (x, y), None when out of bounds
    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.board.get(y * self.width + x).copied()
    }

    pub fn is_flashing(&self, y: usize) -> bool {
        self.flashing_rows.contains(&y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_lookup() {
        let mut state = GameState {
            board: vec![Cell::Empty; 6],
            width: 3,
            height: 2,
            ..Default::default()
        };
        state.board[4] = Cell::Filled(TetrominoType::O);
        assert_eq!(state.cell(1, 1), Some(Cell::Filled(TetrominoType::O)));
        assert_eq!(state.cell(3, 0), None);
        assert_eq!(state.cell(0, 2), None);
    }
}
