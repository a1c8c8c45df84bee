//! Active falling piece value type

use crate::tetromino::{Point, TetrominoType};

/// A tetromino placed somewhere on (or above) the board.
///
/// Pieces are plain values: moving or rotating returns a new `Piece` and
/// leaves the original untouched, so a candidate can be tested against the
/// board before it replaces the active piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    /// The type of tetromino
    pub kind: TetrominoType,
    /// Rotation state, always in 0..4
    pub rotation: u8,
    /// Origin the shape offsets are relative to
    pub origin: Point,
}

impl Piece {
    pub fn new(kind: TetrominoType, rotation: u8, origin: Point) -> Self {
        Self {
            kind,
            rotation: rotation % 4,
            origin,
        }
    }

    /// A piece in its spawn state at the spawn origin for a board of `width`
    pub fn spawn(kind: TetrominoType, width: usize) -> Self {
        Self::new(kind, 0, Point::new(width as i32 / 2, 0))
    }

    /// Absolute board coordinates of all 4 blocks
    pub fn cells(&self) -> [Point; 4] {
        self.kind.shape(self.rotation).map(|offset| self.origin + offset)
    }

    /// Same piece with rotation advanced by `delta` quarter turns (negative is counter-clockwise)
    pub fn rotated(&self, delta: i32) -> Self {
        Self {
            rotation: (self.rotation as i32 + delta).rem_euclid(4) as u8,
            ..*self
        }
    }

    /// Same piece with the origin translated by (dx, dy)
    pub fn moved(&self, dx: i32, dy: i32) -> Self {
        Self {
            origin: self.origin.offset(dx, dy),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_position() {
        let piece = Piece::spawn(TetrominoType::T, 10);
        assert_eq!(piece.origin, Point::new(5, 0));
        assert_eq!(piece.rotation, 0);
    }

    #[test]
    fn test_cells_are_translated_offsets() {
        let piece = Piece::new(TetrominoType::T, 0, Point::new(5, 3));
        assert_eq!(
            piece.cells(),
            [
                Point::new(5, 3),
                Point::new(4, 3),
                Point::new(6, 3),
                Point::new(5, 4)
            ]
        );
    }

    #[test]
    fn test_rotate_wraps_both_ways() {
        let piece = Piece::spawn(TetrominoType::J, 10);
        assert_eq!(piece.rotated(-1).rotation, 3);
        assert_eq!(piece.rotated(1).rotated(1).rotated(1).rotated(1), piece);
        assert_eq!(piece.rotated(6).rotation, 2);
    }

    #[test]
    fn test_move_leaves_original_untouched() {
        let piece = Piece::spawn(TetrominoType::S, 10);
        let moved = piece.moved(-1, 2);
        assert_eq!(piece.origin, Point::new(5, 0));
        assert_eq!(moved.origin, Point::new(4, 2));
        assert_eq!(moved.kind, piece.kind);
        assert_eq!(moved.rotation, piece.rotation);
    }
}
