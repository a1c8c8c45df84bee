//! Tetromino definitions and shapes
//!
//! All 7 tetrominoes with a fixed 4-state shape table each. The tables are a
//! simplified rotation system: every state is a list of offsets from the
//! piece origin, with y growing downward (row 0 is the top of the board).

/// An integer (x, y) offset or absolute board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by (dx, dy)
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        self.offset(rhs.x, rhs.y)
    }
}

/// The 7 tetromino types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TetrominoType {
    I, // teal
    O, // yellow
    T, // purple
    S, // green
    Z, // red
    J, // blue
    L, // orange
}

const fn p(x: i32, y: i32) -> Point {
    Point::new(x, y)
}

type ShapeTable = [[Point; 4]; 4];

const I_SHAPES: ShapeTable = [
    [p(-2, 0), p(-1, 0), p(0, 0), p(1, 0)],
    [p(0, -1), p(0, 0), p(0, 1), p(0, 2)],
    [p(-2, 1), p(-1, 1), p(0, 1), p(1, 1)],
    [p(-1, -1), p(-1, 0), p(-1, 1), p(-1, 2)],
];

const O_SHAPES: ShapeTable = [[p(0, 0), p(1, 0), p(0, 1), p(1, 1)]; 4];

const T_SHAPES: ShapeTable = [
    [p(0, 0), p(-1, 0), p(1, 0), p(0, 1)],
    [p(0, 0), p(0, -1), p(0, 1), p(1, 0)],
    [p(0, 0), p(-1, 0), p(1, 0), p(0, -1)],
    [p(0, 0), p(0, -1), p(0, 1), p(-1, 0)],
];

// S and Z only have two distinct states; the table repeats them.
const S_SHAPES: ShapeTable = [
    [p(0, 0), p(1, 0), p(0, 1), p(-1, 1)],
    [p(0, 0), p(0, -1), p(1, 0), p(1, 1)],
    [p(0, 0), p(1, 0), p(0, 1), p(-1, 1)],
    [p(0, 0), p(0, -1), p(1, 0), p(1, 1)],
];

const Z_SHAPES: ShapeTable = [
    [p(0, 0), p(-1, 0), p(0, 1), p(1, 1)],
    [p(0, 0), p(0, 1), p(1, 0), p(1, -1)],
    [p(0, 0), p(-1, 0), p(0, 1), p(1, 1)],
    [p(0, 0), p(0, 1), p(1, 0), p(1, -1)],
];

const J_SHAPES: ShapeTable = [
    [p(0, 0), p(-1, 0), p(1, 0), p(-1, 1)],
    [p(0, 0), p(0, -1), p(0, 1), p(1, 1)],
    [p(0, 0), p(-1, 0), p(1, 0), p(1, -1)],
    [p(0, 0), p(0, -1), p(0, 1), p(-1, -1)],
];

const L_SHAPES: ShapeTable = [
    [p(0, 0), p(-1, 0), p(1, 0), p(1, 1)],
    [p(0, 0), p(0, -1), p(0, 1), p(1, -1)],
    [p(0, 0), p(-1, 0), p(1, 0), p(-1, -1)],
    [p(0, 0), p(0, -1), p(0, 1), p(-1, 1)],
];

impl TetrominoType {
    /// Display colour as (r, g, b), a muted palette
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            TetrominoType::I => (0x2C, 0xA6, 0xA6),
            TetrominoType::O => (0xD1, 0xC3, 0x3E),
            TetrominoType::T => (0x8B, 0x55, 0xB8),
            TetrominoType::S => (0x55, 0xB8, 0x55),
            TetrominoType::Z => (0xB8, 0x4C, 0x4C),
            TetrominoType::J => (0x4C, 0x5F, 0xC3),
            TetrominoType::L => (0xC2, 0x81, 0x3E),
        }
    }

    /// Get all tetromino types for bag randomization
    pub fn all() -> [TetrominoType; 7] {
        [
            TetrominoType::I,
            TetrominoType::O,
            TetrominoType::T,
            TetrominoType::S,
            TetrominoType::Z,
            TetrominoType::J,
            TetrominoType::L,
        ]
    }

    /// Get the 4 cell offsets for this tetromino at a rotation state (taken mod 4)
    pub fn shape(&self, rotation: u8) -> &'static [Point; 4] {
        let table = match self {
            TetrominoType::I => &I_SHAPES,
            TetrominoType::O => &O_SHAPES,
            TetrominoType::T => &T_SHAPES,
            TetrominoType::S => &S_SHAPES,
            TetrominoType::Z => &Z_SHAPES,
            TetrominoType::J => &J_SHAPES,
            TetrominoType::L => &L_SHAPES,
        };
        &table[(rotation % 4) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_state_has_four_distinct_cells() {
        for kind in TetrominoType::all() {
            for rotation in 0..4 {
                let cells: HashSet<_> = kind.shape(rotation).iter().collect();
                assert_eq!(cells.len(), 4, "{:?} rotation {}", kind, rotation);
            }
        }
    }

    #[test]
    fn test_rotation_wraps() {
        assert_eq!(TetrominoType::T.shape(5), TetrominoType::T.shape(1));
        assert_eq!(TetrominoType::L.shape(4), TetrominoType::L.shape(0));
    }

    #[test]
    fn test_o_piece_is_rotation_invariant() {
        let spawn = TetrominoType::O.shape(0);
        for rotation in 1..4 {
            assert_eq!(TetrominoType::O.shape(rotation), spawn);
        }
    }

    #[test]
    fn test_point_add() {
        assert_eq!(Point::new(4, 2) + Point::new(-1, 3), Point::new(3, 5));
    }
}
