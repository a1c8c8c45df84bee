//! BLOCKFALL - a falling-block puzzle engine
//!
//! The engine is a deterministic state machine with its own virtual clock.
//! [`runtime`] runs it on a tokio task for real-time play; front ends only
//! send [`Command`]s and render the published [`GameState`].

pub mod bag;
pub mod board;
pub mod engine;
pub mod highscore;
pub mod piece;
pub mod runtime;
pub mod scheduler;
pub mod score;
pub mod settings;
pub mod snapshot;
pub mod tetromino;

pub use board::Cell;
pub use engine::{Command, Engine, EngineConfig};
pub use highscore::{FileHighScores, HighScoreStore, MemoryHighScores};
pub use piece::Piece;
pub use runtime::EngineHandle;
pub use settings::Settings;
pub use snapshot::{GameState, Phase};
pub use tetromino::{Point, TetrominoType};
