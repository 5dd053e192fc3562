use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the game engine and its input validation.
///
/// Construction errors mean no engine was created. `InvalidDirection` fails a
/// single tick and leaves the engine untouched.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GameError {
    #[error("invalid board size {width}x{height}: both dimensions must be integers >= 1")]
    InvalidBoardSize { width: f64, height: f64 },

    #[error("invalid apple count {0:?}: expected a non-negative integer")]
    InvalidAppleCount(String),

    #[error("board {width}x{height} has no room for {apples} apple(s)")]
    BoardTooSmall { width: u16, height: u16, apples: usize },

    #[error("invalid direction ({x}, {y}): expected zero or one unit axis vector")]
    InvalidDirection { x: f64, y: f64 },

    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}

/// Top-level error for the terminal binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("malformed settings file {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
