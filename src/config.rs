use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, GameError};
use crate::skin::{AppleSkinKind, SnakeSkinKind};
use crate::snake::Position;

const APP_DIR_NAME: &str = "gridsnake";
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Default board width in cells.
pub const DEFAULT_BOARD_WIDTH: u16 = 30;

/// Default board height in cells.
pub const DEFAULT_BOARD_HEIGHT: u16 = 15;

/// Default number of apples kept on the board.
pub const DEFAULT_APPLE_COUNT: usize = 5;

/// Default tick interval in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Shortest tick interval accepted from settings or flags.
pub const MIN_TICK_INTERVAL_MS: u64 = 16;

/// Upper bound on ticks run back-to-back after a stalled frame.
pub const MAX_CATCH_UP_TICKS: u32 = 4;

/// Maximum number of directions waiting in the input buffer.
pub const INPUT_BUFFER_CAPACITY: usize = 3;

/// Logical board dimensions, fixed for the lifetime of an engine.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct BoardSize {
    width: u16,
    height: u16,
}

impl BoardSize {
    /// Creates a board size, rejecting zero dimensions.
    pub fn new(width: u16, height: u16) -> Result<Self, GameError> {
        if width == 0 || height == 0 {
            return Err(GameError::InvalidBoardSize {
                width: f64::from(width),
                height: f64::from(height),
            });
        }

        Ok(Self { width, height })
    }

    /// Creates a board size from loosely typed dimensions, rounding each one.
    pub fn from_rounded(width: f64, height: f64) -> Result<Self, GameError> {
        let invalid = || GameError::InvalidBoardSize { width, height };

        let w = round_dimension(width).ok_or_else(invalid)?;
        let h = round_dimension(height).ok_or_else(invalid)?;
        Ok(Self { width: w, height: h })
    }

    #[must_use]
    pub fn width(self) -> u16 {
        self.width
    }

    #[must_use]
    pub fn height(self) -> u16 {
        self.height
    }

    /// Returns the total number of cells on the board.
    #[must_use]
    pub fn total_cells(self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    /// Returns true when the position lies inside `[0,width) x [0,height)`.
    #[must_use]
    pub fn contains(self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < i32::from(self.width)
            && position.y < i32::from(self.height)
    }

    /// Returns the rounded-down center cell.
    #[must_use]
    pub fn center(self) -> Position {
        Position::new(i32::from(self.width / 2), i32::from(self.height / 2))
    }
}

impl Default for BoardSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_BOARD_WIDTH,
            height: DEFAULT_BOARD_HEIGHT,
        }
    }
}

impl fmt::Display for BoardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for BoardSize {
    type Err = GameError;

    /// Parses `"WxH"`, e.g. `"30x15"`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || GameError::InvalidBoardSize {
            width: f64::NAN,
            height: f64::NAN,
        };

        let (width, height) = raw
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let width: f64 = width.trim().parse().map_err(|_| invalid())?;
        let height: f64 = height.trim().parse().map_err(|_| invalid())?;

        Self::from_rounded(width, height)
    }
}

/// Rounds half-way values towards positive infinity.
pub(crate) fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn round_dimension(value: f64) -> Option<u16> {
    if !value.is_finite() {
        return None;
    }

    let rounded = round_half_up(value);
    if rounded < 1.0 || rounded > f64::from(u16::MAX) {
        return None;
    }

    Some(rounded as u16)
}

/// Parses an apple count, accepting only finite non-negative integers.
pub fn parse_apple_count(raw: &str) -> Result<usize, GameError> {
    let invalid = || GameError::InvalidAppleCount(raw.to_owned());

    let raw_trimmed = raw.trim();
    if let Ok(count) = raw_trimmed.parse::<usize>() {
        return Ok(count);
    }

    // Whole floats such as "3.0"; anything past usize is not representable.
    let value: f64 = raw_trimmed.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value >= usize::MAX as f64 {
        return Err(invalid());
    }

    Ok(value as usize)
}

/// User settings read from `settings.json`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub board_width: u16,
    pub board_height: u16,
    pub apples: usize,
    pub tick_ms: u64,
    pub snake_skin: SnakeSkinKind,
    pub apple_skin: AppleSkinKind,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            board_width: DEFAULT_BOARD_WIDTH,
            board_height: DEFAULT_BOARD_HEIGHT,
            apples: DEFAULT_APPLE_COUNT,
            tick_ms: DEFAULT_TICK_INTERVAL_MS,
            snake_skin: SnakeSkinKind::default(),
            apple_skin: AppleSkinKind::default(),
        }
    }
}

impl Settings {
    /// Returns the validated board size described by these settings.
    pub fn board(&self) -> Result<BoardSize, GameError> {
        BoardSize::new(self.board_width, self.board_height)
    }

    /// Returns the tick interval, clamped to the supported minimum.
    #[must_use]
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_ms.max(MIN_TICK_INTERVAL_MS)
    }
}

/// Returns the platform-correct settings file path.
#[must_use]
pub fn settings_path() -> PathBuf {
    let mut base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push(APP_DIR_NAME);
    base.push(SETTINGS_FILE_NAME);
    base
}

/// Loads settings from `path`.
///
/// Returns defaults when the file does not exist. A file that exists but
/// cannot be read or parsed is an error, so the caller can report it before
/// entering raw terminal mode.
pub fn load_settings(path: &Path) -> Result<Settings, AppError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Settings::default()),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&raw).map_err(|source| AppError::Settings {
        path: path.to_path_buf(),
        source,
    })
}
