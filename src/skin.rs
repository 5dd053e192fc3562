//! Pluggable visual skins for snake pieces and apples.
//!
//! A skin draws one board cell at a time into a ratatui [`Buffer`]. The
//! renderer hands it the terminal rectangle of the cell, the piece kind and a
//! heading, and the skin decides what goes there.

use clap::ValueEnum;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

use crate::snake::{Position, Velocity};

/// Which part of the body a cell belongs to.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SnakePiece {
    Head,
    Body,
    End,
}

impl SnakePiece {
    /// Classifies the segment at `index` of a body of `len` segments.
    #[must_use]
    pub fn at(index: usize, len: usize) -> Self {
        if index == 0 {
            Self::Head
        } else if index + 1 == len {
            Self::End
        } else {
            Self::Body
        }
    }
}

/// Orientation of one piece.
///
/// Heads and ends use the unit vector they travel along. Straight body
/// pieces do too, while corner pieces use the diagonal sum of the offsets to
/// both neighbours, e.g. `(1,1)` for a corner joining the right and lower
/// cells.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Heading {
    pub dx: i32,
    pub dy: i32,
}

impl Heading {
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

impl From<Velocity> for Heading {
    fn from(velocity: Velocity) -> Self {
        Self::new(velocity.x(), velocity.y())
    }
}

/// Computes the heading of the segment at `index`.
#[must_use]
pub fn piece_heading(segments: &[Position], index: usize, velocity: Velocity) -> Heading {
    let offset = |from: Position, to: Position| Heading::new(to.x - from.x, to.y - from.y);

    if index == 0 || index >= segments.len() {
        return velocity.into();
    }

    let current = segments[index];
    let toward_head = offset(current, segments[index - 1]);
    let Some(next) = segments.get(index + 1) else {
        return toward_head;
    };

    let toward_tail = offset(current, *next);
    if toward_head.dx == -toward_tail.dx && toward_head.dy == -toward_tail.dy {
        toward_head
    } else {
        Heading::new(
            toward_head.dx + toward_tail.dx,
            toward_head.dy + toward_tail.dy,
        )
    }
}

/// Descriptive metadata shared by every skin.
pub trait Skin {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn creator(&self) -> &'static str;

    /// Terminal columns one board cell needs with this skin.
    fn cell_width(&self) -> u16 {
        1
    }
}

pub trait SnakeSkin: Skin {
    fn draw_piece(&self, buf: &mut Buffer, cell: Rect, heading: Heading, piece: SnakePiece);
}

pub trait AppleSkin: Skin {
    fn draw_apple(&self, buf: &mut Buffer, cell: Rect);
}

/// Solid colored blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrototypeSnake;

impl Skin for PrototypeSnake {
    fn name(&self) -> &'static str {
        "Prototype"
    }

    fn description(&self) -> &'static str {
        "Solid colored blocks."
    }

    fn creator(&self) -> &'static str {
        "gridsnake"
    }
}

impl SnakeSkin for PrototypeSnake {
    fn draw_piece(&self, buf: &mut Buffer, cell: Rect, _heading: Heading, piece: SnakePiece) {
        let color = match piece {
            SnakePiece::Head => Color::Green,
            SnakePiece::Body | SnakePiece::End => Color::Rgb(0, 100, 0),
        };
        fill_cell(buf, cell, BLOCK, Style::new().fg(color));
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PrototypeApple;

impl Skin for PrototypeApple {
    fn name(&self) -> &'static str {
        "Prototype"
    }

    fn description(&self) -> &'static str {
        "Just going for a byte..."
    }

    fn creator(&self) -> &'static str {
        "gridsnake"
    }
}

impl AppleSkin for PrototypeApple {
    fn draw_apple(&self, buf: &mut Buffer, cell: Rect) {
        fill_cell(buf, cell, BLOCK, Style::new().fg(Color::Red));
    }
}

const BLOCK: &str = "█";
const EMOJI_HEAD: &str = "🐍";
const EMOJI_BODY: &str = "🟩";
const EMOJI_APPLE: &str = "🍎";

/// Emoji glyphs, two columns per cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmojiSnake;

impl Skin for EmojiSnake {
    fn name(&self) -> &'static str {
        "Emoji"
    }

    fn description(&self) -> &'static str {
        "Straight out of the console."
    }

    fn creator(&self) -> &'static str {
        "gridsnake"
    }

    fn cell_width(&self) -> u16 {
        widest(&[EMOJI_HEAD, EMOJI_BODY])
    }
}

impl SnakeSkin for EmojiSnake {
    fn draw_piece(&self, buf: &mut Buffer, cell: Rect, _heading: Heading, piece: SnakePiece) {
        let glyph = match piece {
            SnakePiece::Head => EMOJI_HEAD,
            SnakePiece::Body | SnakePiece::End => EMOJI_BODY,
        };
        fill_cell(buf, cell, glyph, Style::new());
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmojiApple;

impl Skin for EmojiApple {
    fn name(&self) -> &'static str {
        "Emoji"
    }

    fn description(&self) -> &'static str {
        "An actual apple."
    }

    fn creator(&self) -> &'static str {
        "gridsnake"
    }

    fn cell_width(&self) -> u16 {
        widest(&[EMOJI_APPLE])
    }
}

impl AppleSkin for EmojiApple {
    fn draw_apple(&self, buf: &mut Buffer, cell: Rect) {
        fill_cell(buf, cell, EMOJI_APPLE, Style::new());
    }
}

/// Box-drawing glyphs picked by heading, so corners and the head direction
/// show. Unknown headings draw a fallback glyph instead of failing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinesSnake;

const LINES_FALLBACK: &str = "?";

impl LinesSnake {
    fn glyph(heading: Heading, piece: SnakePiece) -> Option<&'static str> {
        let glyph = match (piece, heading.dx, heading.dy) {
            (SnakePiece::Head, 1, 0) => "▶",
            (SnakePiece::Head, -1, 0) => "◀",
            (SnakePiece::Head, 0, 1) => "▼",
            (SnakePiece::Head, 0, -1) => "▲",
            (SnakePiece::Body, 1 | -1, 0) => "═",
            (SnakePiece::Body, 0, 1 | -1) => "║",
            (SnakePiece::Body, 1, 1) => "╔",
            (SnakePiece::Body, -1, 1) => "╗",
            (SnakePiece::Body, 1, -1) => "╚",
            (SnakePiece::Body, -1, -1) => "╝",
            (SnakePiece::End, 1, 0) => "╺",
            (SnakePiece::End, -1, 0) => "╸",
            (SnakePiece::End, 0, 1) => "╻",
            (SnakePiece::End, 0, -1) => "╹",
            _ => return None,
        };
        Some(glyph)
    }
}

impl Skin for LinesSnake {
    fn name(&self) -> &'static str {
        "Lines"
    }

    fn description(&self) -> &'static str {
        "Every corner accounted for."
    }

    fn creator(&self) -> &'static str {
        "gridsnake"
    }
}

impl SnakeSkin for LinesSnake {
    fn draw_piece(&self, buf: &mut Buffer, cell: Rect, heading: Heading, piece: SnakePiece) {
        match Self::glyph(heading, piece) {
            Some(glyph) => {
                let mut style = Style::new().fg(Color::LightGreen);
                if piece == SnakePiece::Head {
                    style = style.add_modifier(Modifier::BOLD);
                }
                fill_cell(buf, cell, glyph, style);
            }
            None => fill_cell(buf, cell, LINES_FALLBACK, Style::new().fg(Color::Magenta)),
        }
    }
}

/// Snake skin choices, selected at setup time.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SnakeSkinKind {
    #[default]
    Prototype,
    Emoji,
    Lines,
}

impl SnakeSkinKind {
    #[must_use]
    pub fn build(self) -> Box<dyn SnakeSkin> {
        match self {
            Self::Prototype => Box::new(PrototypeSnake),
            Self::Emoji => Box::new(EmojiSnake),
            Self::Lines => Box::new(LinesSnake),
        }
    }
}

/// Apple skin choices, selected at setup time.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AppleSkinKind {
    #[default]
    Prototype,
    Emoji,
}

impl AppleSkinKind {
    #[must_use]
    pub fn build(self) -> Box<dyn AppleSkin> {
        match self {
            Self::Prototype => Box::new(PrototypeApple),
            Self::Emoji => Box::new(EmojiApple),
        }
    }
}

/// The pair of skins in use by the renderer.
pub struct Skins {
    pub snake: Box<dyn SnakeSkin>,
    pub apple: Box<dyn AppleSkin>,
}

impl Skins {
    #[must_use]
    pub fn new(snake: SnakeSkinKind, apple: AppleSkinKind) -> Self {
        Self {
            snake: snake.build(),
            apple: apple.build(),
        }
    }

    /// Terminal columns per board cell, wide enough for both skins.
    #[must_use]
    pub fn cell_width(&self) -> u16 {
        self.snake.cell_width().max(self.apple.cell_width()).max(1)
    }
}

fn widest(glyphs: &[&str]) -> u16 {
    glyphs
        .iter()
        .map(|glyph| u16::try_from(glyph.width()).unwrap_or(u16::MAX))
        .max()
        .unwrap_or(1)
}

/// Fills `cell` with as many copies of `glyph` as fit.
fn fill_cell(buf: &mut Buffer, cell: Rect, glyph: &str, style: Style) {
    let glyph_width = u16::try_from(glyph.width()).unwrap_or(u16::MAX);
    if glyph_width == 0 || glyph_width > cell.width {
        return;
    }

    let copies = usize::from(cell.width / glyph_width);
    buf.set_string(cell.x, cell.y, glyph.repeat(copies), style);
}
