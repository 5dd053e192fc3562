use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Block;

use crate::config::BoardSize;
use crate::session::{Session, SessionState};
use crate::skin::{SnakePiece, Skins, piece_heading};
use crate::snake::Position;
use crate::ui::hud::{HudInfo, render_hud};
use crate::ui::menu::{render_game_over_menu, render_pause_menu};

const FIELD_BG: Color = Color::Rgb(0x50, 0x50, 0x50);

/// Renders the full frame from immutable session state.
pub fn render(frame: &mut Frame<'_>, session: &Session, skins: &Skins, hud_info: &HudInfo) {
    let area = frame.area();
    let play_area = render_hud(frame, area, session, hud_info);

    let engine = session.engine();
    let board = engine.board();
    let cell_width = skins.cell_width();

    let block = Block::bordered()
        .title(" snake ")
        .border_style(Style::new().fg(Color::White))
        .style(Style::new().bg(FIELD_BG));
    let board_area = board_rect(play_area, board, cell_width);
    let inner = block.inner(board_area);
    frame.render_widget(block, board_area);

    let buffer = frame.buffer_mut();
    render_apples(buffer, inner, session, skins);
    render_snake(buffer, inner, session, skins);

    if engine.lifecycle().is_dead() {
        let length = session
            .final_snapshot()
            .map_or(engine.length(), |snapshot| snapshot.length());
        render_game_over_menu(frame, play_area, engine.lifecycle(), length, session.best_length());
    } else if session.state() == SessionState::Paused {
        render_pause_menu(frame, play_area);
    }
}

fn render_apples(buffer: &mut Buffer, inner: Rect, session: &Session, skins: &Skins) {
    let engine = session.engine();
    for apple in engine.apples() {
        if let Some(cell) = logical_to_terminal(inner, engine.board(), skins.cell_width(), *apple) {
            skins.apple.draw_apple(buffer, cell);
        }
    }
}

fn render_snake(buffer: &mut Buffer, inner: Rect, session: &Session, skins: &Skins) {
    let engine = session.engine();
    let segments: Vec<Position> = engine.snake().segments().copied().collect();

    // Tail first so the head wins when a fatal head overlaps the body.
    for (index, segment) in segments.iter().enumerate().rev() {
        let Some(cell) = logical_to_terminal(inner, engine.board(), skins.cell_width(), *segment)
        else {
            continue;
        };

        let piece = SnakePiece::at(index, segments.len());
        let heading = piece_heading(&segments, index, engine.velocity());
        skins.snake.draw_piece(buffer, cell, heading, piece);
    }
}

/// Bordered board rectangle, centered in `area` and clipped to it.
fn board_rect(area: Rect, board: BoardSize, cell_width: u16) -> Rect {
    let width = board.width().saturating_mul(cell_width).saturating_add(2);
    let height = board.height().saturating_add(2);

    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height).intersection(area)
}

/// Maps a board cell to its terminal rectangle, if it is visible.
fn logical_to_terminal(
    inner: Rect,
    board: BoardSize,
    cell_width: u16,
    position: Position,
) -> Option<Rect> {
    if !board.contains(position) {
        return None;
    }

    let x_offset = u16::try_from(position.x).ok()?.checked_mul(cell_width)?;
    let y_offset = u16::try_from(position.y).ok()?;

    let x = inner.x.checked_add(x_offset)?;
    let y = inner.y.checked_add(y_offset)?;
    if x.saturating_add(cell_width) > inner.right() || y >= inner.bottom() {
        return None;
    }

    Some(Rect::new(x, y, cell_width, 1))
}
