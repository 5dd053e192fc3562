use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::engine::Lifecycle;
use crate::session::{Session, SessionState};

/// Per-frame values the HUD cannot read from the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct HudInfo {
    /// Time spent producing the previous frame.
    pub frame_time: Duration,
}

/// Renders the status line (plus the debug line when enabled) and returns
/// the remaining play area above it.
#[must_use]
pub fn render_hud(frame: &mut Frame<'_>, area: Rect, session: &Session, info: &HudInfo) -> Rect {
    let debug_height = u16::from(session.is_debug());
    let [play_area, status_area, debug_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(debug_height),
    ])
    .areas(area);

    frame.render_widget(
        Paragraph::new(status_line(session))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray)),
        status_area,
    );

    if session.is_debug() {
        frame.render_widget(
            Paragraph::new(Line::from(debug_line(session, info)))
                .alignment(Alignment::Left)
                .style(Style::default().fg(Color::DarkGray)),
            debug_area,
        );
    }

    play_area
}

fn status_line(session: &Session) -> Line<'static> {
    let engine = session.engine();
    let state = match (session.state(), engine.lifecycle()) {
        (_, Lifecycle::DeadByBody | Lifecycle::DeadByOutOfBounds) => "dead",
        (SessionState::Paused, _) => "paused",
        _ => "running",
    };

    Line::from(vec![
        Span::raw("Length "),
        Span::styled(
            engine.length().to_string(),
            Style::default().fg(Color::White),
        ),
        Span::raw("  Best "),
        Span::styled(
            session.best_length().to_string(),
            Style::default().fg(Color::White),
        ),
        Span::raw("  Apples "),
        Span::styled(
            engine.apples().len().to_string(),
            Style::default().fg(Color::Red),
        ),
        Span::raw(format!("  {}  {state}", engine.board())),
    ])
}

fn debug_line(session: &Session, info: &HudInfo) -> String {
    let engine = session.engine();
    format!(
        "Debug (= to hide)  ticks {}  queued {}  velocity ({},{})  frame {:.2}ms",
        engine.tick_count(),
        session.pending_inputs(),
        engine.velocity().x(),
        engine.velocity().y(),
        info.frame_time.as_secs_f64() * 1000.0,
    )
}
