// Ace pot widget: capped balance, reserve and the projected change.
//
// Current is green at the cap. The change arrow is green for an increase
// and red for a decrease.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use leaguedesk_core::pot::PotChange;
use leaguedesk_core::protocol::PotView;

use crate::tui::ViewState;

/// Render the pot display into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = match &state.pot {
        Some(pot) => build_pot_lines(pot),
        None => vec![Line::from(Span::styled(
            " Waiting for pot figures...",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Ace Pot"));
    frame.render_widget(paragraph, area);
}

/// Build the two pot lines.
pub fn build_pot_lines(pot: &PotView) -> Vec<Line<'static>> {
    let current_color = if pot.current >= pot.cap {
        Color::Green
    } else {
        Color::White
    };
    let (arrow, arrow_color) = change_indicator(pot.change);

    vec![
        Line::from(vec![
            Span::styled(" Current: ", Style::default().fg(Color::Gray)),
            Span::styled(
                pot.current.to_string(),
                Style::default()
                    .fg(current_color)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" / {}", pot.cap),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled("   Reserve: ", Style::default().fg(Color::Gray)),
            Span::styled(pot.reserve.to_string(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled(" Total:   ", Style::default().fg(Color::Gray)),
            Span::styled(pot.total.to_string(), Style::default().fg(Color::Cyan)),
            Span::styled(format!(" {}", arrow), Style::default().fg(arrow_color)),
            Span::styled("   Buy-ins: ", Style::default().fg(Color::Gray)),
            Span::styled(pot.buy_ins.to_string(), Style::default().fg(Color::White)),
        ]),
    ]
}

pub fn change_indicator(change: PotChange) -> (&'static str, Color) {
    match change {
        PotChange::Increase => ("▲", Color::Green),
        PotChange::Decrease => ("▼", Color::Red),
        PotChange::Unchanged => (" ", Color::Gray),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
