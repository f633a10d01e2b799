// Recipients widget: ace pot recipient pickers, shown only while the pot
// is marked paid.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use leaguedesk_core::entry::FieldId;

use super::{field_style, field_text};
use crate::tui::{Target, ViewState};

/// Render the recipient section into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = recipient_lines(state);
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Ace Pot Recipients"));
    frame.render_widget(paragraph, area);
}

pub fn recipient_lines(state: &ViewState) -> Vec<Line<'static>> {
    if !state.recipients.visible {
        return vec![Line::from(Span::styled(
            " Ace pot not paid (Ctrl+P)",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let mut lines = Vec::new();
    for (idx, row) in state.recipients.rows.iter().enumerate() {
        let field = FieldId::recipient(*row);
        let view = state.fields.get(&field);
        let focused = state.focus == Some(Target::Field(field));
        lines.push(Line::from(vec![
            Span::styled(format!(" {}. ", idx + 1), Style::default().fg(Color::Gray)),
            Span::styled(field_text(state, field), field_style(view, focused)),
        ]));
        if let Some(error) = view.and_then(|v| v.error.clone()) {
            lines.push(Line::from(Span::styled(
                format!("    {}", error),
                Style::default().fg(Color::Red),
            )));
        }
    }
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
