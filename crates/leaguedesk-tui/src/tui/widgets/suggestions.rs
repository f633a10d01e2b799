// Suggestions widget: the open list of the focused picker.
//
// The matched part of each name is underlined; the highlighted entry is
// drawn reversed. An empty open list shows the field's hint instead.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use leaguedesk_core::protocol::FieldView;

use crate::tui::ViewState;

/// Render the suggestion list into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = match state.focused_view() {
        Some(view) if view.open => suggestion_lines(view),
        _ => Vec::new(),
    };
    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Suggestions"));
    frame.render_widget(paragraph, area);
}

/// One line per suggestion, or the hint when there are none.
pub fn suggestion_lines(view: &FieldView) -> Vec<Line<'static>> {
    if view.suggestions.is_empty() {
        return view
            .hint
            .iter()
            .map(|hint| {
                Line::from(Span::styled(
                    format!(" {}", hint),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ))
            })
            .collect();
    }

    view.suggestions
        .iter()
        .enumerate()
        .map(|(idx, result)| {
            let base = if view.highlighted == Some(idx) {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            let (before, matched, after) = result.segments();
            Line::from(vec![
                Span::styled(" ", base),
                Span::styled(before, base),
                Span::styled(
                    matched,
                    base.fg(Color::Yellow).add_modifier(Modifier::UNDERLINED),
                ),
                Span::styled(after, base),
            ])
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
