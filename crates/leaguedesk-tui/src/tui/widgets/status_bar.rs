// Status bar widget: participant count and the field under the cursor.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::{Target, ViewState};

/// Render the status bar into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let spans = vec![
        Span::styled(
            " LeagueDesk ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" | ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("Teams: {}", state.rows.len()),
            Style::default().fg(Color::White),
        ),
        Span::styled(" | ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("Players: {}", state.participants.len()),
            Style::default().fg(Color::White),
        ),
        Span::styled(" | ", Style::default().fg(Color::Gray)),
        Span::styled(focus_label(state), Style::default().fg(Color::Yellow)),
    ];

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Human-readable name of the cursor position.
pub fn focus_label(state: &ViewState) -> String {
    match state.focus {
        Some(Target::Field(field)) => field.to_string(),
        Some(Target::Score(row)) => format!("score_{}", row.0),
        None => "-".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use leaguedesk_core::entry::{FieldId, RowId};

    #[test]
    fn focus_label_names_target() {
        let mut state = ViewState::default();
        assert_eq!(focus_label(&state), "-");
        state.focus = Some(Target::Field(FieldId::player2(RowId(4))));
        assert_eq!(focus_label(&state), "player2_4");
        state.focus = Some(Target::Score(RowId(1)));
        assert_eq!(focus_label(&state), "score_1");
    }

    #[test]
    fn render_does_not_panic_with_defaults() {
        let backend = ratatui::backend::TestBackend::new(80, 1);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState::default();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }
}
