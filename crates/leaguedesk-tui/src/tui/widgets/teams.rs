// Teams widget: one table row per team with both players, the score and
// the ace pot buy-ins. Invalid names are drawn red with their error.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;

use leaguedesk_core::entry::FieldId;
use leaguedesk_core::protocol::RowView;

use super::{field_style, field_text};
use crate::tui::{Target, ViewState};

/// Render the team rows into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("Player 1"),
        Cell::from("Player 2"),
        Cell::from("Score"),
        Cell::from("Ace"),
    ])
    .style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = if state.rows.is_empty() {
        vec![Row::new(vec![Cell::from("  No teams (Ctrl+N to add)")])]
    } else {
        state.rows.iter().map(|row| team_row(state, row)).collect()
    };

    let widths = [
        Constraint::Length(3),
        Constraint::Min(14),
        Constraint::Min(14),
        Constraint::Length(6),
        Constraint::Length(5),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Teams"));
    frame.render_widget(table, area);
}

fn team_row<'a>(state: &'a ViewState, row: &'a RowView) -> Row<'a> {
    let p1 = FieldId::player1(row.row);
    let p2 = FieldId::player2(row.row);

    let score_focused = state.focus == Some(Target::Score(row.row));
    let score = if score_focused {
        format!("{}▏", state.buffer)
    } else {
        row.score.clone()
    };
    let score_style = if score_focused {
        Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let has_error = [p1, p2]
        .iter()
        .any(|f| state.fields.get(f).is_some_and(|v| v.error.is_some()));

    Row::new(vec![
        Cell::from(row.position.to_string()),
        player_cell(state, p1),
        player_cell(state, p2),
        Cell::from(score).style(score_style),
        Cell::from(buy_in_marker(row.player1_buy_in, row.player2_buy_in))
            .style(Style::default().fg(Color::Green)),
    ])
    .height(if has_error { 2 } else { 1 })
}

fn player_cell(state: &ViewState, field: FieldId) -> Cell<'static> {
    let view = state.fields.get(&field);
    let focused = state.focus == Some(Target::Field(field));
    let mut lines = vec![Line::from(Span::styled(
        field_text(state, field),
        field_style(view, focused),
    ))];
    if let Some(error) = view.and_then(|v| v.error.clone()) {
        lines.push(Line::from(Span::styled(
            error,
            Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC),
        )));
    }
    Cell::from(lines)
}

/// `$` per opted-in player, `.` otherwise.
pub fn buy_in_marker(player1: bool, player2: bool) -> String {
    let mark = |b: bool| if b { '$' } else { '.' };
    format!("{}{}", mark(player1), mark(player2))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use leaguedesk_core::entry::controller::PickerKind;
    use leaguedesk_core::entry::RowId;
    use leaguedesk_core::protocol::{FieldView, UiUpdate};

    use crate::tui::apply_ui_update;

    #[test]
    fn buy_in_marker_formats() {
        assert_eq!(buy_in_marker(false, false), "..");
        assert_eq!(buy_in_marker(true, false), "$.");
        assert_eq!(buy_in_marker(true, true), "$$");
    }

    #[test]
    fn render_does_not_panic_empty() {
        let backend = ratatui::backend::TestBackend::new(80, 20);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState::default();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }

    #[test]
    fn render_shows_invalid_name_error() {
        let backend = ratatui::backend::TestBackend::new(80, 10);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = ViewState::default();
        apply_ui_update(
            &mut state,
            UiUpdate::Rows(vec![RowView {
                row: RowId(0),
                position: 1,
                score: "12".into(),
                player1_buy_in: true,
                player2_buy_in: false,
            }]),
        );
        apply_ui_update(
            &mut state,
            UiUpdate::Field(FieldView {
                field: FieldId::player1(RowId(0)),
                label: "player1_0".into(),
                kind: PickerKind::Team,
                value: "Zed".into(),
                open: false,
                suggestions: Vec::new(),
                highlighted: None,
                valid: false,
                error: Some("Bad".into()),
                hint: None,
                seq: 1,
            }),
        );
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Zed"));
        assert!(text.contains("Bad"));
        assert!(text.contains("$."));
    }
}
