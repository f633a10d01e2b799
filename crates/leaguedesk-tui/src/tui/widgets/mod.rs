// TUI widget modules for each form panel.

pub mod pot;
pub mod recipients;
pub mod status_bar;
pub mod suggestions;
pub mod teams;

use ratatui::style::{Color, Modifier, Style};

use leaguedesk_core::entry::FieldId;
use leaguedesk_core::protocol::FieldView;

use crate::tui::{Target, ViewState};

/// Text to show for a picker field. The focused field shows the live edit
/// buffer with a cursor.
pub fn field_text(state: &ViewState, field: FieldId) -> String {
    if state.focus == Some(Target::Field(field)) {
        return format!("{}▏", state.buffer);
    }
    state
        .fields
        .get(&field)
        .map(|v| v.value.clone())
        .unwrap_or_default()
}

/// Style for a picker field: highlighted under the cursor, red when invalid.
pub fn field_style(view: Option<&FieldView>, focused: bool) -> Style {
    let mut style = match view {
        Some(v) if !v.valid => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    if focused {
        style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
    }
    style
}
