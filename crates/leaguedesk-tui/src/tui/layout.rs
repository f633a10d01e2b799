// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Ace Pot (4 rows)                                  |
// +-------------------------+------------------------+
// | Teams (60%)              | Suggestions (60%)      |
// |                          +------------------------+
// |                          | Recipients (40%)       |
// +-------------------------+------------------------+
// | Message (1 row)                                   |
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each form zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: participant count and focused field.
    pub status_bar: Rect,
    /// Ace pot balance and projection.
    pub pot: Rect,
    /// Team rows with players, scores and buy-ins.
    pub teams: Rect,
    /// Suggestion list of the focused field.
    pub suggestions: Rect,
    /// Ace pot recipient rows.
    pub recipients: Rect,
    /// Submission outcome line.
    pub message: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

pub fn build_layout(area: Rect) -> AppLayout {
    // Vertical: status(1) | pot(4) | middle(fill) | message(1) | help(1)
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(vertical[2]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(horizontal[1]);

    AppLayout {
        status_bar: vertical[0],
        pot: vertical[1],
        teams: horizontal[0],
        suggestions: sidebar[0],
        recipients: sidebar[1],
        message: vertical[3],
        help_bar: vertical[4],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_area() -> Rect {
        Rect::new(0, 0, 120, 40)
    }

    #[test]
    fn layout_all_rects_nonzero() {
        let layout = build_layout(test_area());
        let rects = [
            ("status_bar", layout.status_bar),
            ("pot", layout.pot),
            ("teams", layout.teams),
            ("suggestions", layout.suggestions),
            ("recipients", layout.recipients),
            ("message", layout.message),
            ("help_bar", layout.help_bar),
        ];
        for (name, rect) in &rects {
            assert!(
                rect.width > 0 && rect.height > 0,
                "{} has zero area: {:?}",
                name,
                rect
            );
        }
    }

    #[test]
    fn layout_fixed_rows() {
        let layout = build_layout(test_area());
        assert_eq!(layout.status_bar.height, 1);
        assert_eq!(layout.pot.height, 4);
        assert_eq!(layout.message.height, 1);
        assert_eq!(layout.help_bar.height, 1);
    }

    #[test]
    fn layout_teams_wider_than_sidebar() {
        let layout = build_layout(test_area());
        assert!(layout.teams.width > layout.suggestions.width);
        assert_eq!(layout.suggestions.width, layout.recipients.width);
        assert!(layout.suggestions.y < layout.recipients.y);
    }

    #[test]
    fn layout_fits_within_area() {
        let area = test_area();
        let layout = build_layout(area);
        let bottom = layout.help_bar.y + layout.help_bar.height;
        assert!(bottom <= area.height);
        assert!(layout.message.y < layout.help_bar.y);
    }
}
