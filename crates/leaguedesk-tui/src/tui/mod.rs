// Terminal front end for the entry form: layout, input handling and widgets.
//
// The TUI owns a `ViewState` mirroring what the session last published. The
// session loop pushes `UiUpdate` messages over an mpsc channel; the TUI
// applies them to `ViewState` and re-renders at ~30 fps. It makes no
// decisions about names or balances itself.

pub mod input;
pub mod layout;
pub mod widgets;

use std::collections::BTreeMap;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::debug;

use leaguedesk_core::entry::{FieldId, RowId};
use leaguedesk_core::protocol::{
    FieldView, PotView, RecipientsView, RowView, SessionCommand, Submission, UiUpdate,
};

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// Focus targets
// ---------------------------------------------------------------------------

/// Something the cursor can sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Field(FieldId),
    Score(RowId),
}

/// Outcome line shown above the help bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Blocked(String),
    Ready(String),
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local mirror of the form for rendering.
#[derive(Debug, Default)]
pub struct ViewState {
    /// Latest view per field.
    pub fields: BTreeMap<FieldId, FieldView>,
    /// Team rows in display order.
    pub rows: Vec<RowView>,
    pub recipients: RecipientsView,
    pub pot: Option<PotView>,
    pub participants: Vec<String>,
    /// Where the cursor is.
    pub focus: Option<Target>,
    /// Text being edited in the focused input.
    pub buffer: String,
    /// Set after a selection was requested; the next view of the focused
    /// field replaces `buffer`.
    pub awaiting_selection: bool,
    pub status: Option<StatusMessage>,
    /// Payload of the last successful submission check.
    pub submission: Option<Submission>,
}

impl ViewState {
    pub fn focused_field(&self) -> Option<FieldId> {
        match self.focus {
            Some(Target::Field(field)) => Some(field),
            _ => None,
        }
    }

    pub fn focused_view(&self) -> Option<&FieldView> {
        self.focused_field().and_then(|f| self.fields.get(&f))
    }

    pub fn row(&self, row: RowId) -> Option<&RowView> {
        self.rows.iter().find(|r| r.row == row)
    }

    /// Cursor stops in display order: each team row's two players and
    /// score, then the recipients while the section is shown.
    pub fn focus_order(&self) -> Vec<Target> {
        let mut order = Vec::new();
        for row in &self.rows {
            order.push(Target::Field(FieldId::player1(row.row)));
            order.push(Target::Field(FieldId::player2(row.row)));
            order.push(Target::Score(row.row));
        }
        if self.recipients.visible {
            for row in &self.recipients.rows {
                order.push(Target::Field(FieldId::recipient(*row)));
            }
        }
        order
    }

    /// Move the cursor to `target` and load its text into the edit buffer.
    pub fn set_focus(&mut self, target: Option<Target>) {
        self.focus = target;
        self.awaiting_selection = false;
        self.buffer = match target {
            Some(Target::Field(field)) => self
                .fields
                .get(&field)
                .map(|v| v.value.clone())
                .unwrap_or_default(),
            Some(Target::Score(row)) => self.row(row).map(|r| r.score.clone()).unwrap_or_default(),
            None => String::new(),
        };
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Field(view) => {
            if let Some(existing) = state.fields.get(&view.field) {
                if existing.seq > view.seq {
                    debug!("Dropping outdated view of {} (seq {})", view.field, view.seq);
                    return;
                }
            }
            if state.awaiting_selection && state.focused_field() == Some(view.field) && !view.open {
                state.buffer = view.value.clone();
                state.awaiting_selection = false;
            }
            state.fields.insert(view.field, view);
        }
        UiUpdate::FieldRemoved(field) => {
            state.fields.remove(&field);
            if state.focused_field() == Some(field) {
                state.set_focus(None);
            }
        }
        UiUpdate::Pot(pot) => {
            state.pot = Some(pot);
        }
        UiUpdate::Rows(rows) => {
            state.rows = rows;
            if let Some(Target::Score(row)) = state.focus {
                if state.row(row).is_none() {
                    state.set_focus(None);
                }
            }
        }
        UiUpdate::Recipients(recipients) => {
            state.recipients = recipients;
        }
        UiUpdate::Participants(names) => {
            state.participants = names;
        }
        UiUpdate::SubmissionBlocked(message) => {
            state.status = Some(StatusMessage::Blocked(message));
            state.submission = None;
        }
        UiUpdate::SubmissionReady(submission) => {
            state.status = Some(StatusMessage::Ready(format!(
                "Ready to record: {} teams, pot {}",
                submission.teams.len(),
                submission.pot.total
            )));
            state.submission = Some(*submission);
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete form.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::pot::render(frame, layout.pot, state);
    widgets::teams::render(frame, layout.teams, state);
    widgets::suggestions::render(frame, layout.suggestions, state);
    widgets::recipients::render(frame, layout.recipients, state);
    render_message(frame, &layout, state);
    render_help_bar(frame, &layout);
}

fn render_message(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let line = match &state.status {
        Some(StatusMessage::Blocked(msg)) => {
            Line::from(Span::styled(format!(" {}", msg), Style::default().fg(Color::Red)))
        }
        Some(StatusMessage::Ready(msg)) => {
            Line::from(Span::styled(format!(" {}", msg), Style::default().fg(Color::Green)))
        }
        None => Line::default(),
    };
    frame.render_widget(Paragraph::new(line), layout.message);
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout) {
    let text = " Tab:Next | Up/Down/Enter:Pick | F2:Buy-in | ^N:Add team | ^D:Remove | ^P:Ace paid | ^R:Add recipient | ^S:Submit | ^C:Quit";
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop until the operator quits or the session ends.
///
/// Returns the payload of the last successful submission check, if any.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<SessionCommand>,
) -> anyhow::Result<Option<Submission>> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    'main: loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => break,
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        for cmd in input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == SessionCommand::Quit;
                            if cmd_tx.send(cmd).await.is_err() || quit {
                                break 'main;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();

    Ok(view_state.submission)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
