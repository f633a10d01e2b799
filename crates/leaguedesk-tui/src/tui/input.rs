// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into SessionCommand messages for the
// session loop. Cursor movement and the edit buffer are tracked locally in
// ViewState; everything else is decided by the session.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use leaguedesk_core::entry::Slot;
use leaguedesk_core::protocol::{NavKey, SessionCommand};

use super::{Target, ViewState};

/// Handle a keyboard event.
///
/// Returns the commands to forward to the session, in order. An empty
/// vector means the key was ignored or handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Vec<SessionCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return Vec::new();
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
        return handle_control(key_event.code, view_state);
    }

    match key_event.code {
        KeyCode::Tab => move_focus(view_state, 1),
        KeyCode::BackTab => move_focus(view_state, -1),
        KeyCode::Esc => {
            let cmds = leave(view_state.focus);
            view_state.set_focus(None);
            cmds
        }
        KeyCode::F(2) => toggle_buy_in(view_state),
        KeyCode::Up => nav(view_state, NavKey::Up),
        KeyCode::Down => nav(view_state, NavKey::Down),
        KeyCode::Enter => {
            let open = view_state.focused_view().is_some_and(|v| v.open);
            if open {
                view_state.awaiting_selection = true;
            }
            nav(view_state, NavKey::Enter)
        }
        KeyCode::Backspace => {
            if view_state.focus.is_none() {
                return Vec::new();
            }
            view_state.buffer.pop();
            edit(view_state)
        }
        KeyCode::Char(c) => {
            if view_state.focus.is_none() {
                return Vec::new();
            }
            view_state.buffer.push(c);
            edit(view_state)
        }
        _ => Vec::new(),
    }
}

fn handle_control(code: KeyCode, view_state: &mut ViewState) -> Vec<SessionCommand> {
    match code {
        KeyCode::Char('c') => vec![SessionCommand::Quit],
        KeyCode::Char('s') => {
            let mut cmds = leave(view_state.focus);
            view_state.set_focus(None);
            cmds.push(SessionCommand::Submit);
            cmds
        }
        KeyCode::Char('n') => vec![SessionCommand::AddTeamRow],
        KeyCode::Char('r') => vec![SessionCommand::AddRecipient],
        KeyCode::Char('p') => vec![SessionCommand::SetAcePotPaid(!view_state.recipients.visible)],
        KeyCode::Char('d') => {
            let cmd = match view_state.focus {
                Some(Target::Score(row)) => SessionCommand::RemoveTeamRow(row),
                Some(Target::Field(field)) if field.is_recipient() => {
                    SessionCommand::RemoveRecipient(field.row)
                }
                Some(Target::Field(field)) => SessionCommand::RemoveTeamRow(field.row),
                None => return Vec::new(),
            };
            view_state.set_focus(None);
            vec![cmd]
        }
        _ => Vec::new(),
    }
}

/// Step the cursor through `focus_order`, wrapping at both ends.
fn move_focus(view_state: &mut ViewState, step: isize) -> Vec<SessionCommand> {
    let order = view_state.focus_order();
    if order.is_empty() {
        return Vec::new();
    }
    let len = order.len() as isize;
    let next = match view_state.focus.and_then(|t| order.iter().position(|o| *o == t)) {
        Some(idx) => (idx as isize + step).rem_euclid(len) as usize,
        None if step >= 0 => 0,
        None => order.len() - 1,
    };
    let target = order[next];

    let mut cmds = leave(view_state.focus);
    view_state.set_focus(Some(target));
    if let Target::Field(field) = target {
        cmds.push(SessionCommand::Focus(field));
    }
    cmds
}

fn leave(target: Option<Target>) -> Vec<SessionCommand> {
    match target {
        Some(Target::Field(field)) => vec![SessionCommand::Blur(field)],
        _ => Vec::new(),
    }
}

fn nav(view_state: &ViewState, key: NavKey) -> Vec<SessionCommand> {
    match view_state.focused_field() {
        Some(field) => vec![SessionCommand::Key { field, key }],
        None => Vec::new(),
    }
}

fn edit(view_state: &ViewState) -> Vec<SessionCommand> {
    let text = view_state.buffer.clone();
    match view_state.focus {
        Some(Target::Field(field)) => vec![SessionCommand::Input { field, text }],
        Some(Target::Score(row)) => vec![SessionCommand::SetScore { row, text }],
        None => Vec::new(),
    }
}

fn toggle_buy_in(view_state: &ViewState) -> Vec<SessionCommand> {
    let Some(field) = view_state.focused_field() else {
        return Vec::new();
    };
    let Some(row) = view_state.row(field.row) else {
        return Vec::new();
    };
    let current = match field.slot {
        Slot::Player1 => row.player1_buy_in,
        Slot::Player2 => row.player2_buy_in,
        Slot::Recipient => return Vec::new(),
    };
    vec![SessionCommand::SetBuyIn {
        field,
        opted_in: !current,
    }]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
