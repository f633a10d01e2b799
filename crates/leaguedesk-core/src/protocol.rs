// Messages between the form session and its front end.
//
// The front end sends `SessionCommand`s describing what the operator did; the
// session answers with `UiUpdate`s describing what to draw. Neither side
// shares mutable state with the other.

use serde::{Deserialize, Serialize};

use crate::entry::controller::PickerKind;
use crate::entry::matcher::MatchResult;
use crate::entry::{FieldId, RowId};
use crate::money::Money;
use crate::pot::{PotChange, PotState};

// ---------------------------------------------------------------------------
// Commands (front end -> session)
// ---------------------------------------------------------------------------

/// Navigation keys understood by an open suggestion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavKey {
    Up,
    Down,
    Enter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionCommand {
    /// Focus moved into a field.
    Focus(FieldId),
    /// The text of a field changed.
    Input { field: FieldId, text: String },
    /// A navigation key was pressed inside a field.
    Key { field: FieldId, key: NavKey },
    /// A suggestion was picked directly (pointer click).
    Select { field: FieldId, name: String },
    /// Focus left a field.
    Blur(FieldId),
    AddTeamRow,
    RemoveTeamRow(RowId),
    SetScore { row: RowId, text: String },
    /// Toggle the ace pot buy-in of one player field.
    SetBuyIn { field: FieldId, opted_in: bool },
    SetAcePotPaid(bool),
    AddRecipient,
    RemoveRecipient(RowId),
    Submit,
    Quit,
}

// ---------------------------------------------------------------------------
// Views (session -> front end)
// ---------------------------------------------------------------------------

/// Everything needed to draw one input field and its suggestion list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldView {
    pub field: FieldId,
    /// Form name of the field, e.g. `player1_0`.
    pub label: String,
    pub kind: PickerKind,
    pub value: String,
    pub open: bool,
    pub suggestions: Vec<MatchResult>,
    pub highlighted: Option<usize>,
    pub valid: bool,
    /// Error message to display under the field.
    pub error: Option<String>,
    /// Placeholder shown instead of an empty suggestion list.
    pub hint: Option<String>,
    /// Per-field render sequence. A view with a lower `seq` than one already
    /// drawn for the same field is outdated.
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotView {
    pub current: Money,
    pub reserve: Money,
    pub total: Money,
    pub cap: Money,
    pub change: PotChange,
    /// Number of players currently opted in.
    pub buy_ins: usize,
}

/// One team row in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowView {
    pub row: RowId,
    /// 1-based display position.
    pub position: usize,
    pub score: String,
    pub player1_buy_in: bool,
    pub player2_buy_in: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientsView {
    /// The recipient section is shown only while the ace pot is paid.
    pub visible: bool,
    pub rows: Vec<RowId>,
}

/// A complete team as handed to the submit collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTeam {
    pub position: usize,
    pub players: [String; 2],
    pub score: u32,
    pub ace_pot_buy_ins: [bool; 2],
}

/// Payload produced by a successful submission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub teams: Vec<SubmittedTeam>,
    pub ace_pot_paid: bool,
    pub recipients: Vec<String>,
    pub pot: PotState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiUpdate {
    Field(FieldView),
    /// A field no longer exists (its row was removed).
    FieldRemoved(FieldId),
    Pot(PotView),
    Rows(Vec<RowView>),
    Recipients(RecipientsView),
    /// Current participants in roster order.
    Participants(Vec<String>),
    SubmissionBlocked(String),
    SubmissionReady(Box<Submission>),
}

impl PotView {
    pub fn new(state: PotState, change: PotChange, buy_ins: usize) -> Self {
        PotView {
            current: state.current,
            reserve: state.reserve,
            total: state.total,
            cap: state.cap,
            change,
            buy_ins,
        }
    }
}
