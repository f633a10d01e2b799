// Participant entry: name matching, validation, the shared registry and the
// per-field autocomplete controller.

pub mod controller;
pub mod matcher;
pub mod registry;
pub mod validator;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable ordinal of a team or recipient row. Used for naming and ordering
/// only; the displayed position is renumbered separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub u32);

/// Which input of a row a field is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Player1,
    Player2,
    Recipient,
}

/// Identity of one input field within a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId {
    pub row: RowId,
    pub slot: Slot,
}

impl FieldId {
    pub fn player1(row: RowId) -> Self {
        FieldId { row, slot: Slot::Player1 }
    }

    pub fn player2(row: RowId) -> Self {
        FieldId { row, slot: Slot::Player2 }
    }

    pub fn recipient(row: RowId) -> Self {
        FieldId { row, slot: Slot::Recipient }
    }

    pub fn is_recipient(&self) -> bool {
        self.slot == Slot::Recipient
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot {
            Slot::Player1 => write!(f, "player1_{}", self.row.0),
            Slot::Player2 => write!(f, "player2_{}", self.row.0),
            Slot::Recipient => write!(f, "ace_pot_recipient_{}", self.row.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_ids_use_form_names() {
        assert_eq!(FieldId::player1(RowId(0)).to_string(), "player1_0");
        assert_eq!(FieldId::player2(RowId(4)).to_string(), "player2_4");
        assert_eq!(FieldId::recipient(RowId(1)).to_string(), "ace_pot_recipient_1");
    }

    #[test]
    fn field_ids_order_by_row_then_slot() {
        let mut ids = vec![
            FieldId::player2(RowId(1)),
            FieldId::player1(RowId(1)),
            FieldId::player2(RowId(0)),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                FieldId::player2(RowId(0)),
                FieldId::player1(RowId(1)),
                FieldId::player2(RowId(1)),
            ]
        );
    }
}
