// Autocomplete controller for one input field.
//
// State machine: Closed <-> Open { query, highlighted }. Composes the matcher,
// the validator and the shared registry. The only side effects are registry
// commits and the FieldView it hands back for rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::matcher::{list_all, match_names, MatchResult};
use super::registry::{CommitOutcome, ParticipantRegistry};
use super::validator::{validate, Validation, ValidationError};
use super::FieldId;
use crate::protocol::FieldView;

/// Where a picker draws its candidates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickerKind {
    /// Team player slot: roster minus names taken elsewhere, plus the sentinel.
    Team,
    /// Ace pot recipient: current participants only, no sentinel.
    Recipient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListState {
    Closed,
    Open {
        query: String,
        /// `None` until the user moves through the list.
        highlighted: Option<usize>,
    },
}

/// Message shown in place of an empty recipient list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyHint {
    NoParticipants,
    NoMatches,
}

impl fmt::Display for EmptyHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyHint::NoParticipants => write!(f, "No players in tournament yet"),
            EmptyHint::NoMatches => write!(f, "No matching players"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldController {
    id: FieldId,
    kind: PickerKind,
    value: String,
    list: ListState,
    results: Vec<MatchResult>,
    hint: Option<EmptyHint>,
    valid: bool,
    /// Error currently displayed, if any.
    error: Option<ValidationError>,
    focused: bool,
    /// Set when the registry changed since the list was last computed.
    stale: bool,
    /// Render sequence; bumped on every state change so renderers can drop
    /// out-of-order views.
    seq: u64,
}

impl FieldController {
    pub fn new(id: FieldId, kind: PickerKind) -> Self {
        FieldController {
            id,
            kind,
            value: String::new(),
            list: ListState::Closed,
            results: Vec::new(),
            hint: None,
            valid: false,
            error: None,
            focused: false,
            stale: false,
            seq: 0,
        }
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn kind(&self) -> PickerKind {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn list(&self) -> &ListState {
        &self.list
    }

    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }

    pub fn is_open(&self) -> bool {
        matches!(self.list, ListState::Open { .. })
    }

    pub fn highlighted(&self) -> Option<usize> {
        match self.list {
            ListState::Open { highlighted, .. } => highlighted,
            ListState::Closed => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn error(&self) -> Option<ValidationError> {
        self.error
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Names this field may hold right now.
    pub fn candidates(&self, registry: &ParticipantRegistry) -> Vec<String> {
        match self.kind {
            PickerKind::Team => registry.available_for(&self.id),
            PickerKind::Recipient => registry.snapshot(),
        }
    }

    // -- Transitions --

    /// Text changed. Opens on a non-empty query, closes on an empty one.
    /// Recipient pickers stay open on empty text and list every participant.
    pub fn input(&mut self, text: &str, registry: &ParticipantRegistry) {
        self.value = text.to_string();
        if text.trim().is_empty() && self.kind == PickerKind::Team {
            self.close_list();
        } else {
            self.open_with(text.trim().to_string(), registry);
        }
        self.refresh_validity(registry);
        self.touch();
    }

    pub fn arrow_down(&mut self) {
        let count = self.results.len();
        if let ListState::Open { highlighted, .. } = &mut self.list {
            if count > 0 {
                *highlighted = Some(match *highlighted {
                    Some(i) if i + 1 < count => i + 1,
                    Some(_) => 0,
                    None => 0,
                });
                self.touch();
            }
        }
    }

    pub fn arrow_up(&mut self) {
        let count = self.results.len();
        if let ListState::Open { highlighted, .. } = &mut self.list {
            if count > 0 {
                *highlighted = Some(match *highlighted {
                    Some(i) if i > 0 => i - 1,
                    _ => count - 1,
                });
                self.touch();
            }
        }
    }

    /// Commit the highlighted suggestion, or close leaving the typed text
    /// uncommitted when nothing is highlighted.
    pub fn enter(&mut self, registry: &mut ParticipantRegistry) -> Option<CommitOutcome> {
        let chosen = self
            .highlighted()
            .and_then(|i| self.results.get(i))
            .map(|r| r.candidate.clone());
        match chosen {
            Some(name) => self.select_candidate(&name, registry),
            None => {
                self.close_list();
                self.touch();
                None
            }
        }
    }

    /// Take `name` as the field value (keyboard or pointer selection).
    /// Team pickers commit it to the registry.
    pub fn select_candidate(
        &mut self,
        name: &str,
        registry: &mut ParticipantRegistry,
    ) -> Option<CommitOutcome> {
        self.value = name.to_string();
        self.close_list();
        self.focused = true;
        let outcome = self.commit(registry);
        self.refresh_validity(registry);
        self.touch();
        outcome
    }

    /// Set the value without user interaction (pre-populated rows) and commit.
    pub fn preset(&mut self, value: &str, registry: &mut ParticipantRegistry) -> Option<CommitOutcome> {
        self.value = value.trim().to_string();
        let outcome = self.commit(registry);
        self.refresh_validity(registry);
        self.touch();
        outcome
    }

    /// Focus returned to the field: reopen with the current value as query.
    pub fn focus(&mut self, registry: &ParticipantRegistry) {
        self.focused = true;
        if !self.value.trim().is_empty() || self.kind == PickerKind::Recipient {
            self.open_with(self.value.trim().to_string(), registry);
        }
        self.touch();
    }

    /// Focus left the field. Team pickers commit their raw text right away;
    /// closing the list and showing errors waits for `finish_blur`.
    pub fn blur(&mut self, registry: &mut ParticipantRegistry) -> Option<CommitOutcome> {
        self.focused = false;
        let outcome = self.commit(registry);
        self.refresh_validity(registry);
        self.touch();
        outcome
    }

    /// Commit whatever text the field holds now, e.g. typed but never
    /// blurred. Recipient pickers have nothing to commit.
    pub fn commit_value(&mut self, registry: &mut ParticipantRegistry) -> Option<CommitOutcome> {
        let outcome = self.commit(registry);
        self.refresh_validity(registry);
        outcome
    }

    /// Grace delay elapsed after a blur: close the list and run the explicit
    /// validation pass, which may surface an error.
    pub fn finish_blur(&mut self, registry: &ParticipantRegistry, required: bool) -> Validation {
        self.close_list();
        let v = self.validate_explicit(registry, required);
        self.touch();
        v
    }

    /// Validate and display the result. An empty optional field passes.
    pub fn validate_explicit(&mut self, registry: &ParticipantRegistry, required: bool) -> Validation {
        let v = if self.value.trim().is_empty() && !required {
            Validation {
                valid: true,
                reason: None,
            }
        } else {
            validate(&self.value, self.candidates(registry))
        };
        self.valid = v.valid;
        self.error = v.reason;
        v
    }

    /// Registry changed elsewhere; recompute lazily.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Bring a stale open list and the validity flag up to date.
    pub fn refresh_if_stale(&mut self, registry: &ParticipantRegistry) {
        if !self.stale {
            return;
        }
        if let ListState::Open { query, .. } = &self.list {
            let query = query.clone();
            self.open_with(query, registry);
        }
        self.refresh_validity(registry);
        self.stale = false;
        self.touch();
    }

    /// Wipe the value (recipient fell out of the participant set).
    pub fn clear(&mut self) {
        self.value.clear();
        self.close_list();
        self.valid = false;
        self.error = None;
        self.touch();
    }

    /// Snapshot for the renderer.
    pub fn view(&self) -> FieldView {
        FieldView {
            field: self.id,
            label: self.id.to_string(),
            kind: self.kind,
            value: self.value.clone(),
            open: self.is_open(),
            suggestions: self.results.clone(),
            highlighted: self.highlighted(),
            valid: self.valid,
            error: self.error.map(|e| e.to_string()),
            hint: self.hint.map(|h| h.to_string()),
            seq: self.seq,
        }
    }

    // -- Internals --

    fn commit(&mut self, registry: &mut ParticipantRegistry) -> Option<CommitOutcome> {
        match self.kind {
            PickerKind::Team => Some(registry.commit(self.id, &self.value)),
            PickerKind::Recipient => None,
        }
    }

    fn open_with(&mut self, query: String, registry: &ParticipantRegistry) {
        let candidates = self.candidates(registry);
        let (results, hint) = match self.kind {
            PickerKind::Team => (match_names(&query, &candidates, true), None),
            PickerKind::Recipient => {
                if candidates.is_empty() {
                    (Vec::new(), Some(EmptyHint::NoParticipants))
                } else if query.is_empty() {
                    (list_all(&candidates), None)
                } else {
                    let found = match_names(&query, &candidates, false);
                    let hint = found.is_empty().then_some(EmptyHint::NoMatches);
                    (found, hint)
                }
            }
        };
        self.results = results;
        self.hint = hint;
        self.list = ListState::Open {
            query,
            highlighted: None,
        };
        self.stale = false;
    }

    fn close_list(&mut self) {
        self.list = ListState::Closed;
        self.results.clear();
        self.hint = None;
    }

    /// Update the validity flag without surfacing new errors. A displayed
    /// error is cleared once the value becomes valid, or updated to the
    /// current reason otherwise.
    fn refresh_validity(&mut self, registry: &ParticipantRegistry) {
        let v = validate(&self.value, self.candidates(registry));
        self.valid = v.valid;
        if v.valid {
            self.error = None;
        } else if self.error.is_some() {
            self.error = v.reason;
        }
    }

    fn touch(&mut self) {
        self.seq += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
