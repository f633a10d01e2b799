// Participant registry: the names currently committed across every linked
// field of one form.
//
// A non-sentinel name is a member iff at least one live field holds it. The
// registry tracks the holding per field, so membership is always derived and
// a field's previous committed value is known without the caller passing it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::FieldId;
use crate::roster::{is_sentinel, normalize, Roster};

/// What a commit did with the new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStatus {
    /// The field now holds this roster name (roster spelling).
    Inserted(String),
    /// The field holds the sentinel, which is never registered.
    Sentinel,
    /// The new value was blank.
    Cleared,
    /// The new value is not on the roster.
    Unknown,
    /// Another live field already holds this name; nothing was inserted.
    Conflict { holder: FieldId },
}

/// Published after every mutation that changed membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryChange {
    pub revision: u64,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub status: CommitStatus,
    pub change: Option<RegistryChange>,
}

/// The shared set of chosen identifiers for one form.
#[derive(Debug, Clone)]
pub struct ParticipantRegistry {
    roster: Arc<Roster>,
    /// Committed roster name per live field. Never holds the sentinel.
    held: BTreeMap<FieldId, String>,
    revision: u64,
}

impl ParticipantRegistry {
    pub fn new(roster: Arc<Roster>) -> Self {
        ParticipantRegistry {
            roster,
            held: BTreeMap::new(),
            revision: 0,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Incremented once per membership change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Name currently committed by `field`, if any.
    pub fn held_by(&self, field: &FieldId) -> Option<&str> {
        self.held.get(field).map(String::as_str)
    }

    /// First live field (in field order) holding `name`.
    pub fn holder_of(&self, name: &str) -> Option<FieldId> {
        let wanted = normalize(name);
        self.held
            .iter()
            .find(|(_, held)| normalize(held) == wanted)
            .map(|(field, _)| *field)
    }

    pub fn is_member(&self, name: &str) -> bool {
        self.holder_of(name).is_some()
    }

    /// Number of distinct member names.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Commit `new_value` as the value of `field`.
    ///
    /// The field's previous name leaves the registry unless another live
    /// field still holds it. The new value is inserted only when it names a
    /// roster player, is not the sentinel and is not held by another field.
    pub fn commit(&mut self, field: FieldId, new_value: &str) -> CommitOutcome {
        let canonical = self.roster.canonical(new_value).map(str::to_string);

        // Re-committing the same name is a no-op.
        if let (Some(name), Some(current)) = (&canonical, self.held.get(&field)) {
            if current == name {
                return CommitOutcome {
                    status: CommitStatus::Inserted(name.clone()),
                    change: None,
                };
            }
        }

        let status = if new_value.trim().is_empty() {
            CommitStatus::Cleared
        } else if is_sentinel(new_value) {
            CommitStatus::Sentinel
        } else {
            match canonical {
                None => CommitStatus::Unknown,
                Some(name) => match self.holder_other_than(&name, &field) {
                    Some(holder) => CommitStatus::Conflict { holder },
                    None => CommitStatus::Inserted(name),
                },
            }
        };

        let mut removed = Vec::new();
        if let Some(prior) = self.held.remove(&field) {
            if !self.is_member(&prior) {
                removed.push(prior);
            }
        }

        let mut added = Vec::new();
        if let CommitStatus::Inserted(name) = &status {
            if !self.is_member(name) {
                added.push(name.clone());
            }
            self.held.insert(field, name.clone());
        }

        debug!("Commit {} -> {:?}", field, status);
        CommitOutcome {
            change: self.publish(added, removed),
            status,
        }
    }

    /// Forget `field` entirely (its row was removed).
    pub fn release(&mut self, field: FieldId) -> Option<RegistryChange> {
        let prior = self.held.remove(&field)?;
        let removed = if self.is_member(&prior) {
            Vec::new()
        } else {
            vec![prior]
        };
        debug!("Released {}", field);
        self.publish(Vec::new(), removed)
    }

    /// Current members in roster order. Never contains the sentinel.
    pub fn snapshot(&self) -> Vec<String> {
        self.roster
            .names()
            .iter()
            .filter(|name| self.is_member(name))
            .cloned()
            .collect()
    }

    /// Roster names `field` may pick: everything not held by another field.
    /// The field's own committed name stays available to it.
    pub fn available_for(&self, field: &FieldId) -> Vec<String> {
        self.roster
            .names()
            .iter()
            .filter(|name| self.holder_other_than(name, field).is_none())
            .cloned()
            .collect()
    }

    fn holder_other_than(&self, name: &str, field: &FieldId) -> Option<FieldId> {
        let wanted = normalize(name);
        self.held
            .iter()
            .find(|(id, held)| *id != field && normalize(held) == wanted)
            .map(|(id, _)| *id)
    }

    fn publish(&mut self, added: Vec<String>, removed: Vec<String>) -> Option<RegistryChange> {
        if added.is_empty() && removed.is_empty() {
            return None;
        }
        self.revision += 1;
        Some(RegistryChange {
            revision: self.revision,
            added,
            removed,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
