// Form session: the single owner of one tournament entry form.
//
// Holds the participant registry, every field controller, the team and
// recipient rows, the ace pot and the pending blur validations. Commands come
// in through `handle`; everything the front end must redraw goes into the
// outbox drained by `drain_updates`.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::bootstrap::SessionSeed;
use crate::config::Config;
use crate::entry::controller::{FieldController, PickerKind};
use crate::entry::registry::{CommitOutcome, CommitStatus, ParticipantRegistry, RegistryChange};
use crate::entry::{FieldId, RowId};
use crate::pot::PotAccumulator;
use crate::protocol::{
    NavKey, PotView, RecipientsView, RowView, SessionCommand, Submission, SubmittedTeam, UiUpdate,
};
use crate::roster::normalize;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why the form cannot be submitted yet. Checked in this order; only the
/// first failing rule is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("Please correct the invalid player names.")]
    InvalidNames,

    #[error("At least {required} complete teams are required to record a tournament.")]
    TooFewTeams { required: usize, found: usize },

    #[error("Please select at least one ace pot recipient.")]
    MissingRecipient,
}

// ---------------------------------------------------------------------------
// FormSession
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct PendingBlur {
    deadline: Instant,
    generation: u64,
}

pub struct FormSession {
    registry: ParticipantRegistry,
    fields: BTreeMap<FieldId, FieldController>,
    /// Team rows in display order.
    team_rows: Vec<RowId>,
    scores: BTreeMap<RowId, String>,
    recipient_rows: Vec<RowId>,
    next_team_row: u32,
    next_recipient_row: u32,
    ace_pot_paid: bool,
    pot: PotAccumulator,
    /// Blurred fields waiting for their grace delay to elapse.
    pending: BTreeMap<FieldId, PendingBlur>,
    blur_generation: u64,
    focused: Option<FieldId>,
    grace_delay: Duration,
    min_complete_teams: usize,
    outbox: Vec<UiUpdate>,
}

impl FormSession {
    /// Build the form. Pre-populated teams get one row each and are committed
    /// like any other selection; otherwise the seed's (or configured) number
    /// of empty rows is created.
    pub fn new(config: &Config, seed: SessionSeed) -> Self {
        let pot = PotAccumulator::from_figures(
            &seed.pot,
            config.pot.cap_amount(),
            config.pot.contribution_amount(),
        );
        let mut session = FormSession {
            registry: ParticipantRegistry::new(Arc::new(seed.roster)),
            fields: BTreeMap::new(),
            team_rows: Vec::new(),
            scores: BTreeMap::new(),
            recipient_rows: Vec::new(),
            next_team_row: 0,
            next_recipient_row: 0,
            ace_pot_paid: false,
            pot,
            pending: BTreeMap::new(),
            blur_generation: 0,
            focused: None,
            grace_delay: config.entry.grace_delay(),
            min_complete_teams: config.entry.min_complete_teams,
            outbox: Vec::new(),
        };

        if seed.teams.is_empty() {
            let count = seed.team_count.unwrap_or(config.entry.default_team_rows);
            for _ in 0..count {
                session.push_team_row();
            }
        } else {
            for team in &seed.teams {
                let row = session.push_team_row();
                let slots = [FieldId::player1(row), FieldId::player2(row)];
                for (field, name) in slots.into_iter().zip(&team.players) {
                    if name.is_empty() {
                        continue;
                    }
                    let outcome = match session.fields.get_mut(&field) {
                        Some(ctl) => ctl.preset(name, &mut session.registry),
                        None => None,
                    };
                    session.after_commit(field, outcome);
                }
                if let Some(score) = team.score {
                    session.scores.insert(row, score.to_string());
                }
            }
        }

        info!(
            "Form ready: {} team rows, {} roster names, pot {}",
            session.team_rows.len(),
            session.registry.roster().len(),
            session.pot.total()
        );
        session.outbox.clear();
        session.publish_all();
        session
    }

    // -- Accessors --

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    pub fn field(&self, field: &FieldId) -> Option<&FieldController> {
        self.fields.get(field)
    }

    pub fn team_rows(&self) -> &[RowId] {
        &self.team_rows
    }

    pub fn recipient_rows(&self) -> &[RowId] {
        &self.recipient_rows
    }

    pub fn score(&self, row: RowId) -> Option<&str> {
        self.scores.get(&row).map(String::as_str)
    }

    pub fn ace_pot_paid(&self) -> bool {
        self.ace_pot_paid
    }

    pub fn pot(&self) -> &PotAccumulator {
        &self.pot
    }

    pub fn focused(&self) -> Option<FieldId> {
        self.focused
    }

    /// Take every presentation event queued since the last call.
    pub fn drain_updates(&mut self) -> Vec<UiUpdate> {
        std::mem::take(&mut self.outbox)
    }

    // -- Command dispatch --

    pub fn handle(&mut self, command: SessionCommand, now: Instant) {
        match command {
            SessionCommand::Focus(field) => self.focus(field),
            SessionCommand::Input { field, text } => self.input(field, &text),
            SessionCommand::Key { field, key } => self.key(field, key),
            SessionCommand::Select { field, name } => self.select(field, &name),
            SessionCommand::Blur(field) => self.blur(field, now),
            SessionCommand::AddTeamRow => {
                self.add_team_row();
            }
            SessionCommand::RemoveTeamRow(row) => self.remove_team_row(row),
            SessionCommand::SetScore { row, text } => self.set_score(row, &text),
            SessionCommand::SetBuyIn { field, opted_in } => self.set_buy_in(field, opted_in),
            SessionCommand::SetAcePotPaid(paid) => self.set_ace_pot_paid(paid),
            SessionCommand::AddRecipient => {
                self.add_recipient();
            }
            SessionCommand::RemoveRecipient(row) => self.remove_recipient(row),
            SessionCommand::Submit => self.submit(),
            SessionCommand::Quit => debug!("Quit reached the session; nothing to do"),
        }
    }

    // -- Field events --

    pub fn focus(&mut self, field: FieldId) {
        let Some(ctl) = self.fields.get_mut(&field) else {
            warn!("Focus on unknown field {}", field);
            return;
        };
        if self.pending.remove(&field).is_some() {
            debug!("Refocus of {} discards its pending blur", field);
        }
        self.focused = Some(field);
        ctl.refresh_if_stale(&self.registry);
        ctl.focus(&self.registry);
        self.outbox.push(UiUpdate::Field(ctl.view()));
    }

    pub fn input(&mut self, field: FieldId, text: &str) {
        let Some(ctl) = self.fields.get_mut(&field) else {
            warn!("Input on unknown field {}", field);
            return;
        };
        ctl.refresh_if_stale(&self.registry);
        ctl.input(text, &self.registry);
        self.outbox.push(UiUpdate::Field(ctl.view()));
    }

    pub fn key(&mut self, field: FieldId, key: NavKey) {
        let Some(ctl) = self.fields.get_mut(&field) else {
            warn!("Key on unknown field {}", field);
            return;
        };
        ctl.refresh_if_stale(&self.registry);
        let outcome = match key {
            NavKey::Down => {
                ctl.arrow_down();
                None
            }
            NavKey::Up => {
                ctl.arrow_up();
                None
            }
            NavKey::Enter => ctl.enter(&mut self.registry),
        };
        self.outbox.push(UiUpdate::Field(ctl.view()));
        self.after_commit(field, outcome);
    }

    /// A suggestion was picked directly. Cancels the pending blur, since the
    /// pick is what the grace delay was waiting for.
    pub fn select(&mut self, field: FieldId, name: &str) {
        let Some(ctl) = self.fields.get_mut(&field) else {
            warn!("Select on unknown field {}", field);
            return;
        };
        self.pending.remove(&field);
        self.focused = Some(field);
        let outcome = ctl.select_candidate(name, &mut self.registry);
        self.outbox.push(UiUpdate::Field(ctl.view()));
        self.after_commit(field, outcome);
    }

    /// Commit the raw text now; close and validate after the grace delay.
    pub fn blur(&mut self, field: FieldId, now: Instant) {
        let Some(ctl) = self.fields.get_mut(&field) else {
            warn!("Blur on unknown field {}", field);
            return;
        };
        let outcome = ctl.blur(&mut self.registry);
        self.outbox.push(UiUpdate::Field(ctl.view()));
        if self.focused == Some(field) {
            self.focused = None;
        }
        self.after_commit(field, outcome);

        self.blur_generation += 1;
        self.pending.insert(
            field,
            PendingBlur {
                deadline: now + self.grace_delay,
                generation: self.blur_generation,
            },
        );
    }

    /// Run every blur validation whose grace delay has elapsed by `now`.
    /// Returns how many fired.
    pub fn poll_due(&mut self, now: Instant) -> usize {
        let mut due: Vec<(PendingBlur, FieldId)> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(field, p)| (*p, *field))
            .collect();
        due.sort_by_key(|(p, _)| (p.deadline, p.generation));

        for (_, field) in &due {
            self.pending.remove(field);
            let required = self.is_required(field);
            if let Some(ctl) = self.fields.get_mut(field) {
                ctl.refresh_if_stale(&self.registry);
                let v = ctl.finish_blur(&self.registry, required);
                if let Some(reason) = v.reason {
                    debug!("{} failed validation: {}", field, reason);
                }
                self.outbox.push(UiUpdate::Field(ctl.view()));
            }
        }
        due.len()
    }

    /// Earliest pending blur deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    // -- Rows --

    pub fn add_team_row(&mut self) -> RowId {
        let row = self.push_team_row();
        for field in [FieldId::player1(row), FieldId::player2(row)] {
            if let Some(ctl) = self.fields.get(&field) {
                self.outbox.push(UiUpdate::Field(ctl.view()));
            }
        }
        self.outbox.push(UiUpdate::Rows(self.rows_view()));
        info!("Added team row {} (position {})", row.0, self.team_rows.len());
        row
    }

    /// Remove a team row: its names leave the registry, its players leave the
    /// pot and the remaining rows are renumbered.
    pub fn remove_team_row(&mut self, row: RowId) {
        let Some(position) = self.team_rows.iter().position(|r| *r == row) else {
            warn!("Remove of unknown team row {}", row.0);
            return;
        };
        self.team_rows.remove(position);
        self.scores.remove(&row);

        let mut pot_changed = false;
        for field in [FieldId::player1(row), FieldId::player2(row)] {
            self.pending.remove(&field);
            if self.focused == Some(field) {
                self.focused = None;
            }
            let name = self
                .fields
                .remove(&field)
                .map(|ctl| ctl.value().to_string())
                .unwrap_or_default();
            pot_changed |= self.pot.set_buy_in(field, &name, false);
            if let Some(change) = self.registry.release(field) {
                self.propagate(field, &change);
            }
            self.outbox.push(UiUpdate::FieldRemoved(field));
        }

        self.outbox.push(UiUpdate::Rows(self.rows_view()));
        if pot_changed {
            self.push_pot();
        }
        info!("Removed team row {}; {} rows left", row.0, self.team_rows.len());
    }

    pub fn set_score(&mut self, row: RowId, text: &str) {
        let Some(score) = self.scores.get_mut(&row) else {
            warn!("Score for unknown team row {}", row.0);
            return;
        };
        *score = text.trim().to_string();
        self.outbox.push(UiUpdate::Rows(self.rows_view()));
    }

    /// Opt a player field in or out of the ace pot. Only a field holding a
    /// registered roster player may opt in; blank, unknown and sentinel
    /// values are refused.
    pub fn set_buy_in(&mut self, field: FieldId, opted_in: bool) {
        match self.fields.get(&field) {
            Some(ctl) if ctl.kind() == PickerKind::Team => {}
            _ => {
                warn!("Buy-in toggle on non-player field {}", field);
                return;
            }
        }
        let name = self.registry.held_by(&field).map(str::to_string);
        if opted_in && name.is_none() {
            debug!("Buy-in refused for {}: no registered player", field);
            return;
        }
        if self.pot.set_buy_in(field, name.as_deref().unwrap_or_default(), opted_in) {
            self.push_pot();
            self.outbox.push(UiUpdate::Rows(self.rows_view()));
        }
    }

    pub fn set_ace_pot_paid(&mut self, paid: bool) {
        self.ace_pot_paid = paid;
        if paid && self.recipient_rows.is_empty() {
            self.add_recipient();
        }
        info!("Ace pot paid: {}", paid);
        self.outbox.push(UiUpdate::Recipients(self.recipients_view()));
    }

    pub fn add_recipient(&mut self) -> RowId {
        let row = RowId(self.next_recipient_row);
        self.next_recipient_row += 1;
        let field = FieldId::recipient(row);
        let ctl = FieldController::new(field, PickerKind::Recipient);
        self.outbox.push(UiUpdate::Field(ctl.view()));
        self.fields.insert(field, ctl);
        self.recipient_rows.push(row);
        self.outbox.push(UiUpdate::Recipients(self.recipients_view()));
        row
    }

    /// Remove a recipient row. While the ace pot is paid at least one
    /// recipient row always exists, so removing the last re-adds an empty one.
    pub fn remove_recipient(&mut self, row: RowId) {
        let Some(position) = self.recipient_rows.iter().position(|r| *r == row) else {
            warn!("Remove of unknown recipient row {}", row.0);
            return;
        };
        self.recipient_rows.remove(position);
        let field = FieldId::recipient(row);
        self.fields.remove(&field);
        self.pending.remove(&field);
        if self.focused == Some(field) {
            self.focused = None;
        }
        self.outbox.push(UiUpdate::FieldRemoved(field));

        if self.recipient_rows.is_empty() && self.ace_pot_paid {
            self.add_recipient();
        } else {
            self.outbox.push(UiUpdate::Recipients(self.recipients_view()));
        }
    }

    // -- Submission --

    /// Validate the whole form and build the submission payload.
    ///
    /// Every visible non-empty field is validated explicitly, so errors show
    /// up on the offending fields as a side effect.
    pub fn check_submission(&mut self) -> Result<Submission, SubmissionError> {
        // Typed text that never went through a blur still has to claim its
        // name, so a second holder of the same player ends up in conflict.
        let visible = self.visible_fields();
        for field in &visible {
            let outcome = match self.fields.get_mut(field) {
                Some(ctl) => ctl.commit_value(&mut self.registry),
                None => None,
            };
            self.after_commit(*field, outcome);
        }

        let mut invalid = false;
        for field in visible {
            let required = self.is_required(&field);
            let Some(ctl) = self.fields.get_mut(&field) else {
                continue;
            };
            ctl.refresh_if_stale(&self.registry);
            if ctl.value().trim().is_empty() {
                continue;
            }
            if !ctl.validate_explicit(&self.registry, required).valid {
                invalid = true;
            }
            self.outbox.push(UiUpdate::Field(ctl.view()));
        }
        if invalid {
            return Err(SubmissionError::InvalidNames);
        }

        let teams = self.complete_teams();
        if teams.len() < self.min_complete_teams {
            return Err(SubmissionError::TooFewTeams {
                required: self.min_complete_teams,
                found: teams.len(),
            });
        }

        let mut recipients = Vec::new();
        if self.ace_pot_paid {
            for row in &self.recipient_rows {
                if let Some(ctl) = self.fields.get(&FieldId::recipient(*row)) {
                    if !ctl.value().trim().is_empty() {
                        recipients.push(self.canonical_name(ctl.value()));
                    }
                }
            }
            if recipients.is_empty() {
                if let Some(first) = self.recipient_rows.first() {
                    let field = FieldId::recipient(*first);
                    if let Some(ctl) = self.fields.get_mut(&field) {
                        ctl.validate_explicit(&self.registry, true);
                        self.outbox.push(UiUpdate::Field(ctl.view()));
                    }
                }
                return Err(SubmissionError::MissingRecipient);
            }
        }

        Ok(Submission {
            teams,
            ace_pot_paid: self.ace_pot_paid,
            recipients,
            pot: self.pot.state(),
        })
    }

    fn submit(&mut self) {
        match self.check_submission() {
            Ok(submission) => {
                info!(
                    "Submission ready: {} teams, {} recipients",
                    submission.teams.len(),
                    submission.recipients.len()
                );
                self.pot.rebase();
                self.push_pot();
                self.outbox.push(UiUpdate::SubmissionReady(Box::new(submission)));
            }
            Err(e) => {
                info!("Submission blocked: {}", e);
                self.outbox.push(UiUpdate::SubmissionBlocked(e.to_string()));
            }
        }
    }

    // -- Internals --

    fn push_team_row(&mut self) -> RowId {
        let row = RowId(self.next_team_row);
        self.next_team_row += 1;
        for field in [FieldId::player1(row), FieldId::player2(row)] {
            self.fields
                .insert(field, FieldController::new(field, PickerKind::Team));
        }
        self.scores.insert(row, String::new());
        self.team_rows.push(row);
        row
    }

    fn after_commit(&mut self, field: FieldId, outcome: Option<CommitOutcome>) {
        let Some(outcome) = outcome else {
            return;
        };
        if let CommitStatus::Conflict { holder } = &outcome.status {
            debug!("{} refused a name already held by {}", field, holder);
        }
        if !matches!(outcome.status, CommitStatus::Inserted(_))
            && self.pot.set_buy_in(field, "", false)
        {
            info!("{} no longer holds a player; buy-in withdrawn", field);
            self.push_pot();
            self.outbox.push(UiUpdate::Rows(self.rows_view()));
        }
        if let Some(change) = outcome.change {
            self.propagate(field, &change);
        }
    }

    /// Fan a registry change out to every other field. Team pickers refresh
    /// lazily; recipients whose name left the registry are cleared now.
    fn propagate(&mut self, source: FieldId, change: &RegistryChange) {
        for (id, ctl) in self.fields.iter_mut() {
            if *id != source {
                ctl.mark_stale();
            }
        }

        let removed: HashSet<String> = change.removed.iter().map(|n| normalize(n)).collect();
        for row in &self.recipient_rows {
            let Some(ctl) = self.fields.get_mut(&FieldId::recipient(*row)) else {
                continue;
            };
            if removed.contains(&normalize(ctl.value())) {
                info!("Clearing recipient {}: no longer a participant", ctl.value());
                ctl.clear();
                self.outbox.push(UiUpdate::Field(ctl.view()));
            }
        }

        debug!(
            "Registry revision {}: +{:?} -{:?}",
            change.revision, change.added, change.removed
        );
        self.outbox
            .push(UiUpdate::Participants(self.registry.snapshot()));
    }

    fn is_required(&self, field: &FieldId) -> bool {
        !field.is_recipient() || self.ace_pot_paid
    }

    /// Player fields in row order, then recipients while the pot is paid.
    fn visible_fields(&self) -> Vec<FieldId> {
        let mut fields: Vec<FieldId> = self
            .team_rows
            .iter()
            .flat_map(|row| [FieldId::player1(*row), FieldId::player2(*row)])
            .collect();
        if self.ace_pot_paid {
            fields.extend(self.recipient_rows.iter().map(|row| FieldId::recipient(*row)));
        }
        fields
    }

    fn complete_teams(&self) -> Vec<SubmittedTeam> {
        let mut teams = Vec::new();
        for (index, row) in self.team_rows.iter().enumerate() {
            let p1 = FieldId::player1(*row);
            let p2 = FieldId::player2(*row);
            let (Some(a), Some(b)) = (self.fields.get(&p1), self.fields.get(&p2)) else {
                continue;
            };
            let filled = |ctl: &FieldController| ctl.is_valid() && !ctl.value().trim().is_empty();
            if !filled(a) || !filled(b) {
                continue;
            }
            let score = match self.scores.get(row).map(|s| s.parse::<u32>()) {
                Some(Ok(score)) if score >= 1 => score,
                _ => continue,
            };
            teams.push(SubmittedTeam {
                position: index + 1,
                players: [self.canonical_name(a.value()), self.canonical_name(b.value())],
                score,
                ace_pot_buy_ins: [self.pot.is_opted_in(&p1), self.pot.is_opted_in(&p2)],
            });
        }
        teams
    }

    /// Roster spelling of `name`, or the trimmed text for the sentinel.
    fn canonical_name(&self, name: &str) -> String {
        self.registry
            .roster()
            .canonical(name)
            .map(str::to_string)
            .unwrap_or_else(|| name.trim().to_string())
    }

    fn rows_view(&self) -> Vec<RowView> {
        self.team_rows
            .iter()
            .enumerate()
            .map(|(index, row)| RowView {
                row: *row,
                position: index + 1,
                score: self.scores.get(row).cloned().unwrap_or_default(),
                player1_buy_in: self.pot.is_opted_in(&FieldId::player1(*row)),
                player2_buy_in: self.pot.is_opted_in(&FieldId::player2(*row)),
            })
            .collect()
    }

    fn recipients_view(&self) -> RecipientsView {
        RecipientsView {
            visible: self.ace_pot_paid,
            rows: self.recipient_rows.clone(),
        }
    }

    fn push_pot(&mut self) {
        let projection = self.pot.project();
        self.outbox.push(UiUpdate::Pot(PotView::new(
            projection.state,
            projection.change,
            self.pot.opted_in_count(),
        )));
    }

    /// Queue a full redraw of the form.
    pub fn publish_all(&mut self) {
        let views: Vec<UiUpdate> = self
            .fields
            .values()
            .map(|ctl| UiUpdate::Field(ctl.view()))
            .collect();
        self.outbox.extend(views);
        self.outbox.push(UiUpdate::Rows(self.rows_view()));
        self.outbox.push(UiUpdate::Recipients(self.recipients_view()));
        self.push_pot();
        self.outbox
            .push(UiUpdate::Participants(self.registry.snapshot()));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
