// Integration tests for the entry core.
//
// These exercise the public API end to end: seed parsing into a session,
// selection with exclusion across rows, the pot, submission rules and the
// async event loop driving the blur grace delay on a paused clock.

use std::time::Duration;

use leaguedesk_core::app;
use leaguedesk_core::bootstrap::{parse_seed, RawSeed, SessionSeed};
use leaguedesk_core::config::Config;
use leaguedesk_core::entry::validator::ValidationError;
use leaguedesk_core::entry::{FieldId, RowId};
use leaguedesk_core::money::Money;
use leaguedesk_core::pot::PotChange;
use leaguedesk_core::protocol::*;
use leaguedesk_core::roster::{Roster, SENTINEL};
use leaguedesk_core::session::FormSession;

use tokio::sync::mpsc;
use tokio::time::Instant;

// ===========================================================================
// Test helpers
// ===========================================================================

fn p1(row: u32) -> FieldId {
    FieldId::player1(RowId(row))
}

fn p2(row: u32) -> FieldId {
    FieldId::player2(RowId(row))
}

fn session(names: &[&str], rows: usize) -> FormSession {
    let seed = SessionSeed {
        team_count: Some(rows),
        ..SessionSeed::with_roster(Roster::new(names))
    };
    FormSession::new(&Config::default(), seed)
}

fn run(s: &mut FormSession, cmd: SessionCommand) {
    s.handle(cmd, Instant::now());
}

fn pick(s: &mut FormSession, field: FieldId, name: &str) {
    run(s, SessionCommand::Focus(field));
    run(
        s,
        SessionCommand::Select {
            field,
            name: name.into(),
        },
    );
}

fn suggestions(s: &FormSession, field: FieldId) -> Vec<String> {
    s.field(&field)
        .unwrap()
        .results()
        .iter()
        .map(|r| r.candidate.clone())
        .collect()
}

fn last_pot(updates: &[UiUpdate]) -> Option<PotView> {
    updates.iter().rev().find_map(|u| match u {
        UiUpdate::Pot(view) => Some(*view),
        _ => None,
    })
}

// ===========================================================================
// Test: Exclusion and sentinel inclusion
// ===========================================================================

#[test]
fn held_name_is_excluded_from_other_fields() {
    let mut s = session(&["Alice", "Bob", "Carol"], 2);
    pick(&mut s, p1(0), "Alice");

    // "li" isolates exclusion: only Alice matches and the sentinel does not.
    run(&mut s, SessionCommand::Focus(p2(0)));
    run(
        &mut s,
        SessionCommand::Input {
            field: p2(0),
            text: "li".into(),
        },
    );
    assert!(suggestions(&s, p2(0)).is_empty());
}

#[test]
fn sentinel_is_appended_after_roster_matches() {
    let mut s = session(&["Alice", "Bob", "Carol"], 2);
    pick(&mut s, p1(0), "Bob");

    // "o" matches Carol and the sentinel; Bob is held elsewhere.
    run(&mut s, SessionCommand::Focus(p2(1)));
    run(
        &mut s,
        SessionCommand::Input {
            field: p2(1),
            text: "o".into(),
        },
    );
    assert_eq!(suggestions(&s, p2(1)), vec!["Carol".to_string(), SENTINEL.to_string()]);
}

#[test]
fn sentinel_may_fill_many_fields() {
    let mut s = session(&["Alice"], 2);
    for field in [p1(0), p2(0), p1(1)] {
        pick(&mut s, field, SENTINEL);
        assert!(s.field(&field).unwrap().is_valid());
    }
    assert!(s.registry().snapshot().is_empty());
}

// ===========================================================================
// Test: Keyboard selection
// ===========================================================================

#[test]
fn keyboard_navigation_commits_highlighted_name() {
    let mut s = session(&["Alice", "Bob", "Carol"], 1);
    let f = p1(0);
    run(&mut s, SessionCommand::Focus(f));
    run(
        &mut s,
        SessionCommand::Input {
            field: f,
            text: "o".into(),
        },
    );
    for key in [NavKey::Down, NavKey::Down, NavKey::Enter] {
        run(&mut s, SessionCommand::Key { field: f, key });
    }
    assert_eq!(s.field(&f).unwrap().value(), "Carol");
    assert!(s.registry().is_member("Carol"));

    let updates = s.drain_updates();
    assert!(updates.contains(&UiUpdate::Participants(vec!["Carol".into()])));
}

// ===========================================================================
// Test: Ace pot through the session
// ===========================================================================

#[test]
fn pot_scenario_through_seed_and_session() {
    let raw = RawSeed {
        players: Some(r#"["Alice", "Bob", "Carol"]"#.into()),
        initial_team_count: Some("2".into()),
        pot_current: Some("$80.00".into()),
        pot_reserve: Some("$0.00".into()),
        pot_cap: Some("$100.00".into()),
        ..RawSeed::default()
    };
    let mut s = FormSession::new(&Config::default(), parse_seed(&raw));
    pick(&mut s, p1(0), "Alice");
    pick(&mut s, p2(0), "Bob");
    s.drain_updates();

    run(
        &mut s,
        SessionCommand::SetBuyIn {
            field: p1(0),
            opted_in: true,
        },
    );
    let view = last_pot(&s.drain_updates()).unwrap();
    assert_eq!(view.total, Money::from_dollars(81));
    assert_eq!(view.current, Money::from_dollars(81));
    assert_eq!(view.reserve, Money::ZERO);
    assert_eq!(view.change, PotChange::Increase);

    run(
        &mut s,
        SessionCommand::SetBuyIn {
            field: p2(0),
            opted_in: true,
        },
    );
    assert_eq!(last_pot(&s.drain_updates()).unwrap().total, Money::from_dollars(82));

    run(
        &mut s,
        SessionCommand::SetBuyIn {
            field: p1(0),
            opted_in: false,
        },
    );
    let view = last_pot(&s.drain_updates()).unwrap();
    assert_eq!(view.total, Money::from_dollars(81));
    assert_eq!(view.buy_ins, 1);
}

#[test]
fn pot_overflow_beyond_cap_goes_to_reserve() {
    let raw = RawSeed {
        players: Some(r#"["Alice"]"#.into()),
        pot_total: Some("$100.00".into()),
        ..RawSeed::default()
    };
    let mut s = FormSession::new(&Config::default(), parse_seed(&raw));
    pick(&mut s, p1(0), "Alice");
    run(
        &mut s,
        SessionCommand::SetBuyIn {
            field: p1(0),
            opted_in: true,
        },
    );
    let state = s.pot().state();
    assert_eq!(state.current, Money::from_dollars(100));
    assert_eq!(state.reserve, Money::from_dollars(1));
}

// ===========================================================================
// Test: Submission
// ===========================================================================

#[test]
fn one_valid_row_blocks_and_a_second_unblocks() {
    let mut s = session(&["Alice", "Bob", "Carol", "Dave"], 3);
    pick(&mut s, p1(0), "Alice");
    pick(&mut s, p2(0), "Bob");
    run(
        &mut s,
        SessionCommand::SetScore {
            row: RowId(0),
            text: "55".into(),
        },
    );
    s.drain_updates();

    run(&mut s, SessionCommand::Submit);
    let updates = s.drain_updates();
    assert!(updates.contains(&UiUpdate::SubmissionBlocked(
        "At least 2 complete teams are required to record a tournament.".into()
    )));

    pick(&mut s, p1(1), "Carol");
    pick(&mut s, p2(1), "Dave");
    run(
        &mut s,
        SessionCommand::SetScore {
            row: RowId(1),
            text: "60".into(),
        },
    );
    run(&mut s, SessionCommand::Submit);
    let ready = s.drain_updates().into_iter().find_map(|u| match u {
        UiUpdate::SubmissionReady(submission) => Some(submission),
        _ => None,
    });
    let submission = ready.expect("second complete team should unblock submission");
    assert_eq!(submission.teams.len(), 2);
    assert_eq!(submission.teams[0].score, 55);
    assert!(!submission.ace_pot_paid);
}

#[test]
fn invalid_name_blocks_submission_first() {
    let mut s = session(&["Alice", "Bob", "Carol", "Dave"], 3);
    pick(&mut s, p1(0), "Alice");
    pick(&mut s, p2(0), "Bob");
    pick(&mut s, p1(1), "Carol");
    pick(&mut s, p2(1), "Dave");
    s.set_score(RowId(0), "1");
    s.set_score(RowId(1), "2");
    run(
        &mut s,
        SessionCommand::Input {
            field: p1(2),
            text: "Mallory".into(),
        },
    );
    run(&mut s, SessionCommand::Submit);
    let updates = s.drain_updates();
    assert!(updates.contains(&UiUpdate::SubmissionBlocked(
        "Please correct the invalid player names.".into()
    )));
    assert_eq!(
        s.field(&p1(2)).unwrap().error(),
        Some(ValidationError::UnknownIdentifier)
    );
}

// ===========================================================================
// Test: Event loop integration (async, paused clock)
// ===========================================================================

fn field_updates(updates: &[UiUpdate], field: FieldId) -> Vec<FieldView> {
    updates
        .iter()
        .filter_map(|u| match u {
            UiUpdate::Field(view) if view.field == field => Some(view.clone()),
            _ => None,
        })
        .collect()
}

async fn drain(ui_rx: &mut mpsc::Receiver<UiUpdate>) -> Vec<UiUpdate> {
    // Let the loop task run until it is idle again.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    let mut out = Vec::new();
    while let Ok(update) = ui_rx.try_recv() {
        out.push(update);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn blur_surfaces_error_after_grace_delay() {
    let s = session(&["Alice", "Bob"], 1);
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (ui_tx, mut ui_rx) = mpsc::channel(256);
    let handle = tokio::spawn(app::run(cmd_rx, ui_tx, s));
    let f = p1(0);

    cmd_tx.send(SessionCommand::Focus(f)).await.unwrap();
    cmd_tx
        .send(SessionCommand::Input {
            field: f,
            text: "Zed".into(),
        })
        .await
        .unwrap();
    cmd_tx.send(SessionCommand::Blur(f)).await.unwrap();
    let updates = drain(&mut ui_rx).await;
    let last = field_updates(&updates, f).pop().unwrap();
    assert_eq!(last.error, None, "no error before the grace delay");
    assert!(last.open);

    tokio::time::advance(Duration::from_millis(250)).await;
    let updates = drain(&mut ui_rx).await;
    let last = field_updates(&updates, f).pop().unwrap();
    assert_eq!(last.error.as_deref(), Some("Invalid player name"));
    assert!(!last.open);

    cmd_tx.send(SessionCommand::Quit).await.unwrap();
    let session = handle.await.unwrap().unwrap();
    assert_eq!(
        session.field(&f).unwrap().error(),
        Some(ValidationError::UnknownIdentifier)
    );
}

#[tokio::test(start_paused = true)]
async fn refocus_before_grace_delay_suppresses_error() {
    let s = session(&["Alice", "Bob"], 1);
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (ui_tx, mut ui_rx) = mpsc::channel(256);
    let handle = tokio::spawn(app::run(cmd_rx, ui_tx, s));
    let f = p1(0);

    cmd_tx.send(SessionCommand::Focus(f)).await.unwrap();
    cmd_tx
        .send(SessionCommand::Input {
            field: f,
            text: "Zed".into(),
        })
        .await
        .unwrap();
    cmd_tx.send(SessionCommand::Blur(f)).await.unwrap();
    drain(&mut ui_rx).await;

    tokio::time::advance(Duration::from_millis(100)).await;
    cmd_tx.send(SessionCommand::Focus(f)).await.unwrap();
    drain(&mut ui_rx).await;

    tokio::time::advance(Duration::from_millis(500)).await;
    let updates = drain(&mut ui_rx).await;
    assert!(
        field_updates(&updates, f).iter().all(|v| v.error.is_none()),
        "refocus should discard the pending validation"
    );

    cmd_tx.send(SessionCommand::Quit).await.unwrap();
    let session = handle.await.unwrap().unwrap();
    assert_eq!(session.field(&f).unwrap().error(), None);
    assert_eq!(session.next_deadline(), None);
}

#[tokio::test]
async fn event_loop_exits_when_command_channel_closes() {
    let s = session(&["Alice"], 1);
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (ui_tx, mut ui_rx) = mpsc::channel(256);
    let handle = tokio::spawn(app::run(cmd_rx, ui_tx, s));

    // Initial redraw arrives first.
    let first = ui_rx.recv().await.unwrap();
    assert!(matches!(first, UiUpdate::Field(_)));

    drop(cmd_tx);
    let result = handle.await.unwrap();
    assert!(result.is_ok());
}
