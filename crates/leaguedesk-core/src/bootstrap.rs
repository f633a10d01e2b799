// Parsing of the raw initialization input handed over by the page.
//
// Every input is optional and every parse failure falls back to a default
// with a warning. Nothing here is fatal.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::money::Money;
use crate::pot::PotFigures;
use crate::roster::Roster;

/// Initialization input exactly as the host page provides it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSeed {
    /// JSON array of roster names.
    pub players: Option<String>,
    /// JSON array of `{"players": [..], "score": n}`.
    pub pre_populated_teams: Option<String>,
    /// Number of empty team rows to start with.
    pub initial_team_count: Option<String>,
    pub pot_current: Option<String>,
    pub pot_reserve: Option<String>,
    pub pot_total: Option<String>,
    pub pot_cap: Option<String>,
}

/// One pre-populated team row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedTeam {
    pub players: Vec<String>,
    pub score: Option<u32>,
}

/// Parsed initialization input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSeed {
    pub roster: Roster,
    pub teams: Vec<SeedTeam>,
    /// `None` means "use the configured default".
    pub team_count: Option<usize>,
    pub pot: PotFigures,
}

impl SessionSeed {
    /// Seed with just a roster and configured defaults for the rest.
    pub fn with_roster(roster: Roster) -> Self {
        SessionSeed {
            roster,
            ..SessionSeed::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    #[serde(default)]
    players: Vec<Value>,
    #[serde(default)]
    score: Option<Value>,
}

/// Parse `raw`, falling back per input on malformed data.
pub fn parse_seed(raw: &RawSeed) -> SessionSeed {
    let roster = raw
        .players
        .as_deref()
        .map(parse_roster)
        .unwrap_or_default();
    let teams = raw
        .pre_populated_teams
        .as_deref()
        .map(parse_teams)
        .unwrap_or_default();
    let team_count = raw.initial_team_count.as_deref().and_then(parse_team_count);

    let pot = PotFigures {
        current: parse_money("pot_current", raw.pot_current.as_deref(), Money::ZERO),
        reserve: parse_money("pot_reserve", raw.pot_reserve.as_deref(), Money::ZERO),
        total: parse_money("pot_total", raw.pot_total.as_deref(), Money::ZERO),
        cap: parse_money("pot_cap", raw.pot_cap.as_deref(), Money::from_cents(1)),
    };

    debug!(
        "Seed parsed: {} roster names, {} teams, team_count={:?}",
        roster.len(),
        teams.len(),
        team_count
    );
    SessionSeed {
        roster,
        teams,
        team_count,
        pot,
    }
}

/// JSON array of names. Non-string entries are skipped.
pub fn parse_roster(json: &str) -> Roster {
    match serde_json::from_str::<Vec<Value>>(json) {
        Ok(values) => Roster::new(values.iter().filter_map(Value::as_str)),
        Err(e) => {
            warn!("Unparseable roster data, using an empty roster: {}", e);
            Roster::default()
        }
    }
}

/// JSON array of pre-populated teams. Entries without a player are dropped.
pub fn parse_teams(json: &str) -> Vec<SeedTeam> {
    let raw: Vec<RawTeam> = match serde_json::from_str(json) {
        Ok(teams) => teams,
        Err(e) => {
            warn!("Unparseable pre-populated teams, starting without them: {}", e);
            return Vec::new();
        }
    };

    raw.into_iter()
        .filter_map(|team| {
            let players: Vec<String> = team
                .players
                .iter()
                .take(2)
                .map(|p| p.as_str().unwrap_or_default().trim().to_string())
                .collect();
            if players.iter().all(String::is_empty) {
                warn!("Skipping pre-populated team without players");
                return None;
            }
            Some(SeedTeam {
                players,
                score: team.score.as_ref().and_then(parse_score_value),
            })
        })
        .collect()
}

/// Positive integer row count; anything else means "use the default".
pub fn parse_team_count(text: &str) -> Option<usize> {
    match text.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!("Invalid initial team count '{}', using the default", text);
            None
        }
    }
}

fn parse_score_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Largest pot figure accepted from the page. Keeps cap arithmetic far from
/// `i64` overflow.
pub const MAX_POT_FIGURE: Money = Money::from_dollars(1_000_000_000);

/// Money figure in `min..=MAX_POT_FIGURE`; anything else is ignored.
fn parse_money(name: &str, text: Option<&str>, min: Money) -> Option<Money> {
    let text = text?;
    match Money::parse(text) {
        Some(amount) if amount >= min && amount <= MAX_POT_FIGURE => Some(amount),
        Some(amount) => {
            warn!("Out of range {} figure {}, ignoring it", name, amount);
            None
        }
        None => {
            warn!("Invalid {} figure '{}', ignoring it", name, text);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_complete_seed() {
        let raw = RawSeed {
            players: Some(r#"["Alice", "Bob", "Carol"]"#.into()),
            pre_populated_teams: Some(
                r#"[{"players": ["Alice", "Ghost Player"], "score": 54},
                    {"players": ["Bob", "Carol"], "score": "61"}]"#
                    .into(),
            ),
            initial_team_count: Some("4".into()),
            pot_current: Some("$80.00".into()),
            pot_reserve: Some("$0.00".into()),
            pot_total: None,
            pot_cap: Some("$100.00".into()),
        };

        let seed = parse_seed(&raw);
        assert_eq!(seed.roster.names(), ["Alice", "Bob", "Carol"]);
        assert_eq!(seed.teams.len(), 2);
        assert_eq!(seed.teams[0].players, vec!["Alice", "Ghost Player"]);
        assert_eq!(seed.teams[0].score, Some(54));
        assert_eq!(seed.teams[1].score, Some(61));
        assert_eq!(seed.team_count, Some(4));
        assert_eq!(seed.pot.starting_total(), Money::from_dollars(80));
        assert_eq!(seed.pot.cap, Some(Money::from_dollars(100)));
    }

    #[test]
    fn bad_json_falls_back_to_empty() {
        assert!(parse_roster("not json").is_empty());
        assert!(parse_teams("{").is_empty());
        assert!(parse_roster(r#"{"a": 1}"#).is_empty());
    }

    #[test]
    fn roster_skips_non_strings() {
        let roster = parse_roster(r#"["Alice", 7, null, "Bob"]"#);
        assert_eq!(roster.names(), ["Alice", "Bob"]);
    }

    #[test]
    fn teams_without_players_are_dropped() {
        let teams = parse_teams(r#"[{"players": []}, {"score": 3}, {"players": ["Dave"]}]"#);
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].players, vec!["Dave"]);
        assert_eq!(teams[0].score, None);
    }

    #[test]
    fn bad_team_count_uses_default() {
        assert_eq!(parse_team_count("abc"), None);
        assert_eq!(parse_team_count("0"), None);
        assert_eq!(parse_team_count("-2"), None);
        assert_eq!(parse_team_count(" 7 "), Some(7));
    }

    #[test]
    fn bad_money_is_ignored() {
        let raw = RawSeed {
            pot_current: Some("eighty".into()),
            pot_reserve: Some("$5.00".into()),
            ..RawSeed::default()
        };
        let seed = parse_seed(&raw);
        assert_eq!(seed.pot.current, None);
        assert_eq!(seed.pot.starting_total(), Money::from_dollars(5));
    }

    #[test]
    fn out_of_range_pot_figures_fall_back() {
        let raw = RawSeed {
            pot_total: Some("80".into()),
            pot_cap: Some("-5".into()),
            ..RawSeed::default()
        };
        let seed = parse_seed(&raw);
        assert_eq!(seed.pot.cap, None);
        assert_eq!(seed.pot.total, Some(Money::from_dollars(80)));

        let raw = RawSeed {
            pot_current: Some("-10".into()),
            pot_reserve: Some("$3.00".into()),
            pot_cap: Some("$0.00".into()),
            ..RawSeed::default()
        };
        let seed = parse_seed(&raw);
        assert_eq!(seed.pot.current, None);
        assert_eq!(seed.pot.cap, None);
        assert_eq!(seed.pot.starting_total(), Money::from_dollars(3));

        let raw = RawSeed {
            pot_total: Some("5000000000".into()),
            ..RawSeed::default()
        };
        assert_eq!(parse_seed(&raw).pot.total, None);
    }

    #[test]
    fn empty_seed_is_all_defaults() {
        let seed = parse_seed(&RawSeed::default());
        assert!(seed.roster.is_empty());
        assert!(seed.teams.is_empty());
        assert_eq!(seed.team_count, None);
        assert_eq!(seed.pot, PotFigures::default());
    }
}
