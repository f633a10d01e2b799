// Assembling the session seed from the command line and configuration.
//
// The seed file is the JSON form of `RawSeed`. When it carries no roster,
// the CSV named by `[data] roster_path` is used instead. A broken roster
// file is logged and skipped; a missing or unreadable seed file is an error.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use leaguedesk_core::bootstrap::{parse_seed, RawSeed, SessionSeed};
use leaguedesk_core::config::Config;
use leaguedesk_core::roster::Roster;

/// Read a `RawSeed` from a JSON file.
pub fn read_raw_seed(path: &Path) -> anyhow::Result<RawSeed> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse seed file {}", path.display()))
}

/// Build the seed for a new form session.
pub fn build_seed(config: &Config, seed_path: Option<&Path>) -> anyhow::Result<SessionSeed> {
    let raw = match seed_path {
        Some(path) => read_raw_seed(path)?,
        None => RawSeed::default(),
    };
    let mut seed = parse_seed(&raw);

    if seed.roster.is_empty() {
        if let Some(path) = config.data.roster_path.as_deref() {
            seed.roster = load_roster(Path::new(path));
        }
    }

    info!(
        "Seed ready: {} roster names, {} pre-populated teams",
        seed.roster.len(),
        seed.teams.len()
    );
    Ok(seed)
}

fn load_roster(path: &Path) -> Roster {
    match Roster::load_csv(path) {
        Ok(roster) => {
            info!("Loaded {} players from {}", roster.len(), path.display());
            roster
        }
        Err(e) => {
            warn!("Ignoring roster file: {}", e);
            Roster::default()
        }
    }
}

/// First positional argument, if any.
pub fn seed_path_from_args<I: IntoIterator<Item = String>>(args: I) -> Option<PathBuf> {
    args.into_iter().nth(1).map(PathBuf::from)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use leaguedesk_core::money::Money;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("leaguedesk-startup-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn no_seed_file_gives_empty_seed() {
        let seed = build_seed(&Config::default(), None).unwrap();
        assert!(seed.roster.is_empty());
        assert!(seed.teams.is_empty());
        assert_eq!(seed.team_count, None);
    }

    #[test]
    fn seed_file_is_parsed() {
        let path = temp_file(
            "seed.json",
            r#"{"players": "[\"Alice\", \"Bob\"]", "pot_total": "$81.00"}"#,
        );
        let seed = build_seed(&Config::default(), Some(&path)).unwrap();
        assert_eq!(seed.roster.names(), ["Alice", "Bob"]);
        assert_eq!(seed.pot.total, Some(Money::from_dollars(81)));
    }

    #[test]
    fn roster_csv_fills_empty_roster() {
        let csv = temp_file("roster.csv", "name\nCarol\nDave\n");
        let mut config = Config::default();
        config.data.roster_path = Some(csv.to_string_lossy().into_owned());
        let seed = build_seed(&config, None).unwrap();
        assert_eq!(seed.roster.names(), ["Carol", "Dave"]);
    }

    #[test]
    fn broken_roster_path_is_skipped() {
        let mut config = Config::default();
        config.data.roster_path = Some("/nonexistent/leaguedesk/roster.csv".into());
        let seed = build_seed(&config, None).unwrap();
        assert!(seed.roster.is_empty());
    }

    #[test]
    fn missing_seed_file_is_an_error() {
        let result = build_seed(&Config::default(), Some(Path::new("/nonexistent/seed.json")));
        assert!(result.is_err());
    }

    #[test]
    fn seed_path_is_first_argument() {
        let args = vec!["leaguedesk".to_string(), "seed.json".to_string()];
        assert_eq!(seed_path_from_args(args), Some(PathBuf::from("seed.json")));
        assert_eq!(seed_path_from_args(vec!["leaguedesk".to_string()]), None);
    }
}
