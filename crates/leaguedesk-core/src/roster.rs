// Roster of known player names and the Ghost Player sentinel.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Placeholder identifier that is always a valid selection and may appear in
/// any number of fields at once.
pub const SENTINEL: &str = "Ghost Player";

/// Identity-normalized form of a name: trimmed and lowercased.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Whether `name` is the sentinel, compared case-insensitively after trimming.
pub fn is_sentinel(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(SENTINEL)
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read roster file {path}: {source}")]
    Read { path: PathBuf, source: csv::Error },

    #[error("roster file {path} has no `name` column")]
    MissingNameColumn { path: PathBuf },
}

/// The fixed, ordered list of known players for one form session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    names: Vec<String>,
}

impl Roster {
    /// Build a roster from raw names.
    ///
    /// Names are trimmed. Blank entries, the sentinel and case-insensitive
    /// duplicates are dropped; the first spelling wins.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        for raw in names {
            let name = raw.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if is_sentinel(name) {
                debug!("Dropping sentinel from roster input");
                continue;
            }
            if !seen.insert(normalize(name)) {
                warn!("Duplicate roster entry ignored: '{}'", name);
                continue;
            }
            kept.push(name.to_string());
        }
        Roster { names: kept }
    }

    /// Load a roster from a CSV file with a header row.
    ///
    /// Uses the `name` column when present (case-insensitive header match),
    /// otherwise the file must have exactly one column.
    pub fn load_csv(path: &Path) -> Result<Self, RosterError> {
        let read_err = |source| RosterError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(read_err)?;

        let headers = reader.headers().map_err(read_err)?.clone();
        let column = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case("name"))
            .or(if headers.len() == 1 { Some(0) } else { None })
            .ok_or_else(|| RosterError::MissingNameColumn {
                path: path.to_path_buf(),
            })?;

        let mut names = Vec::new();
        for record in reader.records() {
            let record = record.map_err(read_err)?;
            if let Some(name) = record.get(column) {
                names.push(name.to_string());
            }
        }

        let roster = Roster::new(names);
        debug!("Loaded {} roster names from {}", roster.len(), path.display());
        Ok(roster)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The roster's own spelling of `name`, matched case-insensitively.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        let wanted = normalize(name);
        if wanted.is_empty() {
            return None;
        }
        self.names
            .iter()
            .find(|n| normalize(n) == wanted)
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.canonical(name).is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_drops_blanks_sentinel_and_duplicates() {
        let roster = Roster::new(["Alice", "  ", "ghost player", "Bob", "alice ", " Carol"]);
        assert_eq!(roster.names(), &["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn canonical_is_case_insensitive() {
        let roster = Roster::new(["Alice", "Bob"]);
        assert_eq!(roster.canonical("  aLiCe "), Some("Alice"));
        assert_eq!(roster.canonical("Al"), None);
        assert_eq!(roster.canonical(""), None);
        assert!(roster.contains("BOB"));
    }

    #[test]
    fn sentinel_detection_ignores_case_and_padding() {
        assert!(is_sentinel("Ghost Player"));
        assert!(is_sentinel("  GHOST player "));
        assert!(!is_sentinel("Ghost"));
    }

    #[test]
    fn load_csv_reads_name_column() {
        let dir = std::env::temp_dir().join(format!("leaguedesk-roster-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("players.csv");
        std::fs::write(&path, "rating,Name\n1000,Alice\n950, Bob \n900,alice\n").unwrap();

        let roster = Roster::load_csv(&path).unwrap();
        assert_eq!(roster.names(), &["Alice", "Bob"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_csv_without_name_column_fails() {
        let dir = std::env::temp_dir().join(format!("leaguedesk-roster-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("players.csv");
        std::fs::write(&path, "rating,club\n1000,yes\n").unwrap();

        let err = Roster::load_csv(&path).unwrap_err();
        assert!(matches!(err, RosterError::MissingNameColumn { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }
}
