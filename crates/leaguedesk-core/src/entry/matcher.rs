// Substring name matching for suggestion lists.
//
// Case-insensitive, order-preserving, no ranking. The sentinel is matched by
// the same rule and always listed last.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::roster::{is_sentinel, normalize, SENTINEL};

/// One suggestion with the span of the query inside it.
///
/// Offsets are in characters of `candidate`, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub candidate: String,
    pub match_start: usize,
    pub match_len: usize,
}

impl MatchResult {
    /// Split the candidate into (before, matched, after) for highlighting.
    pub fn segments(&self) -> (String, String, String) {
        let chars: Vec<char> = self.candidate.chars().collect();
        let start = self.match_start.min(chars.len());
        let end = (self.match_start + self.match_len).min(chars.len());
        (
            chars[..start].iter().collect(),
            chars[start..end].iter().collect(),
            chars[end..].iter().collect(),
        )
    }
}

/// Match `query` against `candidates`.
///
/// Returns an empty list when the trimmed query is empty. Candidates keep
/// their input order and case-insensitive duplicates are emitted once. When
/// `include_sentinel` is set and the sentinel text contains the query, it is
/// appended after every other match; a sentinel inside `candidates` is
/// ignored so it can never appear mid-list.
pub fn match_names<S: AsRef<str>>(
    query: &str,
    candidates: &[S],
    include_sentinel: bool,
) -> Vec<MatchResult> {
    let needle = lower_chars(query.trim());
    if needle.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut results: Vec<MatchResult> = candidates
        .iter()
        .map(|c| c.as_ref())
        .filter(|name| !is_sentinel(name))
        .filter(|name| seen.insert(normalize(name)))
        .filter_map(|name| find_span(name, &needle))
        .collect();

    if include_sentinel {
        if let Some(ghost) = find_span(SENTINEL, &needle) {
            results.push(ghost);
        }
    }

    results
}

/// List every candidate with an empty highlight, deduplicated, in order.
pub fn list_all<S: AsRef<str>>(candidates: &[S]) -> Vec<MatchResult> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .map(|c| c.as_ref())
        .filter(|name| seen.insert(normalize(name)))
        .map(|name| MatchResult {
            candidate: name.to_string(),
            match_start: 0,
            match_len: 0,
        })
        .collect()
}

/// Per-char lowercase, the same folding `find_span` applies to candidates.
/// Unlike `str::to_lowercase` it ignores final-sigma context.
fn lower_chars(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Locate the lowercase `needle` inside `name`, reporting char offsets of the
/// original string. Lowercasing may expand a char, so every lowered char
/// remembers which original char produced it.
fn find_span(name: &str, needle: &str) -> Option<MatchResult> {
    let mut lowered = String::with_capacity(name.len());
    let mut origin: Vec<usize> = Vec::with_capacity(name.len());
    for (idx, ch) in name.chars().enumerate() {
        for lc in ch.to_lowercase() {
            lowered.push(lc);
            origin.push(idx);
        }
    }

    let byte_pos = lowered.find(needle)?;
    let first = lowered[..byte_pos].chars().count();
    let needle_chars = needle.chars().count();
    let last = first + needle_chars - 1;

    let start = origin[first];
    let end = origin[last] + 1;
    Some(MatchResult {
        candidate: name.to_string(),
        match_start: start,
        match_len: end - start,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
