// Ace pot accounting.
//
// One whole contribution unit per opted-in player. The running total is split
// into a capped current balance and an overflow reserve.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entry::FieldId;
use crate::money::Money;

/// Balance of the pot under a cap.
///
/// Always `current == min(total, cap)` and `reserve == max(0, total - cap)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotState {
    pub current: Money,
    pub reserve: Money,
    pub total: Money,
    pub cap: Money,
}

impl PotState {
    pub fn split(total: Money, cap: Money) -> Self {
        PotState {
            current: total.min(cap),
            reserve: (total - cap).max(Money::ZERO),
            total,
            cap,
        }
    }
}

/// Direction of the projected total relative to the displayed baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotChange {
    Increase,
    Decrease,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotProjection {
    pub state: PotState,
    pub baseline: Money,
    pub change: PotChange,
}

/// Figures read off the page at startup. Any of them may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotFigures {
    pub current: Option<Money>,
    pub reserve: Option<Money>,
    pub total: Option<Money>,
    pub cap: Option<Money>,
}

impl PotFigures {
    /// An explicit total wins; otherwise current + reserve; otherwise zero.
    pub fn starting_total(&self) -> Money {
        match (self.total, self.current, self.reserve) {
            (Some(total), _, _) => total,
            (None, None, None) => Money::ZERO,
            (None, current, reserve) => {
                current.unwrap_or(Money::ZERO) + reserve.unwrap_or(Money::ZERO)
            }
        }
    }
}

/// One applied contribution unit, kept in memory for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionEntry {
    pub at: DateTime<Utc>,
    pub description: String,
    pub amount: Money,
}

#[derive(Debug, Clone)]
pub struct PotAccumulator {
    cap: Money,
    unit: Money,
    total: Money,
    baseline: Money,
    /// Opted-in fields and the name each was opted in under.
    opted_in: BTreeMap<FieldId, String>,
    ledger: Vec<ContributionEntry>,
}

impl PotAccumulator {
    pub fn new(starting_total: Money, cap: Money, unit: Money) -> Self {
        PotAccumulator {
            cap,
            unit,
            total: starting_total,
            baseline: starting_total,
            opted_in: BTreeMap::new(),
            ledger: Vec::new(),
        }
    }

    /// Build from page figures; a cap in the figures overrides `default_cap`.
    pub fn from_figures(figures: &PotFigures, default_cap: Money, unit: Money) -> Self {
        let total = figures.starting_total();
        let cap = figures.cap.unwrap_or(default_cap);
        debug!("Pot starts at {} under cap {}", total, cap);
        PotAccumulator::new(total, cap, unit)
    }

    pub fn cap(&self) -> Money {
        self.cap
    }

    pub fn unit(&self) -> Money {
        self.unit
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn state(&self) -> PotState {
        PotState::split(self.total, self.cap)
    }

    pub fn is_opted_in(&self, field: &FieldId) -> bool {
        self.opted_in.contains_key(field)
    }

    pub fn opted_in_count(&self) -> usize {
        self.opted_in.len()
    }

    pub fn ledger(&self) -> &[ContributionEntry] {
        &self.ledger
    }

    /// Move the total by `units` whole contributions (normally +1 or -1).
    pub fn apply_contribution(&mut self, units: i64) {
        let description = if units >= 0 {
            "Ace pot buy-in"
        } else {
            "Ace pot buy-in withdrawn"
        };
        self.apply(units, description.to_string());
    }

    /// Opt `field` in or out. Only a real transition moves the total, so
    /// repeating the same toggle is a no-op. Returns whether anything changed.
    pub fn set_buy_in(&mut self, field: FieldId, name: &str, opted_in: bool) -> bool {
        match (opted_in, self.opted_in.contains_key(&field)) {
            (true, false) => {
                let name = name.trim().to_string();
                let description = if name.is_empty() {
                    format!("Ace pot buy-in: {}", field)
                } else {
                    format!("Ace pot buy-in: {}", name)
                };
                self.opted_in.insert(field, name);
                self.apply(1, description);
                true
            }
            (false, true) => {
                let prior = self.opted_in.remove(&field).unwrap_or_default();
                let who = if prior.is_empty() {
                    field.to_string()
                } else {
                    prior
                };
                self.apply(-1, format!("Ace pot buy-in withdrawn: {}", who));
                true
            }
            _ => false,
        }
    }

    pub fn project(&self) -> PotProjection {
        let change = match self.total.cmp(&self.baseline) {
            std::cmp::Ordering::Greater => PotChange::Increase,
            std::cmp::Ordering::Less => PotChange::Decrease,
            std::cmp::Ordering::Equal => PotChange::Unchanged,
        };
        PotProjection {
            state: self.state(),
            baseline: self.baseline,
            change,
        }
    }

    /// Adopt the current total as the displayed baseline.
    pub fn rebase(&mut self) {
        self.baseline = self.total;
    }

    fn apply(&mut self, units: i64, description: String) {
        let amount = Money::from_cents(self.unit.cents() * units);
        self.total += amount;
        if self.total.is_negative() {
            warn!("Ace pot total went negative: {}", self.total);
        }
        debug!("{} ({}), total now {}", description, amount, self.total);
        self.ledger.push(ContributionEntry {
            at: Utc::now(),
            description,
            amount,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::RowId;

    fn dollars(d: i64) -> Money {
        Money::from_dollars(d)
    }

    fn pot(total: i64) -> PotAccumulator {
        PotAccumulator::new(dollars(total), dollars(100), dollars(1))
    }

    #[test]
    fn split_keeps_current_plus_reserve_equal_to_total() {
        for cents in [0, 1, 9_999, 10_000, 10_001, 25_050] {
            let s = PotState::split(Money::from_cents(cents), dollars(100));
            assert_eq!(s.current + s.reserve, s.total);
            assert!(s.current <= s.cap);
            assert!(!s.reserve.is_negative());
        }
    }

    #[test]
    fn opt_in_and_out_scenario() {
        let mut p = pot(80);
        let a = FieldId::player1(RowId(0));
        let b = FieldId::player2(RowId(0));

        assert!(p.set_buy_in(a, "Alice", true));
        assert_eq!(p.state().current, dollars(81));
        assert_eq!(p.project().change, PotChange::Increase);

        assert!(p.set_buy_in(b, "Bob", true));
        assert_eq!(p.state().current, dollars(82));

        assert!(p.set_buy_in(a, "Alice", false));
        let proj = p.project();
        assert_eq!(proj.state.current, dollars(81));
        assert_eq!(proj.state.reserve, Money::ZERO);
        assert_eq!(proj.baseline, dollars(80));
    }

    #[test]
    fn overflow_goes_to_reserve() {
        let mut p = pot(100);
        p.apply_contribution(1);
        let s = p.state();
        assert_eq!(s.current, dollars(100));
        assert_eq!(s.reserve, dollars(1));
        assert_eq!(s.total, dollars(101));
    }

    #[test]
    fn repeated_toggle_is_idempotent() {
        let mut p = pot(10);
        let f = FieldId::player1(RowId(2));
        assert!(p.set_buy_in(f, "Carol", true));
        assert!(!p.set_buy_in(f, "Carol", true));
        assert_eq!(p.total(), dollars(11));

        assert!(p.set_buy_in(f, "Carol", false));
        assert!(!p.set_buy_in(f, "Carol", false));
        assert_eq!(p.total(), dollars(10));
        assert_eq!(p.project().change, PotChange::Unchanged);
    }

    #[test]
    fn rebase_resets_the_change_direction() {
        let mut p = pot(50);
        p.apply_contribution(1);
        p.rebase();
        assert_eq!(p.project().change, PotChange::Unchanged);
        p.apply_contribution(-1);
        assert_eq!(p.project().change, PotChange::Decrease);
    }

    #[test]
    fn ledger_records_each_unit() {
        let mut p = pot(0);
        let f = FieldId::player2(RowId(1));
        p.set_buy_in(f, "Dave", true);
        p.set_buy_in(f, "Dave", false);
        let entries = p.ledger();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description, "Ace pot buy-in: Dave");
        assert_eq!(entries[0].amount, dollars(1));
        assert_eq!(entries[1].amount, dollars(-1));
    }

    #[test]
    fn starting_total_prefers_explicit_total() {
        let figures = PotFigures {
            current: Some(dollars(100)),
            reserve: Some(dollars(5)),
            total: Some(dollars(90)),
            cap: None,
        };
        assert_eq!(figures.starting_total(), dollars(90));

        let figures = PotFigures {
            total: None,
            ..figures
        };
        assert_eq!(figures.starting_total(), dollars(105));

        assert_eq!(PotFigures::default().starting_total(), Money::ZERO);
    }

    #[test]
    fn figures_cap_overrides_default() {
        let figures = PotFigures {
            total: Some(dollars(120)),
            cap: Some(dollars(50)),
            ..PotFigures::default()
        };
        let p = PotAccumulator::from_figures(&figures, dollars(100), dollars(1));
        assert_eq!(p.state().current, dollars(50));
        assert_eq!(p.state().reserve, dollars(70));
    }
}
