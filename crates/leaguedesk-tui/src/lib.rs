// Terminal front end for leaguedesk: startup helpers and the ratatui UI.

pub mod startup;
pub mod tui;
