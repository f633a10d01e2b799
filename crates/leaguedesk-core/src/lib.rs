// Library root: data-entry core for recording league tournaments.
//
// Participant selection (matching, validation, the shared registry and the
// per-field autocomplete controllers), ace pot accounting and the form
// session that ties them together.

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod entry;
pub mod money;
pub mod pot;
pub mod protocol;
pub mod roster;
pub mod session;
