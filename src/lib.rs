//! WAT — "What's the Next Test".
//!
//! Recommends the top-N test commands most worth running next, trading
//! off estimated failure probability against wall-clock cost and biasing
//! toward commands whose file patterns match recently edited files.
//!
//! The core is three subsystems: [`history`] (an online-updatable store of
//! per-command cost and per-condition success/failure history),
//! [`decision`] (the cost-sensitive, correlation-aware ranker built on top
//! of it), and [`trainer`] (a bootstrap step that fuzzes source files to
//! manufacture non-degenerate history before the user has run anything).
//! Everything else — workspace discovery, the `.watignore` matcher, the
//! filesystem walker, the plugin host, the log store, and the command
//! runner — is the supporting cast those three subsystems are built on.

pub mod cleanup;
pub mod decision;
pub mod diagnostics;
pub mod error;
pub mod history;
pub mod ignore;
pub mod plugins;
pub mod runner;
pub mod store;
pub mod trainer;
pub mod types;
pub mod walker;
pub mod workspace;
