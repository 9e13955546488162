//! Error taxonomy shared across the core and its collaborators.

use std::path::PathBuf;

/// Errors produced by workspace discovery, the log store, the plugin host,
/// and the command runner. Core algorithms (history model, decision engine)
/// are pure and never return this type.
#[derive(Debug, thiserror::Error)]
pub enum WatError {
    #[error("no .wat workspace found above {0}")]
    NoWorkspaceRoot(PathBuf),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("command cancelled or timed out")]
    CancelledOrTimedOut,

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("plugin {name} failed: {source}")]
    PluginFailure {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, WatError>;
