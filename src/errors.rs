// src/errors.rs

//! Crate-wide error type and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegenError {
    #[error("glob watch file '{0}' not found")]
    WatchFileNotFound(String),

    #[error("parsing glob watch file '{path}': unsupported glob watch file schema '{tag}'")]
    UnsupportedWatchFileSchema { path: String, tag: String },

    #[error("loading glob watch file '{path}': {source}")]
    WatchFileUnreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("stat({path}): {source}")]
    StatFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("subcommand failed")]
    CommandFailed { code: i32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RegenError>;

/// Format a fatal error the way the process exit path reports it.
///
/// All manifest-phase failures surface as a single diagnostic line:
/// `ninja: error: rebuilding '<manifest>': <cause>`.
pub fn fatal_line(manifest: &str, err: &RegenError) -> String {
    format!("ninja: error: rebuilding '{manifest}': {err}")
}
