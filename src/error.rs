use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised while loading the watch-list, scanning, or persisting state.
#[derive(Error, Debug)]
pub enum WatchError {
    /// A ports line matched the grammar but named a different host than the
    /// status line it follows.
    #[error(
        "ports line for {ports_address} ({ports_hostname}) does not match status line for {address} ({hostname})"
    )]
    ParseInconsistency {
        address: String,
        hostname: String,
        ports_address: String,
        ports_hostname: String,
    },

    /// A steady-state scan reported an address outside the fixed watch-list.
    #[error("scan reported unknown host {address}")]
    UnknownHost { address: String },

    #[error("failed to start scanner '{program}': {source}")]
    ScanSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("scanner '{program}' exited with {status}: {stderr}")]
    ScanExit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("failed to read host list {path}: {source}")]
    HostListRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid host list {path}: {source}")]
    HostListFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = WatchError> = std::result::Result<T, E>;
