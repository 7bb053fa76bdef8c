//! Error types for the service plumbing.
//!
//! Outcomes of user code (compile failures, crashes, timeouts) are not errors;
//! they are values of [`crate::result::ExecutionResult`].

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create workspace {path}: {source}")]
    WorkspaceCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {name} into workspace: {source}")]
    WorkspaceWrite {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid allowed origin {0:?}")]
    InvalidOrigin(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
