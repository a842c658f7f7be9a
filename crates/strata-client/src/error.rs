//! Error types for the client crate.

use std::path::PathBuf;

/// Errors that can occur in the client state cache and verification.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A state record in the middle of a file doesn't parse.
    #[error("corrupt state record in {path}")]
    CorruptState {
        /// The offending state file.
        path: PathBuf,
    },

    /// The server's dual proof does not chain the cached state to the
    /// claimed one.
    #[error("dual proof verification failed for db `{db}`")]
    ProofVerificationFailed {
        /// Database the proof was for.
        db: String,
    },

    /// The server claims an older tip than the client has already seen.
    #[error("server state regressed for db `{db}`: cached tx {cached}, claimed tx {claimed}")]
    StateRegression {
        /// Database name.
        db: String,
        /// Tx id the client has cached.
        cached: u64,
        /// Tx id the server claims.
        claimed: u64,
    },

    /// The server claims the same tip with a different hash.
    #[error("conflicting state for db `{db}` at tx {tx_id}")]
    StateConflict {
        /// Database name.
        db: String,
        /// The disputed tx id.
        tx_id: u64,
    },
}

impl From<postcard::Error> for ClientError {
    fn from(e: postcard::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
