//! Error types for the transaction log.

use strata_mtree::MtreeError;
use strata_types::entry::CodecError;

/// Errors that can occur during transaction log operations.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TxLogError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No transaction with that id has been committed.
    #[error("transaction {0} not found")]
    TxNotFound(u64),

    /// The transaction exists but holds no entry with the requested key.
    #[error("no entry for key in transaction {tx}")]
    EntryNotFound {
        /// The transaction that was searched.
        tx: u64,
    },

    /// An append was attempted with no entries.
    #[error("empty transaction")]
    EmptyTransaction,

    /// The persisted log contradicts itself (gap or broken Alh chain).
    #[error("corrupted transaction log: {0}")]
    Corrupted(String),

    /// Entry encoding / digest-scheme error.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Merkle tree error.
    #[error("merkle error: {0}")]
    Mtree(#[from] MtreeError),
}

impl From<postcard::Error> for TxLogError {
    fn from(e: postcard::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
