//! Error types for the engine.

use strata_index::IndexError;
use strata_mtree::MtreeError;
use strata_txlog::TxLogError;
use strata_types::entry::CodecError;

/// Errors surfaced by the engine's public operations.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Malformed request: empty or oversized key, impossible
    /// bound/at_tx combination, `prove_since_tx` outside `[1, tip]`.
    #[error("illegal arguments")]
    IllegalArguments,

    /// The requested or referenced key has no committed version.
    #[error("key not found")]
    KeyNotFound,

    /// A well-formed precondition evaluated to false.
    #[error("constraint failed on key `{}`", .key.escape_ascii())]
    ConstraintFailed {
        /// The key whose requirement did not hold.
        key: Vec<u8>,
    },

    /// The precondition list violates shape rules.
    #[error("invalid constraints")]
    InvalidConstraints,

    /// A reference may not point at its own key.
    #[error("final key cannot be converted into a reference")]
    FinalKeyCannotBeConvertedIntoReference,

    /// The referenced key resolves to a reference entry.
    #[error("referenced key cannot be a reference")]
    ReferencedKeyCannotBeAReference,

    /// A post-append failure put the store into read-only mode.
    #[error("store is in read-only degraded mode")]
    Degraded,

    /// The writer task is gone; the database is shutting down.
    #[error("writer task unavailable")]
    WriterUnavailable,

    /// Transaction log error.
    #[error("txlog error: {0}")]
    TxLog(#[from] TxLogError),

    /// Index error.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Merkle tree error.
    #[error("merkle error: {0}")]
    Mtree(#[from] MtreeError),

    /// Entry encoding error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}
