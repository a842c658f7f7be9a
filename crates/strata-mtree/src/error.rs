//! Error types for the mtree crate.

/// Errors that can occur building proofs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MtreeError {
    /// A Merkle root or proof was requested over zero digests.
    #[error("empty transaction has no merkle tree")]
    EmptyTree,

    /// The requested leaf is outside the tree.
    #[error("leaf {leaf} out of range for tree width {width}")]
    LeafOutOfRange {
        /// Requested leaf index.
        leaf: u32,
        /// Number of leaves in the tree.
        width: u32,
    },
}
