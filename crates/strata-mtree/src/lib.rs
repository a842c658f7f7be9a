//! Merkle tree and proof machinery for the strata transaction log.
//!
//! Two proof kinds bind client observations to the append-only log:
//!
//! - **Inclusion proof** — a sibling path from an entry digest to its
//!   transaction's Merkle root (`EH`), see [`inclusion_proof`] /
//!   [`verify_inclusion`].
//! - **Dual proof** — evidence that one transaction header is a prefix of
//!   the log at another, built by chaining Alh values through the header
//!   lineage, see [`DualProof`] / [`verify_dual`].

mod dual;
mod error;
mod htree;

#[cfg(test)]
mod tests;

pub use dual::{DualProof, verify_dual};
pub use error::MtreeError;
pub use htree::{InclusionProof, entries_root, inclusion_proof, verify_inclusion};
