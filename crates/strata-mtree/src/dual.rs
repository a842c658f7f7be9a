//! Dual proofs: linking two transaction headers through the Alh chain.
//!
//! A dual proof convinces a client that the transaction it already
//! trusts is a prefix of the log at a later transaction. The proof
//! carries the header lineage between the two; verification re-derives
//! the claimed target Alh from the caller's trusted source Alh, so the
//! server cannot splice, reorder, or rewrite history without breaking
//! the chain.

use serde::{Deserialize, Serialize};
use strata_types::TxHeader;

/// Cryptographic link between two transactions `source ≤ target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualProof {
    /// Header of the transaction the verifier already trusts.
    pub source_header: TxHeader,
    /// Header of the transaction being proven.
    pub target_header: TxHeader,
    /// Headers `source.id + 1 ..= target.id`, in id order.
    pub lineage: Vec<TxHeader>,
}

/// Verify a dual proof.
///
/// `trusted_source_alh` is the verifier's own record of `Alh(source)`
/// (e.g. from its state cache); `claimed_target_alh` is the server's
/// claimed `Alh(target)`. Returns `true` iff the lineage chains the
/// trusted value to the claimed one with dense ids and consistent
/// headers.
pub fn verify_dual(
    proof: &DualProof,
    source_id: u64,
    target_id: u64,
    trusted_source_alh: &[u8; 32],
    claimed_target_alh: &[u8; 32],
) -> bool {
    if source_id == 0 || source_id > target_id {
        return false;
    }
    if proof.source_header.id != source_id || proof.target_header.id != target_id {
        return false;
    }
    if proof.source_header.alh() != *trusted_source_alh {
        return false;
    }
    if proof.lineage.len() as u64 != target_id - source_id {
        return false;
    }

    let mut running = *trusted_source_alh;
    let mut expected_id = source_id;

    for header in &proof.lineage {
        expected_id += 1;
        if header.id != expected_id || header.prev_alh != running {
            return false;
        }
        running = header.alh();
    }

    if let Some(last) = proof.lineage.last()
        && *last != proof.target_header
    {
        return false;
    }

    running == *claimed_target_alh && proof.target_header.alh() == *claimed_target_alh
}
