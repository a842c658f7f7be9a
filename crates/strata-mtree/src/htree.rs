//! Binary Merkle tree over entry digests.
//!
//! The tree is the RFC 6962 shape: leaves and interior nodes are
//! domain-separated by a prefix byte, and an n-leaf tree splits at the
//! largest power of two strictly less than n. The root over one
//! transaction's ordered entry digests is the header's `EH`.

use serde::{Deserialize, Serialize};

use crate::error::MtreeError;

/// Domain separator for leaf hashes.
const LEAF_PREFIX: u8 = 0x00;
/// Domain separator for interior node hashes.
const NODE_PREFIX: u8 = 0x01;

fn leaf_hash(digest: &[u8; 32]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[LEAF_PREFIX]);
    hasher.update(digest);
    hasher.finalize().into()
}

fn node_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Largest power of two strictly less than `n`. Requires `n >= 2`.
fn split_point(n: usize) -> usize {
    let mut k = 1;
    while k * 2 < n {
        k *= 2;
    }
    k
}

fn subtree_root(digests: &[[u8; 32]]) -> [u8; 32] {
    if digests.len() == 1 {
        return leaf_hash(&digests[0]);
    }
    let k = split_point(digests.len());
    node_hash(&subtree_root(&digests[..k]), &subtree_root(&digests[k..]))
}

/// Merkle root (`EH`) over one transaction's ordered entry digests.
///
/// The supplied order is part of the signed state; reordering changes
/// the root.
pub fn entries_root(digests: &[[u8; 32]]) -> Result<[u8; 32], MtreeError> {
    if digests.is_empty() {
        return Err(MtreeError::EmptyTree);
    }
    Ok(subtree_root(digests))
}

/// Sibling path from one entry digest to its transaction's `EH`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    /// Index of the proven leaf within the transaction.
    pub leaf: u32,
    /// Number of entries in the transaction.
    pub width: u32,
    /// Sibling hashes, bottom-up.
    pub terms: Vec<[u8; 32]>,
}

fn subtree_path(digests: &[[u8; 32]], leaf: usize, terms: &mut Vec<[u8; 32]>) {
    if digests.len() == 1 {
        return;
    }
    let k = split_point(digests.len());
    if leaf < k {
        subtree_path(&digests[..k], leaf, terms);
        terms.push(subtree_root(&digests[k..]));
    } else {
        subtree_path(&digests[k..], leaf - k, terms);
        terms.push(subtree_root(&digests[..k]));
    }
}

/// Build the inclusion proof for `digests[leaf]`.
pub fn inclusion_proof(digests: &[[u8; 32]], leaf: usize) -> Result<InclusionProof, MtreeError> {
    if digests.is_empty() {
        return Err(MtreeError::EmptyTree);
    }
    if leaf >= digests.len() {
        return Err(MtreeError::LeafOutOfRange {
            leaf: leaf as u32,
            width: digests.len() as u32,
        });
    }

    let mut terms = Vec::new();
    subtree_path(digests, leaf, &mut terms);

    Ok(InclusionProof {
        leaf: leaf as u32,
        width: digests.len() as u32,
        terms,
    })
}

/// Verify that `digest` participates in the tree with root `root`.
///
/// Recomputes the root from the leaf and the sibling path and compares.
pub fn verify_inclusion(proof: &InclusionProof, digest: &[u8; 32], root: &[u8; 32]) -> bool {
    if proof.width == 0 || proof.leaf >= proof.width {
        return false;
    }

    let mut fnode = proof.leaf as u64;
    let mut snode = (proof.width - 1) as u64;
    let mut hash = leaf_hash(digest);

    for term in &proof.terms {
        if snode == 0 {
            return false;
        }
        if fnode & 1 == 1 || fnode == snode {
            hash = node_hash(term, &hash);
            if fnode & 1 == 0 {
                // Right-most node of its level: climb until it gains a
                // left sibling.
                while fnode & 1 == 0 && fnode != 0 {
                    fnode >>= 1;
                    snode >>= 1;
                }
            }
        } else {
            hash = node_hash(&hash, term);
        }
        fnode >>= 1;
        snode >>= 1;
    }

    snode == 0 && hash == *root
}
