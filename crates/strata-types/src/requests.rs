//! Request and response types for the write and read APIs.

use serde::{Deserialize, Serialize};

use crate::TxHeader;
use crate::entry::EntrySpec;

/// One key-value pair in a [`SetRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// Raw key (no namespace prefix).
    pub key: Vec<u8>,
    /// Raw value.
    pub value: Vec<u8>,
}

/// What a precondition requires of its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requirement {
    /// The key must have at least one committed version.
    MustExist,
    /// The key must have no committed version.
    MustNotExist,
}

/// A commit-time precondition over the current key state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precondition {
    /// Raw key the requirement applies to.
    pub key: Vec<u8>,
    /// The requirement.
    pub requirement: Requirement,
}

/// Write one or more key-value pairs atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRequest {
    /// Entries to commit, in order. The order is part of the signed state.
    pub kvs: Vec<KeyValue>,
    /// Preconditions evaluated atomically with the commit.
    pub preconditions: Vec<Precondition>,
}

/// Write a reference entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRequest {
    /// Key of the reference itself.
    pub key: Vec<u8>,
    /// Key the reference points at.
    pub referenced_key: Vec<u8>,
    /// Transaction pin for bound references. Must be 0 when unbound.
    pub at_tx: u64,
    /// Whether the reference is bound to `at_tx`.
    pub bound_ref: bool,
    /// Preconditions evaluated atomically with the commit.
    pub preconditions: Vec<Precondition>,
}

/// Read a key at a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRequest {
    /// Raw key to read.
    pub key: Vec<u8>,
    /// Smallest transaction id whose effects the reader requires to see.
    /// 0 reads whatever is currently visible without waiting.
    pub since_tx: u64,
}

/// A [`SetRequest`] with a proof baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiableSetRequest {
    /// The write to commit.
    pub set_request: SetRequest,
    /// Trusted transaction to prove from. Must be in `[1, tip]`.
    pub prove_since_tx: u64,
}

/// A [`ReferenceRequest`] with a proof baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiableReferenceRequest {
    /// The reference to commit.
    pub reference_request: ReferenceRequest,
    /// Trusted transaction to prove from. Must be in `[1, tip]`.
    pub prove_since_tx: u64,
}

/// A [`KeyRequest`] with a proof baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiableGetRequest {
    /// The read to perform.
    pub key_request: KeyRequest,
    /// Trusted transaction to prove from. Must be in `[1, tip]`.
    pub prove_since_tx: u64,
}

/// A resolved read result.
///
/// When the stored entry is a reference, `key` and `value` are the
/// target's, and `tx` is the transaction that wrote the target value —
/// the transaction a client proceeds to verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Raw key (the target key for references).
    pub key: Vec<u8>,
    /// Resolved value.
    pub value: Vec<u8>,
    /// Transaction that wrote the resolved value.
    pub tx: u64,
}

/// One entry as stored inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxEntry {
    /// Stored key (namespace prefix included).
    pub key: Vec<u8>,
    /// Tagged value payload.
    pub value: Vec<u8>,
}

impl TxEntry {
    /// The entry spec this stored entry was committed from. Its digest
    /// is what participates in the transaction's Merkle tree.
    pub fn spec(&self) -> EntrySpec {
        EntrySpec {
            key: self.key.clone(),
            value: self.value.clone(),
        }
    }
}

impl From<EntrySpec> for TxEntry {
    fn from(spec: EntrySpec) -> Self {
        Self {
            key: spec.key,
            value: spec.value,
        }
    }
}

/// A full committed transaction: header plus ordered entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    /// The transaction header.
    pub header: TxHeader,
    /// Entries in commit order.
    pub entries: Vec<TxEntry>,
}

impl Tx {
    /// Find the stored entry with the given (wrapped) key.
    pub fn entry(&self, stored_key: &[u8]) -> Option<(usize, &TxEntry)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, e)| e.key == stored_key)
    }
}
