//! The public contract consumed by protocol adapters.
//!
//! The RPC surface, CLI, and tests depend on [`VerifiableKv`] instead of
//! the concrete [`Database`](crate::Database), making the engine
//! swappable behind the same verification semantics.

use serde::{Deserialize, Serialize};
use strata_mtree::{DualProof, InclusionProof};
use strata_types::TxHeader;
use strata_types::requests::{
    Entry, KeyRequest, ReferenceRequest, SetRequest, Tx, VerifiableGetRequest,
    VerifiableReferenceRequest, VerifiableSetRequest,
};

use crate::error::EngineError;

/// A committed transaction together with the proof linking it to the
/// caller's trusted baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiableTx {
    /// The transaction, entries carrying their stored (prefixed) keys.
    pub tx: Tx,
    /// Dual proof between `prove_since_tx` and this transaction.
    pub dual_proof: DualProof,
}

/// A resolved read together with its proofs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiableEntry {
    /// The resolved entry (target key/value for references).
    pub entry: Entry,
    /// The transaction that wrote the *requested* key, with dual proof.
    pub verifiable_tx: VerifiableTx,
    /// Sibling path binding the stored entry's digest to the tx's `EH`.
    pub inclusion_proof: InclusionProof,
}

/// The server's current verifiable state: `(tip, Alh(tip))`.
///
/// Clients persist this per database and use it as the trusted baseline
/// for the next dual-proof verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentState {
    /// Latest committed transaction id (0 when empty).
    pub tx_id: u64,
    /// Alh of that transaction (the zero seed when empty).
    pub alh: [u8; 32],
}

/// The write/read surface of the store.
#[async_trait::async_trait]
pub trait VerifiableKv: Send + Sync {
    /// Commit one or more key-value pairs atomically.
    async fn set(&self, req: SetRequest) -> Result<TxHeader, EngineError>;

    /// Commit a reference entry.
    async fn set_reference(&self, req: ReferenceRequest) -> Result<TxHeader, EngineError>;

    /// Commit key-value pairs and prove the commit against a baseline.
    async fn verifiable_set(&self, req: VerifiableSetRequest)
    -> Result<VerifiableTx, EngineError>;

    /// Commit a reference and prove the commit against a baseline.
    async fn verifiable_set_reference(
        &self,
        req: VerifiableReferenceRequest,
    ) -> Result<VerifiableTx, EngineError>;

    /// Read a key at a snapshot, resolving references.
    async fn get(&self, req: KeyRequest) -> Result<Entry, EngineError>;

    /// Read a key with inclusion and dual proofs.
    async fn verifiable_get(&self, req: VerifiableGetRequest)
    -> Result<VerifiableEntry, EngineError>;

    /// The current `(tip, Alh)` pair.
    fn current_state(&self) -> CurrentState;
}
