//! [`Database`] — the concrete store behind [`VerifiableKv`].

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use strata_index::KvIndex;
use strata_mtree::{DualProof, inclusion_proof};
use strata_txlog::TxLog;
use strata_types::entry::{
    EntrySpec, KEY_PREFIX_SET, ValuePayload, decode_value, encode_entry, encode_reference,
    entry_digest_for, wrap_key,
};
use strata_types::requests::{
    Entry, KeyRequest, Precondition, ReferenceRequest, SetRequest, VerifiableGetRequest,
    VerifiableReferenceRequest, VerifiableSetRequest,
};
use strata_types::{StoreOptions, TxClock, TxHeader};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::api::{CurrentState, VerifiableEntry, VerifiableKv, VerifiableTx};
use crate::error::EngineError;
use crate::resolve::{not_found, resolve_entry};
use crate::writer::{CommitJob, spawn_writer};

/// An immutable, verifiable key-value store.
///
/// Construction spawns the writer task, so a `Database` must be created
/// inside a Tokio runtime. Dropping it stops the writer.
pub struct Database {
    log: Arc<TxLog>,
    index: Arc<KvIndex>,
    options: StoreOptions,
    jobs: mpsc::Sender<CommitJob>,
    degraded: Arc<AtomicBool>,
}

impl Database {
    /// Open a persistent database, replaying the log to rebuild the index.
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self, EngineError> {
        Self::bootstrap(TxLog::open(path)?, options)
    }

    /// Open a temporary disk-backed database (cleaned up on drop).
    pub fn open_temporary(options: StoreOptions) -> Result<Self, EngineError> {
        Self::bootstrap(TxLog::open_temporary()?, options)
    }

    /// Create a pure in-memory database.
    pub fn in_memory(options: StoreOptions) -> Self {
        Self::bootstrap(TxLog::in_memory(), options)
            .expect("empty log cannot fail to bootstrap")
    }

    fn bootstrap(log: TxLog, options: StoreOptions) -> Result<Self, EngineError> {
        let log = Arc::new(log);
        let index = Arc::new(KvIndex::new(options.sync_wait_timeout()));

        // The index is derived state: rebuild it from the log. Only
        // user-namespace keys are indexed.
        let mut rebuilt = 0u64;
        log.replay(|tx| {
            let keys: Vec<Vec<u8>> = tx
                .entries
                .iter()
                .filter(|e| e.key.first() == Some(&KEY_PREFIX_SET))
                .map(|e| e.key[1..].to_vec())
                .collect();
            index.apply(tx.header.id, keys);
            rebuilt += 1;
        })?;

        if rebuilt > 0 {
            debug!(transactions = rebuilt, "rebuilt index from log");
        }

        let clock = Arc::new(TxClock::new());
        let degraded = Arc::new(AtomicBool::new(false));
        let jobs = spawn_writer(log.clone(), index.clone(), clock, degraded.clone());

        Ok(Self {
            log,
            index,
            options,
            jobs,
            degraded,
        })
    }

    /// Whether the store has entered read-only degraded mode.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    // ----- Validation -----

    fn validate_key(&self, key: &[u8]) -> Result<(), EngineError> {
        if key.is_empty() || key.len() > self.options.max_key_len {
            return Err(EngineError::IllegalArguments);
        }
        Ok(())
    }

    fn validate_preconditions(
        &self,
        preconditions: &[Precondition],
        nentries: usize,
    ) -> Result<(), EngineError> {
        if preconditions.is_empty() {
            return Ok(());
        }
        if nentries + preconditions.len() > self.options.max_tx_entries {
            return Err(EngineError::InvalidConstraints);
        }
        for pre in preconditions {
            if pre.key.is_empty() || pre.key.len() > self.options.max_key_len {
                return Err(EngineError::InvalidConstraints);
            }
        }
        Ok(())
    }

    fn validate_prove_since(&self, prove_since_tx: u64) -> Result<(), EngineError> {
        if prove_since_tx == 0 || prove_since_tx > self.log.tip() {
            return Err(EngineError::IllegalArguments);
        }
        Ok(())
    }

    // ----- Commit submission -----

    async fn submit(
        &self,
        specs: Vec<EntrySpec>,
        keys: Vec<Vec<u8>>,
        preconditions: Vec<Precondition>,
    ) -> Result<TxHeader, EngineError> {
        let (reply, reply_rx) = oneshot::channel();
        self.jobs
            .send(CommitJob {
                specs,
                keys,
                preconditions,
                reply,
            })
            .await
            .map_err(|_| EngineError::WriterUnavailable)?;

        reply_rx.await.map_err(|_| EngineError::WriterUnavailable)?
    }

    // ----- Operations -----

    /// Commit one or more key-value pairs atomically.
    pub async fn set(&self, req: SetRequest) -> Result<TxHeader, EngineError> {
        if req.kvs.is_empty() || req.kvs.len() > self.options.max_tx_entries {
            return Err(EngineError::IllegalArguments);
        }

        let mut seen: HashSet<&[u8]> = HashSet::with_capacity(req.kvs.len());
        for kv in &req.kvs {
            self.validate_key(&kv.key)?;
            if kv.value.len() > self.options.max_value_len {
                return Err(EngineError::IllegalArguments);
            }
            if !seen.insert(kv.key.as_slice()) {
                return Err(EngineError::IllegalArguments);
            }
        }
        self.validate_preconditions(&req.preconditions, req.kvs.len())?;

        let specs = req
            .kvs
            .iter()
            .map(|kv| encode_entry(&kv.key, &kv.value))
            .collect();
        let keys = req.kvs.into_iter().map(|kv| kv.key).collect();

        self.submit(specs, keys, req.preconditions).await
    }

    /// Commit a reference entry.
    ///
    /// All failures are reported before any state change, in a fixed
    /// order: argument shape, self-loop, target existence, target kind,
    /// precondition shape; precondition evaluation happens atomically
    /// with the commit in the writer.
    pub async fn set_reference(&self, req: ReferenceRequest) -> Result<TxHeader, EngineError> {
        if req.key.is_empty() || req.referenced_key.is_empty() {
            return Err(EngineError::IllegalArguments);
        }
        if req.key.len() > self.options.max_key_len
            || req.referenced_key.len() > self.options.max_key_len
        {
            return Err(EngineError::IllegalArguments);
        }
        // A bound reference must name a concrete tx; an unbound one must not.
        if req.bound_ref && req.at_tx == 0 {
            return Err(EngineError::IllegalArguments);
        }
        if !req.bound_ref && req.at_tx != 0 {
            return Err(EngineError::IllegalArguments);
        }
        if req.at_tx > self.log.tip() {
            return Err(EngineError::IllegalArguments);
        }
        if req.key == req.referenced_key {
            return Err(EngineError::FinalKeyCannotBeConvertedIntoReference);
        }

        let target_tx = if req.bound_ref {
            req.at_tx
        } else {
            self.index
                .get(&req.referenced_key)
                .ok_or(EngineError::KeyNotFound)?
                .last()
        };

        let target = self
            .log
            .read_entry(target_tx, &wrap_key(&req.referenced_key, KEY_PREFIX_SET))
            .map_err(not_found)?;

        if matches!(
            decode_value(&target.value)?,
            ValuePayload::Reference { .. }
        ) {
            return Err(EngineError::ReferencedKeyCannotBeAReference);
        }

        self.validate_preconditions(&req.preconditions, 1)?;

        let at_tx = if req.bound_ref { req.at_tx } else { 0 };
        let spec = encode_reference(&req.key, &req.referenced_key, at_tx);

        self.submit(vec![spec], vec![req.key], req.preconditions).await
    }

    /// Commit key-value pairs and prove the commit against a baseline.
    pub async fn verifiable_set(
        &self,
        req: VerifiableSetRequest,
    ) -> Result<VerifiableTx, EngineError> {
        self.validate_prove_since(req.prove_since_tx)?;

        let header = self.set(req.set_request).await?;
        self.verifiable_tx_for(req.prove_since_tx, header.id)
    }

    /// Commit a reference and prove the commit against a baseline.
    pub async fn verifiable_set_reference(
        &self,
        req: VerifiableReferenceRequest,
    ) -> Result<VerifiableTx, EngineError> {
        self.validate_prove_since(req.prove_since_tx)?;

        let header = self.set_reference(req.reference_request).await?;
        self.verifiable_tx_for(req.prove_since_tx, header.id)
    }

    /// Read a key at a snapshot, resolving references.
    pub async fn get(&self, req: KeyRequest) -> Result<Entry, EngineError> {
        self.validate_key(&req.key)?;

        if req.since_tx > 0 {
            self.index.wait_for(req.since_tx).await?;
        }

        let record = self.index.get(&req.key).ok_or(EngineError::KeyNotFound)?;
        let tx_id = record.last();
        let stored = self
            .log
            .read_entry(tx_id, &wrap_key(&req.key, KEY_PREFIX_SET))?;

        resolve_entry(&self.log, &self.index, &req.key, tx_id, &stored)
    }

    /// Read a key with inclusion and dual proofs.
    ///
    /// The inclusion proof binds the entry stored under the *requested*
    /// key (for references, the reference entry itself) to the `EH` of
    /// the transaction that wrote it; the returned entry is resolved.
    pub async fn verifiable_get(
        &self,
        req: VerifiableGetRequest,
    ) -> Result<VerifiableEntry, EngineError> {
        self.validate_prove_since(req.prove_since_tx)?;
        self.validate_key(&req.key_request.key)?;

        if req.key_request.since_tx > 0 {
            self.index.wait_for(req.key_request.since_tx).await?;
        }

        let record = self
            .index
            .get(&req.key_request.key)
            .ok_or(EngineError::KeyNotFound)?;
        let entry_tx = record.last();

        let tx = self.log.read_tx(entry_tx)?;
        let stored_key = wrap_key(&req.key_request.key, KEY_PREFIX_SET);
        let (leaf, stored) = tx.entry(&stored_key).ok_or(EngineError::KeyNotFound)?;

        let digest = entry_digest_for(tx.header.version)?;
        let digests: Vec<[u8; 32]> = tx.entries.iter().map(|e| digest(&e.spec())).collect();
        let proof = inclusion_proof(&digests, leaf)?;

        let entry = resolve_entry(&self.log, &self.index, &req.key_request.key, entry_tx, stored)?;

        // The dual proof always runs from the older tx to the newer one.
        let (source, target) = if req.prove_since_tx <= entry_tx {
            (req.prove_since_tx, entry_tx)
        } else {
            (entry_tx, req.prove_since_tx)
        };
        let dual_proof = self.build_dual_proof(source, target)?;

        Ok(VerifiableEntry {
            entry,
            verifiable_tx: VerifiableTx { tx, dual_proof },
            inclusion_proof: proof,
        })
    }

    /// The current `(tip, Alh)` pair.
    pub fn current_state(&self) -> CurrentState {
        CurrentState {
            tx_id: self.log.tip(),
            alh: self.log.last_alh(),
        }
    }

    // ----- Proof assembly -----

    fn verifiable_tx_for(
        &self,
        prove_since_tx: u64,
        tx_id: u64,
    ) -> Result<VerifiableTx, EngineError> {
        let tx = self.log.read_tx(tx_id)?;
        let dual_proof = self.build_dual_proof(prove_since_tx, tx_id)?;
        Ok(VerifiableTx { tx, dual_proof })
    }

    fn build_dual_proof(&self, source_id: u64, target_id: u64) -> Result<DualProof, EngineError> {
        let source_header = self.log.read_header(source_id)?;
        let target_header = self.log.read_header(target_id)?;
        let lineage = self.log.headers_range(source_id + 1, target_id)?;
        Ok(DualProof {
            source_header,
            target_header,
            lineage,
        })
    }
}

#[async_trait::async_trait]
impl VerifiableKv for Database {
    async fn set(&self, req: SetRequest) -> Result<TxHeader, EngineError> {
        Database::set(self, req).await
    }

    async fn set_reference(&self, req: ReferenceRequest) -> Result<TxHeader, EngineError> {
        Database::set_reference(self, req).await
    }

    async fn verifiable_set(
        &self,
        req: VerifiableSetRequest,
    ) -> Result<VerifiableTx, EngineError> {
        Database::verifiable_set(self, req).await
    }

    async fn verifiable_set_reference(
        &self,
        req: VerifiableReferenceRequest,
    ) -> Result<VerifiableTx, EngineError> {
        Database::verifiable_set_reference(self, req).await
    }

    async fn get(&self, req: KeyRequest) -> Result<Entry, EngineError> {
        Database::get(self, req).await
    }

    async fn verifiable_get(
        &self,
        req: VerifiableGetRequest,
    ) -> Result<VerifiableEntry, EngineError> {
        Database::verifiable_get(self, req).await
    }

    fn current_state(&self) -> CurrentState {
        Database::current_state(self)
    }
}
