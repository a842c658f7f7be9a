//! The append-only transaction log.

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use strata_mtree::entries_root;
use strata_types::entry::{ENTRY_DIGEST_VERSION, EntrySpec, entry_digest_for};
use strata_types::requests::{Tx, TxEntry};
use strata_types::{ALH_SEED, TxHeader};
use tracing::debug;

use crate::error::TxLogError;
use crate::store::TxLogStore;

type Result<T> = std::result::Result<T, TxLogError>;

/// Append cursor. Only the active writer mutates it.
struct Cursor {
    tip: u64,
    alh: [u8; 32],
}

/// Append-only sequence of transactions with dense ids from 1.
///
/// Appends are serialized through the internal cursor lock; the engine
/// routes all commits through a single writer task, so the lock is
/// uncontended in practice. Reads go straight to the backend.
pub struct TxLog {
    store: TxLogStore,
    cursor: Mutex<Cursor>,
    /// Mirror of `cursor.tip` for lock-free reads.
    tip: AtomicU64,
}

impl TxLog {
    /// Open a persistent log at the given path, validating the Alh chain.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::bootstrap(TxLogStore::open(path)?)
    }

    /// Open a temporary log backed by fjall (cleaned up on drop).
    pub fn open_temporary() -> Result<Self> {
        Self::bootstrap(TxLogStore::open_temporary()?)
    }

    /// Create a pure in-memory log.
    pub fn in_memory() -> Self {
        Self {
            store: TxLogStore::in_memory(),
            cursor: Mutex::new(Cursor {
                tip: 0,
                alh: ALH_SEED,
            }),
            tip: AtomicU64::new(0),
        }
    }

    /// Walk the persisted headers from 1, verifying density and the Alh
    /// chain, and position the cursor at the tip.
    fn bootstrap(store: TxLogStore) -> Result<Self> {
        let mut tip = 0u64;
        let mut alh = ALH_SEED;

        loop {
            let id = tip + 1;
            let Some(header) = store.get_header(id)? else {
                break;
            };

            if header.id != id {
                return Err(TxLogError::Corrupted(format!(
                    "header stored at {id} carries id {}",
                    header.id
                )));
            }
            if header.prev_alh != alh {
                return Err(TxLogError::Corrupted(format!(
                    "broken alh chain at transaction {id}"
                )));
            }

            alh = header.alh();
            tip = id;
        }

        debug!(tip, "opened transaction log");

        Ok(Self {
            store,
            cursor: Mutex::new(Cursor { tip, alh }),
            tip: AtomicU64::new(tip),
        })
    }

    /// Append one transaction.
    ///
    /// Assigns `tip + 1`, computes the entry digests and their Merkle
    /// root in the exact supplied order, links the header into the Alh
    /// chain, and persists body and header. A persistence failure
    /// returns before the cursor advances — the id is not consumed.
    pub fn append(&self, specs: &[EntrySpec], ts: u64) -> Result<TxHeader> {
        if specs.is_empty() {
            return Err(TxLogError::EmptyTransaction);
        }

        let digest = entry_digest_for(ENTRY_DIGEST_VERSION)?;
        let digests: Vec<[u8; 32]> = specs.iter().map(digest).collect();
        let eh = entries_root(&digests)?;

        let mut cursor = self.cursor.lock().unwrap();
        let id = cursor.tip + 1;

        let header = TxHeader {
            id,
            ts,
            version: ENTRY_DIGEST_VERSION,
            nentries: specs.len() as u32,
            eh,
            prev_alh: cursor.alh,
        };

        let tx = Tx {
            header,
            entries: specs.iter().cloned().map(TxEntry::from).collect(),
        };

        self.store.put_tx(id, &tx)?;
        self.store.put_header(id, &header)?;

        cursor.tip = id;
        cursor.alh = header.alh();
        self.tip.store(id, Ordering::Release);

        debug!(tx = id, entries = header.nentries, "appended transaction");

        Ok(header)
    }

    /// Id of the latest committed transaction, 0 when the log is empty.
    pub fn tip(&self) -> u64 {
        self.tip.load(Ordering::Acquire)
    }

    /// Alh of the latest committed transaction ([`ALH_SEED`] when empty).
    pub fn last_alh(&self) -> [u8; 32] {
        self.cursor.lock().unwrap().alh
    }

    /// Read the header of transaction `id`.
    pub fn read_header(&self, id: u64) -> Result<TxHeader> {
        self.store
            .get_header(id)?
            .ok_or(TxLogError::TxNotFound(id))
    }

    /// Read the full transaction `id`.
    pub fn read_tx(&self, id: u64) -> Result<Tx> {
        self.store.get_tx(id)?.ok_or(TxLogError::TxNotFound(id))
    }

    /// Read the entry with the given stored (prefixed) key from
    /// transaction `id`.
    pub fn read_entry(&self, id: u64, stored_key: &[u8]) -> Result<TxEntry> {
        let tx = self.read_tx(id)?;
        tx.entry(stored_key)
            .map(|(_, e)| e.clone())
            .ok_or(TxLogError::EntryNotFound { tx: id })
    }

    /// Read headers `from ..= to` in id order.
    pub fn headers_range(&self, from: u64, to: u64) -> Result<Vec<TxHeader>> {
        let mut headers = Vec::with_capacity(to.saturating_sub(from) as usize + 1);
        for id in from..=to {
            headers.push(self.read_header(id)?);
        }
        Ok(headers)
    }

    /// Visit every committed transaction in id order (index rebuild).
    pub fn replay<F: FnMut(&Tx)>(&self, mut f: F) -> Result<()> {
        for id in 1..=self.tip() {
            f(&self.read_tx(id)?);
        }
        Ok(())
    }
}
