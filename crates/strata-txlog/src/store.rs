//! Storage backend for the transaction log (fjall disk or pure in-memory).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use strata_types::TxHeader;
use strata_types::requests::Tx;

use crate::error::TxLogError;

type Result<T> = std::result::Result<T, TxLogError>;

/// Inner backend: either fjall-backed (disk) or pure in-memory.
enum Backend {
    Fjall {
        #[allow(dead_code)]
        db: Database,
        headers: Keyspace,
        bodies: Keyspace,
    },
    Memory(Box<MemoryBackend>),
}

/// Pure in-memory storage.
struct MemoryBackend {
    /// tx id → serialized TxHeader.
    headers: RwLock<BTreeMap<u64, Vec<u8>>>,
    /// tx id → serialized Tx.
    bodies: RwLock<BTreeMap<u64, Vec<u8>>>,
}

/// Storage backend for committed transactions, addressed by id.
///
/// Keys are big-endian ids so on-disk order matches id order.
pub struct TxLogStore {
    backend: Backend,
}

fn storage_err(e: impl std::fmt::Display) -> TxLogError {
    TxLogError::Storage(e.to_string())
}

impl TxLogStore {
    /// Open a persistent store at the given path (fjall backend).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::builder(path).open().map_err(storage_err)?;
        let backend = Self::init_fjall(db)?;
        Ok(Self { backend })
    }

    /// Open a temporary store backed by fjall (cleaned up on drop).
    pub fn open_temporary() -> Result<Self> {
        let tmp = tempfile::tempdir().map_err(storage_err)?;
        let db = Database::builder(tmp.path())
            .temporary(true)
            .open()
            .map_err(storage_err)?;
        let backend = Self::init_fjall(db)?;
        Ok(Self { backend })
    }

    /// Create a pure in-memory store.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Box::new(MemoryBackend {
                headers: RwLock::new(BTreeMap::new()),
                bodies: RwLock::new(BTreeMap::new()),
            })),
        }
    }

    fn init_fjall(db: Database) -> Result<Backend> {
        let headers = db
            .keyspace("tx_headers", KeyspaceCreateOptions::default)
            .map_err(storage_err)?;
        let bodies = db
            .keyspace("tx_bodies", KeyspaceCreateOptions::default)
            .map_err(storage_err)?;
        Ok(Backend::Fjall {
            db,
            headers,
            bodies,
        })
    }

    /// Store a transaction header by id.
    pub fn put_header(&self, id: u64, header: &TxHeader) -> Result<()> {
        let bytes = postcard::to_allocvec(header)?;

        match &self.backend {
            Backend::Fjall { headers, .. } => {
                headers
                    .insert(id.to_be_bytes(), bytes)
                    .map_err(storage_err)?;
            }
            Backend::Memory(m) => {
                m.headers.write().unwrap().insert(id, bytes);
            }
        }
        Ok(())
    }

    /// Retrieve a transaction header by id.
    pub fn get_header(&self, id: u64) -> Result<Option<TxHeader>> {
        let bytes = match &self.backend {
            Backend::Fjall { headers, .. } => headers
                .get(id.to_be_bytes())
                .map_err(storage_err)?
                .map(|v| v.to_vec()),
            Backend::Memory(m) => m.headers.read().unwrap().get(&id).cloned(),
        };

        match bytes {
            Some(b) => Ok(Some(postcard::from_bytes(&b)?)),
            None => Ok(None),
        }
    }

    /// Store a full transaction by id.
    pub fn put_tx(&self, id: u64, tx: &Tx) -> Result<()> {
        let bytes = postcard::to_allocvec(tx)?;

        match &self.backend {
            Backend::Fjall { bodies, .. } => {
                bodies.insert(id.to_be_bytes(), bytes).map_err(storage_err)?;
            }
            Backend::Memory(m) => {
                m.bodies.write().unwrap().insert(id, bytes);
            }
        }
        Ok(())
    }

    /// Retrieve a full transaction by id.
    pub fn get_tx(&self, id: u64) -> Result<Option<Tx>> {
        let bytes = match &self.backend {
            Backend::Fjall { bodies, .. } => bodies
                .get(id.to_be_bytes())
                .map_err(storage_err)?
                .map(|v| v.to_vec()),
            Backend::Memory(m) => m.bodies.read().unwrap().get(&id).cloned(),
        };

        match bytes {
            Some(b) => Ok(Some(postcard::from_bytes(&b)?)),
            None => Ok(None),
        }
    }
}
