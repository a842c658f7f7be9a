//! Key-value index: raw key → history of writing transactions.
//!
//! The index is derived state, rebuilt from the transaction log on open.
//! It is mutated only by the engine's writer task (the Indexed
//! transition); readers take consistent clone-out snapshots. Visibility
//! is published through a watch channel so that a reader requiring
//! `since_tx` can wait for that transaction to become Visible.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

/// Errors that can occur during index operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// The awaited transaction did not become visible in time.
    #[error("transaction {since_tx} not indexed within {waited_ms}ms")]
    Timeout {
        /// The transaction the reader required.
        since_tx: u64,
        /// How long the reader waited.
        waited_ms: u64,
    },

    /// The index was torn down while a reader was waiting.
    #[error("index closed")]
    Closed,
}

/// Per-key index record: every writing transaction, ascending.
///
/// The full history doubles as the cursor for loading older versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexRecord {
    /// Ids of all transactions that wrote this key, ascending.
    pub txs: Vec<u64>,
}

impl IndexRecord {
    /// Id of the latest transaction that wrote the key.
    pub fn last(&self) -> u64 {
        *self.txs.last().expect("index record is never empty")
    }
}

/// The key-value index.
pub struct KvIndex {
    map: RwLock<BTreeMap<Vec<u8>, IndexRecord>>,
    visible_tx: watch::Sender<u64>,
    wait_timeout: Duration,
}

impl KvIndex {
    /// Create an empty index.
    pub fn new(wait_timeout: Duration) -> Self {
        let (visible_tx, _) = watch::channel(0);
        Self {
            map: RwLock::new(BTreeMap::new()),
            visible_tx,
            wait_timeout,
        }
    }

    /// Record `tx_id` as the writer of `keys`, then publish it as Visible.
    ///
    /// Called once per committed transaction, in id order, by the single
    /// writer. A key written twice within one transaction is recorded once.
    pub fn apply<I, K>(&self, tx_id: u64, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<Vec<u8>>,
    {
        {
            let mut map = self.map.write().unwrap();
            for key in keys {
                let record = map.entry(key.into()).or_default();
                if record.txs.last() != Some(&tx_id) {
                    record.txs.push(tx_id);
                }
            }
        }

        self.visible_tx.send_replace(tx_id);
        debug!(tx = tx_id, "index updated");
    }

    /// Snapshot the record for a key.
    pub fn get(&self, key: &[u8]) -> Option<IndexRecord> {
        self.map.read().unwrap().get(key).cloned()
    }

    /// Whether the key has any committed version.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.map.read().unwrap().contains_key(key)
    }

    /// Highest transaction id published as Visible.
    pub fn visible_tip(&self) -> u64 {
        *self.visible_tx.borrow()
    }

    /// Wait until `since_tx` is Visible.
    ///
    /// Returns immediately when it already is. Fails with
    /// [`IndexError::Timeout`] after the configured wait; dropping the
    /// future cancels the wait with no side effects.
    pub async fn wait_for(&self, since_tx: u64) -> Result<(), IndexError> {
        if since_tx <= self.visible_tip() {
            return Ok(());
        }

        let mut rx = self.visible_tx.subscribe();
        let wait = rx.wait_for(|tip| *tip >= since_tx);

        match tokio::time::timeout(self.wait_timeout, wait).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(IndexError::Closed),
            Err(_) => Err(IndexError::Timeout {
                since_tx,
                waited_ms: self.wait_timeout.as_millis() as u64,
            }),
        }
    }
}
