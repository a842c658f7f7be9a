//! The persisted per-database state.

use serde::{Deserialize, Serialize};

/// The last observed verifiable state of one database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmutableState {
    /// Database name. May contain any bytes valid in a UTF-8 string,
    /// including `:` and newlines.
    pub db: String,
    /// Latest observed transaction id.
    pub tx_id: u64,
    /// Alh of that transaction.
    pub tx_hash: [u8; 32],
}

impl ImmutableState {
    /// State for `db` as observed from a transaction header.
    pub fn new(db: impl Into<String>, tx_id: u64, tx_hash: [u8; 32]) -> Self {
        Self {
            db: db.into(),
            tx_id,
            tx_hash,
        }
    }
}
