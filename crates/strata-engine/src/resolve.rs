//! Reference resolution.
//!
//! Reference-to-reference is rejected at commit, so resolution is
//! non-recursive by construction: one read for the stored entry, at
//! most one more for its target.

use strata_index::KvIndex;
use strata_txlog::{TxLog, TxLogError};
use strata_types::entry::{KEY_PREFIX_SET, ValuePayload, decode_value, wrap_key};
use strata_types::requests::{Entry, TxEntry};

use crate::error::EngineError;

/// Map "that tx/entry doesn't exist" onto the user-visible condition.
pub(crate) fn not_found(e: TxLogError) -> EngineError {
    match e {
        TxLogError::TxNotFound(_) | TxLogError::EntryNotFound { .. } => EngineError::KeyNotFound,
        other => other.into(),
    }
}

/// Resolve a stored entry into the effective `(key, value, tx)` triple.
///
/// Plain entries resolve to themselves. An unbound reference resolves
/// its target at the reader's current snapshot; a bound reference loads
/// the target from its pinned transaction, ignoring later writes. The
/// reported `tx` is always the transaction that wrote the resolved
/// value, so a client can proceed to verify that specific transaction.
pub(crate) fn resolve_entry(
    log: &TxLog,
    index: &KvIndex,
    raw_key: &[u8],
    tx_id: u64,
    stored: &TxEntry,
) -> Result<Entry, EngineError> {
    match decode_value(&stored.value)? {
        ValuePayload::Plain(value) => Ok(Entry {
            key: raw_key.to_vec(),
            value: value.to_vec(),
            tx: tx_id,
        }),
        ValuePayload::Reference { target_key, at_tx } => {
            let target_tx = if at_tx == 0 {
                index.get(target_key).ok_or(EngineError::KeyNotFound)?.last()
            } else {
                at_tx
            };

            let target = log
                .read_entry(target_tx, &wrap_key(target_key, KEY_PREFIX_SET))
                .map_err(not_found)?;

            match decode_value(&target.value)? {
                ValuePayload::Plain(value) => Ok(Entry {
                    key: target_key.to_vec(),
                    value: value.to_vec(),
                    tx: target_tx,
                }),
                // Unreachable through the commit pipeline; kept as
                // defense-in-depth against a corrupted or foreign log.
                ValuePayload::Reference { .. } => {
                    Err(EngineError::ReferencedKeyCannotBeAReference)
                }
            }
        }
    }
}
