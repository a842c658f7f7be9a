//! Tests for the engine.


use strata_types::StoreOptions;
use strata_types::TxHeader;
use strata_types::requests::{KeyRequest, KeyValue, ReferenceRequest, SetRequest};

use crate::database::Database;

/// In-memory database with default options.
fn db() -> Database {
    Database::in_memory(StoreOptions::default())
}

/// In-memory database with a small transaction budget.
fn small_db(max_tx_entries: usize) -> Database {
    Database::in_memory(StoreOptions {
        max_tx_entries,
        ..StoreOptions::default()
    })
}

/// Commit a single key-value pair.
async fn set_kv(db: &Database, key: &[u8], value: &[u8]) -> TxHeader {
    db.set(SetRequest {
        kvs: vec![KeyValue {
            key: key.to_vec(),
            value: value.to_vec(),
        }],
        preconditions: vec![],
    })
    .await
    .unwrap()
}

/// Build a reference request without preconditions.
fn ref_req(key: &[u8], referenced_key: &[u8], at_tx: u64, bound_ref: bool) -> ReferenceRequest {
    ReferenceRequest {
        key: key.to_vec(),
        referenced_key: referenced_key.to_vec(),
        at_tx,
        bound_ref,
        preconditions: vec![],
    }
}

/// Build a key request.
fn key_req(key: &[u8], since_tx: u64) -> KeyRequest {
    KeyRequest {
        key: key.to_vec(),
        since_tx,
    }
}
