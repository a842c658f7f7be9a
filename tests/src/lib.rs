//! Shared test harness for strata integration tests.
//!
//! Thin request-building helpers so the scenario tests read like the
//! operation sequences they exercise.

use strata_engine::Database;
use strata_types::TxHeader;
use strata_types::requests::{
    KeyRequest, KeyValue, ReferenceRequest, SetRequest, VerifiableGetRequest,
    VerifiableReferenceRequest, VerifiableSetRequest,
};

/// Build a single-pair set request.
pub fn set_req(key: &[u8], value: &[u8]) -> SetRequest {
    SetRequest {
        kvs: vec![KeyValue {
            key: key.to_vec(),
            value: value.to_vec(),
        }],
        preconditions: vec![],
    }
}

/// Build a reference request without preconditions.
pub fn ref_req(key: &[u8], referenced_key: &[u8], at_tx: u64, bound_ref: bool) -> ReferenceRequest {
    ReferenceRequest {
        key: key.to_vec(),
        referenced_key: referenced_key.to_vec(),
        at_tx,
        bound_ref,
        preconditions: vec![],
    }
}

/// Build a key request.
pub fn key_req(key: &[u8], since_tx: u64) -> KeyRequest {
    KeyRequest {
        key: key.to_vec(),
        since_tx,
    }
}

/// Build a verifiable set request.
pub fn vset_req(key: &[u8], value: &[u8], prove_since_tx: u64) -> VerifiableSetRequest {
    VerifiableSetRequest {
        set_request: set_req(key, value),
        prove_since_tx,
    }
}

/// Build a verifiable reference request.
pub fn vref_req(
    key: &[u8],
    referenced_key: &[u8],
    at_tx: u64,
    bound_ref: bool,
    prove_since_tx: u64,
) -> VerifiableReferenceRequest {
    VerifiableReferenceRequest {
        reference_request: ref_req(key, referenced_key, at_tx, bound_ref),
        prove_since_tx,
    }
}

/// Build a verifiable get request.
pub fn vget_req(key: &[u8], since_tx: u64, prove_since_tx: u64) -> VerifiableGetRequest {
    VerifiableGetRequest {
        key_request: key_req(key, since_tx),
        prove_since_tx,
    }
}

/// Commit a single key-value pair.
pub async fn set_kv(db: &Database, key: &[u8], value: &[u8]) -> TxHeader {
    db.set(set_req(key, value)).await.unwrap()
}
