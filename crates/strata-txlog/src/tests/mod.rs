//! Tests for the transaction log.

mod reopen_tests;

use strata_types::entry::{EntrySpec, encode_entry};

use crate::log::TxLog;

/// One plain entry spec per (key, value) pair.
fn specs(pairs: &[(&[u8], &[u8])]) -> Vec<EntrySpec> {
    pairs.iter().map(|(k, v)| encode_entry(k, v)).collect()
}

/// Append one single-entry transaction and return its id.
fn append_kv(log: &TxLog, key: &[u8], value: &[u8], ts: u64) -> u64 {
    log.append(&specs(&[(key, value)]), ts).unwrap().id
}
