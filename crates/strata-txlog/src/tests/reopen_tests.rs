//! Tests for persistence: reopening a disk-backed log.

use strata_types::entry::{KEY_PREFIX_SET, wrap_key};

use super::specs;
use crate::log::TxLog;

#[test]
fn test_reopen_restores_tip_and_chain() {
    let dir = tempfile::tempdir().unwrap();

    let (tip, alh) = {
        let log = TxLog::open(dir.path()).unwrap();
        log.append(&specs(&[(b"firstKey", b"firstValue")]), 1).unwrap();
        log.append(&specs(&[(b"secondKey", b"secondValue")]), 2)
            .unwrap();
        (log.tip(), log.last_alh())
    };

    let reopened = TxLog::open(dir.path()).unwrap();
    assert_eq!(reopened.tip(), tip);
    assert_eq!(reopened.last_alh(), alh);

    let entry = reopened
        .read_entry(1, &wrap_key(b"firstKey", KEY_PREFIX_SET))
        .unwrap();
    assert_eq!(entry.key, wrap_key(b"firstKey", KEY_PREFIX_SET));
}

#[test]
fn test_reopen_continues_id_sequence() {
    let dir = tempfile::tempdir().unwrap();

    {
        let log = TxLog::open(dir.path()).unwrap();
        for i in 1..=3u64 {
            log.append(&specs(&[(format!("k{i}").as_bytes(), b"v")]), i)
                .unwrap();
        }
    }

    let reopened = TxLog::open(dir.path()).unwrap();
    let header = reopened.append(&specs(&[(b"k4", b"v")]), 4).unwrap();
    assert_eq!(header.id, 4);

    let h3 = reopened.read_header(3).unwrap();
    assert_eq!(header.prev_alh, h3.alh());
}

#[test]
fn test_open_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let log = TxLog::open(dir.path()).unwrap();
    assert_eq!(log.tip(), 0);
}
