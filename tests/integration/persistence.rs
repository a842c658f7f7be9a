//! Reopening a disk-backed store and verifying across the restart.

use std::time::Duration;

use strata_engine::Database;
use strata_integration_tests::{key_req, ref_req, set_kv, vset_req};
use strata_mtree::verify_dual;
use strata_types::StoreOptions;

#[tokio::test]
async fn test_reopened_store_serves_resolved_references() {
    let dir = tempfile::tempdir().unwrap();

    let pinned = {
        let db = Database::open(dir.path(), StoreOptions::default()).unwrap();
        let h1 = set_kv(&db, b"aaa", b"value1").await;
        set_kv(&db, b"aaa", b"value2").await;
        db.set_reference(ref_req(b"myTag", b"aaa", h1.id, true))
            .await
            .unwrap();
        h1.id
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let db = Database::open(dir.path(), StoreOptions::default()).unwrap();

    let bound = db.get(key_req(b"myTag", 0)).await.unwrap();
    assert_eq!(bound.value, b"value1");
    assert_eq!(bound.tx, pinned);

    let latest = db.get(key_req(b"aaa", 0)).await.unwrap();
    assert_eq!(latest.value, b"value2");
}

#[tokio::test]
async fn test_dual_proof_spans_restart() {
    let dir = tempfile::tempdir().unwrap();

    // Trust a header from the first run.
    let trusted = {
        let db = Database::open(dir.path(), StoreOptions::default()).unwrap();
        set_kv(&db, b"firstKey", b"firstValue").await
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // After a restart the Alh chain continues, so a proof from the
    // pre-restart baseline still verifies.
    let db = Database::open(dir.path(), StoreOptions::default()).unwrap();
    set_kv(&db, b"secondKey", b"secondValue").await;

    let vtx = db
        .verifiable_set(vset_req(b"thirdKey", b"thirdValue", trusted.id))
        .await
        .unwrap();

    assert_eq!(vtx.tx.header.id, 3);
    assert!(verify_dual(
        &vtx.dual_proof,
        trusted.id,
        vtx.tx.header.id,
        &trusted.alh(),
        &vtx.tx.header.alh(),
    ));
}
