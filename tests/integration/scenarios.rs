//! End-to-end operation sequences over a fresh store.

use strata_engine::{Database, EngineError};
use strata_integration_tests::{key_req, ref_req, set_kv, set_req, vget_req};
use strata_types::StoreOptions;
use strata_types::entry::{encode_reference, entry_digest_for};
use strata_types::requests::{Precondition, ReferenceRequest, Requirement};
use strata_mtree::verify_inclusion;

fn db() -> Database {
    Database::in_memory(StoreOptions::default())
}

#[tokio::test]
async fn test_set_then_reference_then_get() {
    let db = db();

    let h = db.set(set_req(b"firstKey", b"firstValue")).await.unwrap();
    assert_eq!(h.id, 1);

    let r = db
        .set_reference(ref_req(b"myTag", b"firstKey", 0, false))
        .await
        .unwrap();
    assert_eq!(r.id, 2);

    let entry = db.get(key_req(b"myTag", 2)).await.unwrap();
    assert_eq!(entry.key, b"firstKey");
    assert_eq!(entry.value, b"firstValue");
}

#[tokio::test]
async fn test_reference_on_empty_store() {
    let db = db();
    assert_eq!(
        db.set_reference(ref_req(b"myTag", b"secondKey", 0, false))
            .await
            .unwrap_err(),
        EngineError::KeyNotFound
    );
}

#[tokio::test]
async fn test_bound_reference_without_tx_pin() {
    let db = db();
    set_kv(&db, b"firstKey", b"firstValue").await;

    assert_eq!(
        db.set_reference(ref_req(b"firstKeyR", b"firstKey", 0, true))
            .await
            .unwrap_err(),
        EngineError::IllegalArguments
    );
}

#[tokio::test]
async fn test_verifiable_get_of_reference_proves_inclusion() {
    let db = db();
    set_kv(&db, b"firstKey", b"firstValue").await;
    let r = db
        .set_reference(ref_req(b"myTag", b"firstKey", 0, false))
        .await
        .unwrap();
    assert_eq!(r.id, 2);

    let vitem = db.verifiable_get(vget_req(b"myTag", r.id, 1)).await.unwrap();
    assert_eq!(vitem.entry.value, b"firstValue");

    let digest = entry_digest_for(vitem.verifiable_tx.tx.header.version).unwrap();
    let spec = encode_reference(b"myTag", b"firstKey", 0);
    assert!(verify_inclusion(
        &vitem.inclusion_proof,
        &digest(&spec),
        &vitem.verifiable_tx.tx.header.eh,
    ));
}

#[tokio::test]
async fn test_bound_reference_reads_pinned_version() {
    let db = db();
    let h1 = set_kv(&db, b"aaa", b"value1").await;
    let h2 = set_kv(&db, b"aaa", b"value2").await;
    assert_eq!((h1.id, h2.id), (1, 2));

    let r = db
        .set_reference(ref_req(b"myTag1", b"aaa", h1.id, true))
        .await
        .unwrap();
    assert_eq!(r.id, 3);

    let entry = db.get(key_req(b"myTag1", r.id)).await.unwrap();
    assert_eq!(entry.key, b"aaa");
    assert_eq!(entry.value, b"value1");
}

#[tokio::test]
async fn test_overflowing_precondition_list_commits_nothing() {
    let max_tx_entries = 16;
    let db = Database::in_memory(StoreOptions {
        max_tx_entries,
        ..StoreOptions::default()
    });
    set_kv(&db, b"key", b"value").await;

    let preconditions: Vec<Precondition> = (0..=max_tx_entries)
        .map(|i| Precondition {
            key: format!("key_{i}").into_bytes(),
            requirement: Requirement::MustNotExist,
        })
        .collect();

    let err = db
        .set_reference(ReferenceRequest {
            key: b"reference".to_vec(),
            referenced_key: b"key".to_vec(),
            at_tx: 0,
            bound_ref: false,
            preconditions,
        })
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidConstraints);

    assert_eq!(db.current_state().tx_id, 1, "no commit may have happened");
    assert_eq!(
        db.get(key_req(b"reference", 0)).await.unwrap_err(),
        EngineError::KeyNotFound
    );
}
