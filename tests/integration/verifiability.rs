//! A verifying client tracking a server through its state cache.

use strata_client::{
    FileStateCache, ImmutableState, MemoryCache, StateCache, verify_and_advance,
};
use strata_engine::Database;
use strata_integration_tests::{set_kv, vref_req, vset_req};
use strata_types::StoreOptions;

const SERVER: &str = "server-1";
const DB: &str = "defaultdb";

fn db() -> Database {
    Database::in_memory(StoreOptions::default())
}

#[tokio::test]
async fn test_client_follows_server_through_memory_cache() {
    let server = db();
    let cache = MemoryCache::new();

    let genesis = set_kv(&server, b"genesis", b"0").await;
    let mut trusted = genesis.id;

    for i in 1..=8u64 {
        let vtx = server
            .verifiable_set(vset_req(format!("key{i}").as_bytes(), b"v", trusted))
            .await
            .unwrap();

        let claimed = ImmutableState::new(DB, vtx.tx.header.id, vtx.tx.header.alh());
        verify_and_advance(&cache, SERVER, &vtx.dual_proof, &claimed).unwrap();
        trusted = vtx.tx.header.id;
    }

    assert_eq!(cache.get(SERVER, DB).unwrap().unwrap().tx_id, 9);
}

#[tokio::test]
async fn test_client_rejects_forged_lineage() {
    let server = db();
    let cache = MemoryCache::new();

    let h1 = set_kv(&server, b"k", b"v").await;
    cache
        .set(SERVER, &ImmutableState::new(DB, h1.id, h1.alh()))
        .unwrap();

    set_kv(&server, b"k2", b"v").await;
    let mut vtx = server.verifiable_set(vset_req(b"k3", b"v", h1.id)).await.unwrap();

    // A tampered intermediate header must not verify.
    vtx.dual_proof.lineage[0].eh[0] ^= 0xff;
    let claimed = ImmutableState::new(DB, vtx.tx.header.id, vtx.tx.header.alh());
    verify_and_advance(&cache, SERVER, &vtx.dual_proof, &claimed).unwrap_err();

    // The baseline is unchanged.
    assert_eq!(cache.get(SERVER, DB).unwrap().unwrap().tx_id, h1.id);
}

#[tokio::test]
async fn test_client_state_survives_restart_via_file_cache() {
    let server = db();
    let dir = tempfile::tempdir().unwrap();

    let h1 = set_kv(&server, b"firstKey", b"firstValue").await;

    {
        let cache = FileStateCache::new(dir.path());
        let vtx = server
            .verifiable_set_reference(vref_req(b"myTag", b"firstKey", 0, false, h1.id))
            .await
            .unwrap();
        let claimed = ImmutableState::new(DB, vtx.tx.header.id, vtx.tx.header.alh());
        verify_and_advance(&cache, SERVER, &vtx.dual_proof, &claimed).unwrap();
    }

    // A fresh cache instance over the same directory resumes from the
    // persisted baseline and verifies the next hop.
    let cache = FileStateCache::new(dir.path());
    let baseline = cache.get(SERVER, DB).unwrap().unwrap();
    assert_eq!(baseline.tx_id, 2);

    let vtx = server
        .verifiable_set(vset_req(b"secondKey", b"secondValue", baseline.tx_id))
        .await
        .unwrap();
    let claimed = ImmutableState::new(DB, vtx.tx.header.id, vtx.tx.header.alh());
    verify_and_advance(&cache, SERVER, &vtx.dual_proof, &claimed).unwrap();

    assert_eq!(cache.get(SERVER, DB).unwrap().unwrap().tx_id, 3);
}

#[tokio::test]
async fn test_per_database_baselines_are_independent() {
    let server_a = db();
    let server_b = db();
    let cache = MemoryCache::new();

    let a1 = set_kv(&server_a, b"a", b"1").await;
    let b1 = set_kv(&server_b, b"b", b"1").await;

    let vtx_a = server_a.verifiable_set(vset_req(b"a2", b"2", a1.id)).await.unwrap();
    let vtx_b = server_b.verifiable_set(vset_req(b"b2", b"2", b1.id)).await.unwrap();

    verify_and_advance(
        &cache,
        SERVER,
        &vtx_a.dual_proof,
        &ImmutableState::new("db-a", vtx_a.tx.header.id, vtx_a.tx.header.alh()),
    )
    .unwrap();
    verify_and_advance(
        &cache,
        SERVER,
        &vtx_b.dual_proof,
        &ImmutableState::new("db-b", vtx_b.tx.header.id, vtx_b.tx.header.alh()),
    )
    .unwrap();

    assert_eq!(cache.get(SERVER, "db-a").unwrap().unwrap().tx_id, 2);
    assert_eq!(cache.get(SERVER, "db-b").unwrap().unwrap().tx_id, 2);
}
