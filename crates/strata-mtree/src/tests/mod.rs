//! Tests for the mtree crate.


use strata_types::{ALH_SEED, TxHeader};

/// Deterministic fake entry digests.
fn digests(n: usize) -> Vec<[u8; 32]> {
    (0..n).map(|i| blake3::hash(&[i as u8]).into()).collect()
}

/// Build a valid header chain of `n` transactions.
fn chain(n: u64) -> Vec<TxHeader> {
    let mut headers = Vec::with_capacity(n as usize);
    let mut prev_alh = ALH_SEED;

    for id in 1..=n {
        let header = TxHeader {
            id,
            ts: 1_000 + id,
            version: 1,
            nentries: 1,
            eh: blake3::hash(&id.to_be_bytes()).into(),
            prev_alh,
        };
        prev_alh = header.alh();
        headers.push(header);
    }

    headers
}
