//! Client-side dual-proof verification against the cached baseline.

use strata_mtree::{DualProof, verify_dual};

use crate::cache::StateCache;
use crate::error::ClientError;
use crate::state::ImmutableState;

/// Verify a server's claimed state against the cached baseline, then
/// persist it.
///
/// With no cached state (or a cached empty-store state) the claim is
/// trusted on first use and persisted as the new baseline. Otherwise
/// the dual proof must chain the cached `(tx_id, Alh)` to the claimed
/// one; the cache only advances when it does. A claim older than the
/// cache, or a conflicting hash for the same tx, is reported without
/// touching the cache.
pub fn verify_and_advance(
    cache: &dyn StateCache,
    server_id: &str,
    proof: &DualProof,
    claimed: &ImmutableState,
) -> Result<(), ClientError> {
    let cached = cache.get(server_id, &claimed.db)?;

    let Some(cached) = cached.filter(|s| s.tx_id > 0) else {
        cache.set(server_id, claimed)?;
        return Ok(());
    };

    if claimed.tx_id < cached.tx_id {
        return Err(ClientError::StateRegression {
            db: claimed.db.clone(),
            cached: cached.tx_id,
            claimed: claimed.tx_id,
        });
    }

    if claimed.tx_id == cached.tx_id {
        if claimed.tx_hash != cached.tx_hash {
            return Err(ClientError::StateConflict {
                db: claimed.db.clone(),
                tx_id: claimed.tx_id,
            });
        }
        return Ok(());
    }

    if !verify_dual(
        proof,
        cached.tx_id,
        claimed.tx_id,
        &cached.tx_hash,
        &claimed.tx_hash,
    ) {
        return Err(ClientError::ProofVerificationFailed {
            db: claimed.db.clone(),
        });
    }

    cache.set(server_id, claimed)
}
