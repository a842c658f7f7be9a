//! Shared types for the strata workspace.
//!
//! This crate defines the data model used across strata: transaction
//! headers and their accumulated linking hash ([`TxHeader`]), the
//! deterministic entry encoding and versioned digest schemes
//! ([`entry`]), request/response types ([`requests`]), store
//! configuration ([`StoreOptions`]), and the monotonic commit clock
//! ([`TxClock`]).

pub mod entry;
pub mod requests;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Transaction header
// ---------------------------------------------------------------------------

/// Alh of the empty log. `prev_alh` of the first transaction.
pub const ALH_SEED: [u8; 32] = [0u8; 32];

/// Header of one committed transaction.
///
/// The header is part of the verifiable state: `eh` is the Merkle root
/// over the transaction's entry digests, and [`alh`](TxHeader::alh)
/// chains headers cryptographically. Once written a header is immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHeader {
    /// Transaction id. Dense, strictly increasing from 1.
    pub id: u64,
    /// Commit timestamp (nanoseconds since UNIX epoch, strictly monotonic).
    pub ts: u64,
    /// Entry-digest scheme used for this transaction's entries.
    pub version: u16,
    /// Number of entries in the transaction.
    pub nentries: u32,
    /// Merkle root over the ordered entry digests.
    pub eh: [u8; 32],
    /// Alh of the previous transaction ([`ALH_SEED`] for tx 1).
    pub prev_alh: [u8; 32],
}

impl TxHeader {
    /// Accumulated linking hash of this transaction.
    ///
    /// `alh(tx_n) = blake3(id ‖ prev_alh ‖ blake3(ts ‖ version ‖ nentries ‖ eh))`,
    /// all integers big-endian. The byte layout is hand-written and fixed:
    /// it must never change under serde or crate upgrades.
    pub fn alh(&self) -> [u8; 32] {
        let mut inner = blake3::Hasher::new();
        inner.update(&self.ts.to_be_bytes());
        inner.update(&self.version.to_be_bytes());
        inner.update(&self.nentries.to_be_bytes());
        inner.update(&self.eh);

        let mut outer = blake3::Hasher::new();
        outer.update(&self.id.to_be_bytes());
        outer.update(&self.prev_alh);
        outer.update(inner.finalize().as_bytes());
        outer.finalize().into()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Store configuration.
///
/// All limits are enforced before any log or index mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Maximum key length in bytes (entries and preconditions).
    pub max_key_len: usize,
    /// Maximum value length in bytes.
    pub max_value_len: usize,
    /// Maximum entries plus preconditions per transaction.
    pub max_tx_entries: usize,
    /// How long a read blocks waiting for its `since_tx` to become visible.
    pub sync_wait_timeout_ms: u64,
}

impl StoreOptions {
    /// Snapshot wait timeout as a [`Duration`].
    pub fn sync_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_wait_timeout_ms)
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_key_len: 1024,
            max_value_len: 4096,
            max_tx_entries: 1024,
            sync_wait_timeout_ms: 2_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Commit clock
// ---------------------------------------------------------------------------

/// Strictly monotonic commit clock.
///
/// Produces timestamps (nanoseconds since UNIX epoch) that are always at
/// least as large as the wall clock and strictly increasing even when the
/// wall clock hasn't advanced. Thread-safe via `AtomicU64`.
pub struct TxClock {
    last: AtomicU64,
}

impl TxClock {
    /// Create a clock initialised to the current wall-clock time.
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(wall_clock_nanos()),
        }
    }

    /// Advance and return a new unique timestamp.
    ///
    /// The returned value is `max(wall_clock, last) + 1`, guaranteeing
    /// strict monotonicity under rapid successive calls or clock skew.
    pub fn tick(&self) -> u64 {
        loop {
            let prev = self.last.load(Ordering::SeqCst);
            let now = wall_clock_nanos();
            let candidate = prev.max(now) + 1;

            if self
                .last
                .compare_exchange(prev, candidate, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return candidate;
            }
        }
    }

    /// Return the current clock value without advancing it.
    pub fn current(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

impl Default for TxClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TxClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxClock")
            .field("last", &self.last.load(Ordering::SeqCst))
            .finish()
    }
}

/// Current wall-clock time in nanoseconds since UNIX epoch.
fn wall_clock_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
