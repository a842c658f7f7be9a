//! Client-side state tracking for strata.
//!
//! A verifying client persists the last [`ImmutableState`] it observed
//! per `(server_id, db_name)` and uses it as the trusted baseline when
//! checking the dual proof accompanying each verifiable operation:
//! [`verify_and_advance`] checks the proof from the cached state to the
//! server's claimed state and persists the new state only when the
//! chain holds.

mod cache;
mod error;
mod file_cache;
mod state;
mod verify;

pub use cache::{HistoryCache, MemoryCache, StateCache};
pub use error::ClientError;
pub use file_cache::FileStateCache;
pub use state::ImmutableState;
pub use verify::verify_and_advance;
