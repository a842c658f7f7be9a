//! State cache traits and the in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::ClientError;
use crate::state::ImmutableState;

/// Store and recall the last observed state per `(server_id, db)`.
pub trait StateCache: Send + Sync {
    /// The most recently stored state for `(server_id, db)`, if any.
    fn get(&self, server_id: &str, db: &str) -> Result<Option<ImmutableState>, ClientError>;

    /// Record a newly observed state.
    fn set(&self, server_id: &str, state: &ImmutableState) -> Result<(), ClientError>;
}

/// A [`StateCache`] that also retains the observation history.
pub trait HistoryCache: StateCache {
    /// Visit every stored state for `(server_id, db)` in observation
    /// order. Returns the number of states visited.
    fn walk(
        &self,
        server_id: &str,
        db: &str,
        f: &mut dyn FnMut(&ImmutableState),
    ) -> Result<usize, ClientError>;
}

/// Volatile cache for tests and short-lived clients.
#[derive(Default)]
pub struct MemoryCache {
    /// `(server_id, db)` → states in observation order.
    states: RwLock<HashMap<(String, String), Vec<ImmutableState>>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateCache for MemoryCache {
    fn get(&self, server_id: &str, db: &str) -> Result<Option<ImmutableState>, ClientError> {
        let states = self.states.read().unwrap();
        Ok(states
            .get(&(server_id.to_string(), db.to_string()))
            .and_then(|v| v.last().cloned()))
    }

    fn set(&self, server_id: &str, state: &ImmutableState) -> Result<(), ClientError> {
        let mut states = self.states.write().unwrap();
        states
            .entry((server_id.to_string(), state.db.clone()))
            .or_default()
            .push(state.clone());
        Ok(())
    }
}

impl HistoryCache for MemoryCache {
    fn walk(
        &self,
        server_id: &str,
        db: &str,
        f: &mut dyn FnMut(&ImmutableState),
    ) -> Result<usize, ClientError> {
        let states = self.states.read().unwrap();
        let Some(history) = states.get(&(server_id.to_string(), db.to_string())) else {
            return Ok(0);
        };
        for state in history {
            f(state);
        }
        Ok(history.len())
    }
}
