//! File-backed state cache.
//!
//! One directory per server id, holding a single append-only
//! `states.log`. Each record is `u32_be(len) ‖ postcard(state)` — a
//! length-prefixed layout, so database names containing `:`, newlines,
//! or any other byte round-trip unambiguously. The newest record for a
//! database is its current state; the full file is the observation
//! history.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cache::{HistoryCache, StateCache};
use crate::error::ClientError;
use crate::state::ImmutableState;

const STATES_FILE: &str = "states.log";

/// Persistent state cache rooted at a directory.
pub struct FileStateCache {
    dir: PathBuf,
}

impl FileStateCache {
    /// Create a cache rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn states_path(&self, server_id: &str) -> PathBuf {
        self.dir.join(server_id).join(STATES_FILE)
    }

    /// Parse all records in a server's state file.
    ///
    /// A truncated final record (interrupted append) is ignored; a
    /// record that parses to garbage mid-file is an error.
    fn read_records(&self, path: &Path) -> Result<Vec<ImmutableState>, ClientError> {
        let buf = match fs::read(path) {
            Ok(buf) => buf,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        let mut offset = 0usize;

        while buf.len() - offset >= 4 {
            let len =
                u32::from_be_bytes(buf[offset..offset + 4].try_into().unwrap()) as usize;
            offset += 4;

            if buf.len() - offset < len {
                // Interrupted append left a partial tail record.
                break;
            }

            let state: ImmutableState = postcard::from_bytes(&buf[offset..offset + len])
                .map_err(|_| ClientError::CorruptState {
                    path: path.to_path_buf(),
                })?;
            records.push(state);
            offset += len;
        }

        Ok(records)
    }
}

impl StateCache for FileStateCache {
    fn get(&self, server_id: &str, db: &str) -> Result<Option<ImmutableState>, ClientError> {
        let records = self.read_records(&self.states_path(server_id))?;
        Ok(records.into_iter().rev().find(|s| s.db == db))
    }

    fn set(&self, server_id: &str, state: &ImmutableState) -> Result<(), ClientError> {
        let path = self.states_path(server_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let body = postcard::to_allocvec(state)?;
        let mut record = Vec::with_capacity(4 + body.len());
        record.extend_from_slice(&(body.len() as u32).to_be_bytes());
        record.extend_from_slice(&body);

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(&record)?;
        file.sync_data()?;
        Ok(())
    }
}

impl HistoryCache for FileStateCache {
    fn walk(
        &self,
        server_id: &str,
        db: &str,
        f: &mut dyn FnMut(&ImmutableState),
    ) -> Result<usize, ClientError> {
        let records = self.read_records(&self.states_path(server_id))?;
        let mut visited = 0;
        for state in records.iter().filter(|s| s.db == db) {
            f(state);
            visited += 1;
        }
        Ok(visited)
    }
}
