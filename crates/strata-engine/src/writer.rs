//! The single-writer commit task.
//!
//! Request handlers validate and encode, then submit a [`CommitJob`]
//! over the channel. The writer task is the only mutator of the log
//! cursor and the index, so precondition evaluation and the append are
//! atomic as a pair: no competing commit can invalidate a just-passed
//! `MustNotExist` check before the append lands.
//!
//! Cancellation: a caller that stops awaiting before its job is
//! dequeued simply never observes the result; once dequeued the commit
//! always completes — the reply send failing only means nobody is
//! listening anymore.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use strata_index::KvIndex;
use strata_txlog::{TxLog, TxLogError};
use strata_types::TxClock;
use strata_types::TxHeader;
use strata_types::entry::EntrySpec;
use strata_types::requests::{Precondition, Requirement};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::EngineError;

/// One commit, encoded and validated, awaiting serialization.
pub(crate) struct CommitJob {
    /// Entry specs in commit order.
    pub specs: Vec<EntrySpec>,
    /// Raw keys for the index update, aligned with `specs`.
    pub keys: Vec<Vec<u8>>,
    /// Preconditions to evaluate under the writer slot.
    pub preconditions: Vec<Precondition>,
    /// Where the caller awaits the outcome.
    pub reply: oneshot::Sender<Result<TxHeader, EngineError>>,
}

/// Spawn the writer task. Dropping the returned sender stops it.
pub(crate) fn spawn_writer(
    log: Arc<TxLog>,
    index: Arc<KvIndex>,
    clock: Arc<TxClock>,
    degraded: Arc<AtomicBool>,
) -> mpsc::Sender<CommitJob> {
    let (job_tx, mut job_rx) = mpsc::channel::<CommitJob>(128);

    tokio::spawn(async move {
        while let Some(job) = job_rx.recv().await {
            let result = commit(&log, &index, &clock, &degraded, &job);
            // The commit stands whether or not the caller still listens.
            let _ = job.reply.send(result);
        }
        debug!("writer task stopped");
    });

    job_tx
}

/// Proposed → Validated → Appended → Indexed, under the writer slot.
fn commit(
    log: &TxLog,
    index: &KvIndex,
    clock: &TxClock,
    degraded: &AtomicBool,
    job: &CommitJob,
) -> Result<TxHeader, EngineError> {
    if degraded.load(Ordering::Acquire) {
        return Err(EngineError::Degraded);
    }

    for pre in &job.preconditions {
        let holds = match pre.requirement {
            Requirement::MustExist => index.contains(&pre.key),
            Requirement::MustNotExist => !index.contains(&pre.key),
        };
        if !holds {
            return Err(EngineError::ConstraintFailed {
                key: pre.key.clone(),
            });
        }
    }

    let ts = clock.tick();
    let header = match log.append(&job.specs, ts) {
        Ok(header) => header,
        Err(e @ TxLogError::Storage(_)) => {
            // The backend's on-disk state is no longer trustworthy.
            degraded.store(true, Ordering::Release);
            warn!(error = %e, "append failed, store entering read-only degraded mode");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    index.apply(header.id, job.keys.iter().cloned());

    debug!(
        tx = header.id,
        entries = header.nentries,
        "committed transaction"
    );

    Ok(header)
}
