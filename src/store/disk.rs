// file: src/store/disk.rs
// description: fifo worker that applies snapshot writes and deletions off the actor

use crate::error::{NewsError, Result};
use crate::models::StoredDocument;
use crate::store::snapshot::SnapshotDir;
use tokio::sync::mpsc;
use tracing::{debug, error};

pub(crate) enum DiskJob {
    Write(StoredDocument),
    Remove(Vec<String>),
}

pub(crate) struct DiskTask {
    pub ticket: u64,
    pub job: DiskJob,
}

/// Outcome of one job, reported back to the actor under the job's ticket.
pub(crate) struct DiskDone {
    pub ticket: u64,
    pub result: Result<()>,
}

/// Jobs run one at a time in submission order on the blocking pool, and
/// their outcomes are sent to `completions` in that same order.
pub(crate) fn spawn_disk_worker(
    dir: SnapshotDir,
    completions: mpsc::UnboundedSender<DiskDone>,
) -> mpsc::UnboundedSender<DiskTask> {
    let (tx, mut rx) = mpsc::unbounded_channel::<DiskTask>();

    tokio::spawn(async move {
        while let Some(DiskTask { ticket, job }) = rx.recv().await {
            let dir = dir.clone();
            let result = tokio::task::spawn_blocking(move || execute(&dir, job))
                .await
                .map_err(NewsError::from)
                .and_then(|r| r);

            if let Err(e) = &result {
                error!("Snapshot operation failed: {}", e);
            }
            if completions.send(DiskDone { ticket, result }).is_err() {
                break;
            }
        }
        debug!("Disk worker stopped");
    });

    tx
}

fn execute(dir: &SnapshotDir, job: DiskJob) -> Result<()> {
    match job {
        DiskJob::Write(document) => dir.write(&document),
        DiskJob::Remove(names) => {
            let mut first_error = None;
            for name in &names {
                if let Err(e) = dir.remove(name) {
                    first_error.get_or_insert(e);
                }
            }
            first_error.map_or(Ok(()), Err)
        }
    }
}
