// file: src/store/document_store.rs
// description: actor owning the live documents, with a cloneable async handle
// reference: https://docs.rs/tokio/latest/tokio/sync/mpsc

use crate::error::{NewsError, Result};
use crate::models::{ChangeRecord, StoredDocument};
use crate::store::clock::Clock;
use crate::store::disk::{DiskDone, DiskJob, DiskTask, spawn_disk_worker};
use crate::store::snapshot::SnapshotDir;
use crate::store::state::StoreState;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

const COMMAND_QUEUE_CAPACITY: usize = 1024;

enum Command {
    Put {
        name: String,
        content: String,
        ttl_secs: u64,
        reply: oneshot::Sender<Result<bool>>,
    },
    Delete {
        name: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    Expire {
        reply: oneshot::Sender<Result<usize>>,
    },
    Drain {
        reply: oneshot::Sender<Vec<ChangeRecord>>,
    },
    IsAlive {
        name: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    Documents {
        reply: oneshot::Sender<Vec<StoredDocument>>,
    },
}

/// A mutation waiting for its disk job. Puts and deletes touch the live map
/// only once their job succeeded.
enum Pending {
    Put {
        document: StoredDocument,
        reply: oneshot::Sender<Result<bool>>,
    },
    Delete {
        name: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    Expire {
        count: usize,
        reply: oneshot::Sender<Result<usize>>,
    },
}

struct StoreActor {
    state: StoreState,
    clock: Arc<dyn Clock>,
    disk: mpsc::UnboundedSender<DiskTask>,
    completions: mpsc::UnboundedReceiver<DiskDone>,
    commands: mpsc::Receiver<Command>,
    pending: HashMap<u64, Pending>,
    // Names with a queued write or delete; expiry leaves them alone.
    in_flight: HashMap<String, usize>,
    next_ticket: u64,
    accepting: bool,
}

impl StoreActor {
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv(), if self.accepting => match command {
                    Some(command) => self.handle(command),
                    None => self.accepting = false,
                },
                Some(done) = self.completions.recv() => self.complete(done),
                else => break,
            }

            if !self.accepting && self.pending.is_empty() {
                break;
            }
        }
        debug!("Store actor stopped with {} live documents", self.state.len());
    }

    // Never awaits: disk work is only queued here.
    fn handle(&mut self, command: Command) {
        let now = self.clock.now();

        match command {
            Command::Put {
                name,
                content,
                ttl_secs,
                reply,
            } => {
                let document = StoredDocument::new(name, content, now.saturating_add(ttl_secs));
                self.mark_busy(&document.name);
                self.submit(
                    DiskJob::Write(document.clone()),
                    Pending::Put { document, reply },
                );
            }
            Command::Delete { name, reply } => {
                if !self.state.contains(&name) && !self.in_flight.contains_key(&name) {
                    let _ = reply.send(Ok(false));
                    return;
                }
                self.mark_busy(&name);
                self.submit(
                    DiskJob::Remove(vec![name.clone()]),
                    Pending::Delete { name, reply },
                );
            }
            Command::Expire { reply } => {
                let in_flight = &self.in_flight;
                let expired = self
                    .state
                    .expire(now, |name| in_flight.contains_key(name));
                let count = expired.len();
                if count == 0 {
                    let _ = reply.send(Ok(0));
                } else {
                    self.submit(DiskJob::Remove(expired), Pending::Expire { count, reply });
                }
            }
            Command::Drain { reply } => {
                let _ = reply.send(self.state.drain());
            }
            Command::IsAlive { name, reply } => {
                let _ = reply.send(self.state.is_alive(&name, now));
            }
            Command::Documents { reply } => {
                let _ = reply.send(self.state.documents());
            }
        }
    }

    /// Applies a finished disk job. Completions arrive in submission order,
    /// so the live map follows the same order as the content directory.
    fn complete(&mut self, done: DiskDone) {
        let Some(pending) = self.pending.remove(&done.ticket) else {
            warn!("Disk completion for unknown ticket {}", done.ticket);
            return;
        };
        let now = self.clock.now();

        match pending {
            Pending::Put { document, reply } => {
                self.mark_idle(&document.name);
                let outcome = done.result.map(|()| self.state.put(document, now));
                let _ = reply.send(outcome);
            }
            Pending::Delete { name, reply } => {
                self.mark_idle(&name);
                let outcome = done
                    .result
                    .map(|()| self.state.remove(&name, now).is_some());
                let _ = reply.send(outcome);
            }
            Pending::Expire { count, reply } => {
                let _ = reply.send(done.result.map(|()| count));
            }
        }
    }

    fn submit(&mut self, job: DiskJob, pending: Pending) {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending.insert(ticket, pending);

        // A stopped worker drops the reply, which the caller sees as StoreClosed.
        if self.disk.send(DiskTask { ticket, job }).is_err()
            && let Some(pending) = self.pending.remove(&ticket)
        {
            self.release(pending);
        }
    }

    fn release(&mut self, pending: Pending) {
        match pending {
            Pending::Put { document, .. } => self.mark_idle(&document.name),
            Pending::Delete { name, .. } => self.mark_idle(&name),
            Pending::Expire { .. } => {}
        }
    }

    fn mark_busy(&mut self, name: &str) {
        *self.in_flight.entry(name.to_string()).or_default() += 1;
    }

    fn mark_idle(&mut self, name: &str) {
        if let Some(count) = self.in_flight.get_mut(name) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(name);
            }
        }
    }
}

/// Handle to the document store. Cheap to clone; all clones talk to one actor.
#[derive(Clone)]
pub struct DocumentStore {
    commands: mpsc::Sender<Command>,
}

impl DocumentStore {
    /// Restores persisted documents from `content_dir` and starts the actor.
    pub async fn open(content_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self> {
        let content_dir = content_dir.into();
        let now = clock.now();

        let (dir, outcome) = tokio::task::spawn_blocking(move || {
            let dir = SnapshotDir::open(content_dir)?;
            let outcome = dir.restore(now)?;
            Ok::<_, NewsError>((dir, outcome))
        })
        .await??;

        let mut state = StoreState::new();
        for document in outcome.documents {
            state.restore(document, now);
        }

        info!(
            "Document store ready at {} with {} live documents",
            dir.root().display(),
            state.len()
        );

        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let disk = spawn_disk_worker(dir, completions_tx);
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);

        let actor = StoreActor {
            state,
            clock,
            disk,
            completions: completions_rx,
            commands: commands_rx,
            pending: HashMap::new(),
            in_flight: HashMap::new(),
            next_ticket: 0,
            accepting: true,
        };
        tokio::spawn(actor.run());

        Ok(Self {
            commands: commands_tx,
        })
    }

    /// Inserts or replaces `name`. Returns true for a replacement.
    ///
    /// Completes after the snapshot is on disk. A failed write leaves the
    /// store as it was before the call.
    pub async fn put(&self, name: &str, content: String, ttl_secs: u64) -> Result<bool> {
        self.request(|reply| Command::Put {
            name: name.to_string(),
            content,
            ttl_secs,
            reply,
        })
        .await?
    }

    pub async fn delete(&self, name: &str) -> Result<bool> {
        self.request(|reply| Command::Delete {
            name: name.to_string(),
            reply,
        })
        .await?
    }

    /// Sweeps documents whose expiry has passed. Returns how many were removed.
    pub async fn expire_outdated(&self) -> Result<usize> {
        self.request(|reply| Command::Expire { reply }).await?
    }

    pub async fn drain_change_log(&self) -> Result<Vec<ChangeRecord>> {
        self.request(|reply| Command::Drain { reply }).await
    }

    pub async fn is_alive(&self, name: &str) -> Result<bool> {
        self.request(|reply| Command::IsAlive {
            name: name.to_string(),
            reply,
        })
        .await?
    }

    pub async fn documents(&self) -> Result<Vec<StoredDocument>> {
        self.request(|reply| Command::Documents { reply }).await
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| NewsError::StoreClosed)?;
        response.await.map_err(|_| NewsError::StoreClosed)
    }
}
