use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};

use crate::{
    core::store::{HikeStore, StoreError},
    hike::{HikeDraft, HikeRecord},
    op::{AppliedChange, Change},
    persist::{BlobStore, HIKES_KEY, PersistError, load_store_reporting, write_collection},
    types::{Coords, Generation, HikeId},
    validate::{ValidationError, normalize},
};

use super::events::{HikeEvent, PersistStatus};

/// Errors returned to callers of [`HikeLogHandle`].
///
/// Persistence failures are never returned from mutations; they surface on
/// [`HikeLogHandle::persist_status`] and as [`HikeEvent::PersistFailed`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The draft was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The store rejected the mutation.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Startup persistence plumbing failed.
    #[error(transparent)]
    Persist(#[from] PersistError),
    /// The runtime loop has stopped.
    #[error("runtime channel closed")]
    ChannelClosed,
}

/// Runtime tuning and storage location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Key under which the collection blob is stored.
    pub storage_key: String,
    /// Capacity of the command channel.
    pub command_queue_bound: usize,
    /// Capacity of the persistence queue before mutations wait.
    pub persist_queue_bound: usize,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            storage_key: HIKES_KEY.to_string(),
            command_queue_bound: 256,
            persist_queue_bound: 64,
            event_capacity: 1024,
        }
    }
}

/// Cloneable handle to the single-writer hike runtime.
#[derive(Clone)]
pub struct HikeLogHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<HikeEvent>,
    status_rx: watch::Receiver<PersistStatus>,
}

enum Command {
    Save {
        draft: HikeDraft,
        editing: Option<HikeId>,
        coords: Option<Coords>,
        resp: oneshot::Sender<Result<HikeId, RuntimeError>>,
    },
    Delete {
        id: HikeId,
        resp: oneshot::Sender<bool>,
    },
    ResetAll {
        resp: oneshot::Sender<()>,
    },
    Get {
        id: HikeId,
        resp: oneshot::Sender<Option<HikeRecord>>,
    },
    List {
        resp: oneshot::Sender<Vec<HikeRecord>>,
    },
    Flush {
        resp: oneshot::Sender<PersistStatus>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

enum BlobRequest {
    Write {
        generation: Generation,
        records: Vec<HikeRecord>,
    },
    Remove {
        generation: Generation,
    },
}

impl BlobRequest {
    fn generation(&self) -> Generation {
        match self {
            BlobRequest::Write { generation, .. } | BlobRequest::Remove { generation } => *generation,
        }
    }
}

enum PersistMsg {
    Blob(BlobRequest),
    Flush { resp: oneshot::Sender<()> },
    Shutdown { resp: oneshot::Sender<()> },
}

struct Outlets {
    persist_tx: Option<mpsc::Sender<PersistMsg>>,
    events_tx: broadcast::Sender<HikeEvent>,
    status_tx: Arc<watch::Sender<PersistStatus>>,
}

/// Loads the collection from `sink`, then starts the runtime on it.
///
/// Load failures are logged and start the runtime with an empty collection;
/// the failure is also left in [`PersistStatus::last_error`].
pub async fn open_hikelog(
    sink: Box<dyn BlobStore>,
    config: RuntimeConfig,
) -> Result<HikeLogHandle, RuntimeError> {
    let key = config.storage_key.clone();
    let (sink, (store, load_error)) = tokio::task::spawn_blocking(move || {
        let loaded = load_store_reporting(&*sink, &key);
        (sink, loaded)
    })
    .await
    .map_err(|e| PersistError::Message(format!("join error: {e}")))?;

    Ok(start_runtime(
        store,
        Some(sink),
        config,
        load_error.map(|e| e.to_string()),
    ))
}

/// Starts the runtime on an already loaded store.
///
/// Without a sink every change is reported durable immediately.
pub fn spawn_hikelog(
    store: HikeStore,
    sink: Option<Box<dyn BlobStore>>,
    config: RuntimeConfig,
) -> HikeLogHandle {
    start_runtime(store, sink, config, None)
}

fn start_runtime(
    store: HikeStore,
    sink: Option<Box<dyn BlobStore>>,
    config: RuntimeConfig,
    last_error: Option<String>,
) -> HikeLogHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<HikeEvent>(config.event_capacity.max(1));

    let generation = store.latest_generation();
    let (status_tx, status_rx) = watch::channel(PersistStatus {
        issued: generation,
        attempted: generation,
        durable: generation,
        last_error,
    });
    let status_tx = Arc::new(status_tx);

    let persist_tx = sink.map(|sink| {
        let (persist_tx, persist_rx) = mpsc::channel::<PersistMsg>(config.persist_queue_bound.max(1));
        spawn_persistence_worker(
            sink,
            config.storage_key.clone(),
            persist_rx,
            Arc::clone(&status_tx),
            events_tx.clone(),
        );
        persist_tx
    });

    let outlets = Outlets {
        persist_tx,
        events_tx: events_tx.clone(),
        status_tx,
    };

    tokio::spawn(async move {
        let mut store = store;
        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &mut store, &outlets).await {
                break;
            }
        }
        tracing::debug!("hike runtime stopped");
    });

    HikeLogHandle {
        cmd_tx,
        events_tx,
        status_rx,
    }
}

impl HikeLogHandle {
    /// Subscribes to runtime events.
    pub fn subscribe(&self) -> broadcast::Receiver<HikeEvent> {
        self.events_tx.subscribe()
    }

    /// Watches persistence progress and the last persistence error.
    pub fn persist_status(&self) -> watch::Receiver<PersistStatus> {
        self.status_rx.clone()
    }

    /// Validates `draft` and creates (`editing == None`) or updates a hike.
    ///
    /// Returns the id of the saved hike. Persistence is started but not
    /// awaited.
    pub async fn save(
        &self,
        draft: HikeDraft,
        editing: Option<HikeId>,
        coords: Option<Coords>,
    ) -> Result<HikeId, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Save {
            draft,
            editing,
            coords,
            resp: tx,
        })
        .await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Deletes a hike. Returns false when no hike had this id.
    pub async fn delete(&self, id: HikeId) -> Result<bool, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Delete { id, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Empties the collection and removes the persisted blob.
    pub async fn reset_all(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::ResetAll { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Fetches one hike by id.
    pub async fn get(&self, id: HikeId) -> Result<Option<HikeRecord>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Get { id, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Newest-first snapshot of the collection.
    pub async fn list(&self) -> Result<Vec<HikeRecord>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::List { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Waits until every issued write has been attempted.
    pub async fn flush(&self) -> Result<PersistStatus, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Flush { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Drains pending writes and stops the runtime.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    async fn send(&self, cmd: Command) -> Result<(), RuntimeError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| RuntimeError::ChannelClosed)
    }
}

async fn handle_command(cmd: Command, store: &mut HikeStore, outlets: &Outlets) -> bool {
    match cmd {
        Command::Save {
            draft,
            editing,
            coords,
            resp,
        } => {
            let res = normalize(&draft, coords)
                .map_err(RuntimeError::from)
                .and_then(|fields| match editing {
                    None => Ok(store.insert(fields)),
                    Some(id) => store
                        .update(&id, fields)
                        .map(|applied| (id, applied))
                        .map_err(RuntimeError::from),
                });

            let out = match res {
                Ok((id, applied)) => {
                    tracing::debug!(%id, generation = applied.generation, "saved hike");
                    publish(store, applied, outlets).await;
                    Ok(id)
                }
                Err(err) => {
                    tracing::debug!(error = %err, "save rejected");
                    Err(err)
                }
            };
            let _ = resp.send(out);
        }
        Command::Delete { id, resp } => {
            let removed = match store.delete(&id) {
                Some(applied) => {
                    tracing::debug!(%id, generation = applied.generation, "deleted hike");
                    publish(store, applied, outlets).await;
                    true
                }
                None => false,
            };
            let _ = resp.send(removed);
        }
        Command::ResetAll { resp } => {
            let applied = store.clear();
            tracing::info!(generation = applied.generation, "reset all hikes");
            publish(store, applied, outlets).await;
            let _ = resp.send(());
        }
        Command::Get { id, resp } => {
            let _ = resp.send(store.get_cloned(&id));
        }
        Command::List { resp } => {
            let _ = resp.send(store.to_records());
        }
        Command::Flush { resp } => {
            if let Some(tx) = &outlets.persist_tx {
                let (done_tx, done_rx) = oneshot::channel();
                if tx.send(PersistMsg::Flush { resp: done_tx }).await.is_ok() {
                    let _ = done_rx.await;
                }
            }
            let _ = resp.send(outlets.status_tx.borrow().clone());
        }
        Command::Shutdown { resp } => {
            if let Some(tx) = &outlets.persist_tx {
                let (done_tx, done_rx) = oneshot::channel();
                if tx.send(PersistMsg::Shutdown { resp: done_tx }).await.is_ok() {
                    let _ = done_rx.await;
                }
            }
            let _ = resp.send(());
            return true;
        }
    }

    false
}

/// Announces the change, then hands the new collection to the persistence
/// worker.
async fn publish(store: &HikeStore, applied: AppliedChange, outlets: &Outlets) {
    let generation = applied.generation;
    let removes_blob = applied.removes_blob();
    let event = match applied.change {
        Change::Created { id } => HikeEvent::Created { id },
        Change::Updated { id } => HikeEvent::Updated { id },
        Change::Deleted { id } => HikeEvent::Deleted { id },
        Change::Cleared => HikeEvent::Reset,
    };
    let _ = outlets.events_tx.send(event);
    outlets.status_tx.send_modify(|s| s.issued = generation);

    match &outlets.persist_tx {
        Some(tx) => {
            let request = if removes_blob {
                BlobRequest::Remove { generation }
            } else {
                BlobRequest::Write {
                    generation,
                    records: store.to_records(),
                }
            };
            if tx.send(PersistMsg::Blob(request)).await.is_err() {
                let error = "persistence worker stopped".to_string();
                tracing::error!(generation, %error, "failed to enqueue hike write");
                record_outcome(outlets.status_tx.as_ref(), &outlets.events_tx, generation, Err(error));
            }
        }
        None => record_outcome(outlets.status_tx.as_ref(), &outlets.events_tx, generation, Ok(())),
    }

}

fn spawn_persistence_worker(
    sink: Box<dyn BlobStore>,
    key: String,
    mut rx: mpsc::Receiver<PersistMsg>,
    status_tx: Arc<watch::Sender<PersistStatus>>,
    events_tx: broadcast::Sender<HikeEvent>,
) {
    let sink = Arc::new(Mutex::new(sink));
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let (pending, control) = coalesce(msg, &mut rx);

            if let Some(request) = pending {
                let generation = request.generation();
                let result = apply_request(&sink, &key, request).await;
                if let Err(error) = &result {
                    tracing::error!(generation, key = %key, %error, "failed to persist hikes");
                }
                record_outcome(
                    status_tx.as_ref(),
                    &events_tx,
                    generation,
                    result.map_err(|e| e.to_string()),
                );
            }

            match control {
                Some(PersistMsg::Flush { resp }) => {
                    let _ = resp.send(());
                }
                Some(PersistMsg::Shutdown { resp }) => {
                    let _ = resp.send(());
                    break;
                }
                Some(PersistMsg::Blob(_)) | None => {}
            }
        }
    });
}

/// Collapses queued blob requests into the newest one, stopping at the first
/// control message so flush and shutdown keep their place in line.
fn coalesce(
    first: PersistMsg,
    rx: &mut mpsc::Receiver<PersistMsg>,
) -> (Option<BlobRequest>, Option<PersistMsg>) {
    let mut pending: Option<BlobRequest> = None;
    let mut next = Some(first);

    while let Some(msg) = next.take() {
        match msg {
            PersistMsg::Blob(request) => {
                if let Some(prev) = pending.replace(request) {
                    tracing::trace!(generation = prev.generation(), "superseded hike write");
                }
            }
            control => return (pending, Some(control)),
        }
        next = rx.try_recv().ok();
    }

    (pending, None)
}

async fn apply_request(
    sink: &Arc<Mutex<Box<dyn BlobStore>>>,
    key: &str,
    request: BlobRequest,
) -> Result<(), PersistError> {
    let sink_ref = Arc::clone(sink);
    let key = key.to_string();
    tokio::task::spawn_blocking(move || {
        let mut sink = sink_ref.blocking_lock();
        match request {
            BlobRequest::Write { records, .. } => write_collection(&mut **sink, &key, &records),
            BlobRequest::Remove { .. } => sink.remove(&key),
        }
    })
    .await
    .map_err(|e| PersistError::Message(format!("join error: {e}")))?
}

fn record_outcome(
    status_tx: &watch::Sender<PersistStatus>,
    events_tx: &broadcast::Sender<HikeEvent>,
    generation: Generation,
    result: Result<(), String>,
) {
    let event = match result {
        Ok(()) => {
            status_tx.send_modify(|s| {
                s.attempted = s.attempted.max(generation);
                s.durable = s.durable.max(generation);
                s.last_error = None;
            });
            HikeEvent::Persisted { generation }
        }
        Err(error) => {
            status_tx.send_modify(|s| {
                s.attempted = s.attempted.max(generation);
                s.last_error = Some(error.clone());
            });
            HikeEvent::PersistFailed { generation, error }
        }
    };
    let _ = events_tx.send(event);
}
