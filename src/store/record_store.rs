//! Record store handle
//!
//! Lifecycle: `connect` (Opened) → `init` (Initialized) → `close` (Closed).
//! CRUD is only valid while Initialized. The handle is `Send + Sync`; share
//! it between threads with `Arc`.

use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::config::StoreConfig;
use super::errors::{StoreError, StoreResult};
use super::table_file::TableFile;
use super::worker::{Reply, Request, TableWorker};
use crate::observability::{log_event_with_fields, Event, Logger, MetricsSnapshot, StoreMetrics};

/// Observable lifecycle state of a store handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// File open, table not loaded
    Opened,
    /// Table loaded, worker running
    Initialized,
    /// Worker stopped, file closed (terminal)
    Closed,
}

impl fmt::Display for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoreState::Opened => "opened",
            StoreState::Initialized => "initialized",
            StoreState::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

enum Lifecycle<T> {
    Opened(TableFile),
    Initialized {
        requests: Sender<Request<T>>,
        worker: JoinHandle<TableFile>,
    },
    Closed,
}

/// A single-table JSON record store.
///
/// The whole table lives in one file as a JSON array and is rewritten in
/// full on every mutation. All operations go through one request queue and
/// are applied one at a time in arrival order.
pub struct RecordStore<T> {
    path: PathBuf,
    lifecycle: Mutex<Lifecycle<T>>,
    metrics: Arc<StoreMetrics>,
}

impl<T> RecordStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    /// Opens or creates the table file with the default configuration.
    ///
    /// Does not load any data; call [`init`](Self::init) before any CRUD
    /// operation.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` on permission or path errors.
    pub fn connect(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::connect_with_config(path, StoreConfig::default())
    }

    /// Opens or creates the table file with an explicit configuration.
    pub fn connect_with_config(path: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let path = path.as_ref();
        let file = TableFile::open(path, config)?;

        log_event_with_fields(
            Event::StoreOpened,
            &[("path", path.display().to_string().as_str())],
        );

        Ok(Self {
            path: path.to_path_buf(),
            lifecycle: Mutex::new(Lifecycle::Opened(file)),
            metrics: Arc::new(StoreMetrics::new()),
        })
    }

    /// Loads the file into memory and starts the request worker.
    ///
    /// # Errors
    ///
    /// - `Parse` if the file is not a JSON array of records
    /// - `Io` if the file cannot be read
    /// - `AlreadyInitialized` / `Closed` outside the Opened state
    ///
    /// A failed load leaves the store Opened, so `init` can be retried.
    pub fn init(&self) -> StoreResult<()> {
        let mut lifecycle = self.lock()?;

        let table = match &mut *lifecycle {
            Lifecycle::Opened(file) => file.read_table::<T>()?,
            Lifecycle::Initialized { .. } => return Err(StoreError::AlreadyInitialized),
            Lifecycle::Closed => return Err(StoreError::Closed),
        };
        let Lifecycle::Opened(file) = mem::replace(&mut *lifecycle, Lifecycle::Closed) else {
            return Err(StoreError::Closed);
        };

        let records = table.len();
        self.metrics.increment_reloads();
        let worker = TableWorker::new(file, table, Arc::clone(&self.metrics));
        let (requests, queue) = mpsc::channel();

        // A failed spawn drops the worker and its file; the store stays Closed.
        let worker = thread::Builder::new()
            .name("jsondb-worker".to_string())
            .spawn(move || worker.run(queue))
            .map_err(|e| StoreError::io("Failed to spawn store worker", e))?;

        *lifecycle = Lifecycle::Initialized { requests, worker };
        drop(lifecycle);

        log_event_with_fields(
            Event::StoreInitialized,
            &[
                ("path", self.path.display().to_string().as_str()),
                ("records", records.to_string().as_str()),
            ],
        );
        Ok(())
    }

    /// Stops the worker and closes the file.
    ///
    /// Requests queued before `close` are still served. Any operation issued
    /// afterwards fails with `Closed`, as does a second `close`.
    pub fn close(&self) -> StoreResult<()> {
        let mut lifecycle = self.lock()?;
        let previous = mem::replace(&mut *lifecycle, Lifecycle::Closed);
        drop(lifecycle);

        let file = match previous {
            Lifecycle::Opened(file) => file,
            Lifecycle::Initialized { requests, worker } => {
                drop(requests);
                worker.join().map_err(|_| StoreError::WorkerUnavailable)?
            }
            Lifecycle::Closed => return Err(StoreError::Closed),
        };
        file.close()?;

        if Logger::enabled(Event::StoreClosed.severity()) {
            let path = self.path.display().to_string();
            match self.metrics.to_json() {
                Ok(metrics) => log_event_with_fields(
                    Event::StoreClosed,
                    &[("metrics", metrics.as_str()), ("path", path.as_str())],
                ),
                Err(_) => log_event_with_fields(Event::StoreClosed, &[("path", path.as_str())]),
            }
        }
        Ok(())
    }

    /// Appends a record and rewrites the file.
    ///
    /// On `Io` or `Serialization` failure the cached table already holds the
    /// record while the file does not; call [`reload`](Self::reload) to
    /// resynchronize.
    pub fn append(&self, record: T) -> StoreResult<()> {
        self.submit(|reply| Request::Append { record, reply })
    }

    /// Refreshes the table from the file and returns all records in order.
    pub fn read_all(&self) -> StoreResult<Vec<T>> {
        self.submit(|reply| Request::ReadAll { reply })
    }

    /// Replaces the record at `index` and rewrites the file.
    ///
    /// Fails with `IndexOutOfRange` when `index >= len`, leaving the table
    /// unchanged.
    pub fn update(&self, index: usize, record: T) -> StoreResult<()> {
        self.submit(|reply| Request::Update {
            index,
            record,
            reply,
        })
    }

    /// Removes the record at `index`, shifting later records down by one,
    /// and rewrites the file.
    pub fn delete(&self, index: usize) -> StoreResult<()> {
        self.submit(|reply| Request::Delete { index, reply })
    }

    /// Replaces the cached table with the file's contents.
    ///
    /// This is the remedy after a failed mutation left the cache ahead of
    /// the file. Returns the number of records loaded.
    pub fn reload(&self) -> StoreResult<usize> {
        let records = self.submit(|reply| Request::Reload { reply })?;
        log_event_with_fields(
            Event::StoreReloaded,
            &[
                ("path", self.path.display().to_string().as_str()),
                ("records", records.to_string().as_str()),
            ],
        );
        Ok(records)
    }

    /// Number of records in the cached table
    pub fn len(&self) -> StoreResult<usize> {
        self.submit(|reply| Request::Len { reply })
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn submit<R>(&self, request: impl FnOnce(Reply<R>) -> Request<T>) -> StoreResult<R> {
        let (reply, response) = mpsc::sync_channel(1);

        // Enqueue under the lifecycle lock so close cannot slip in between
        // the state check and the send.
        {
            let lifecycle = self.lock()?;
            match &*lifecycle {
                Lifecycle::Initialized { requests, .. } => requests
                    .send(request(reply))
                    .map_err(|_| StoreError::WorkerUnavailable)?,
                Lifecycle::Opened(_) => return Err(StoreError::NotInitialized),
                Lifecycle::Closed => return Err(StoreError::Closed),
            }
        }

        response
            .recv()
            .map_err(|_| StoreError::WorkerUnavailable)?
    }
}

impl<T> RecordStore<T> {
    /// Path of the table file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current lifecycle state
    pub fn state(&self) -> StoreState {
        match self.lock() {
            Ok(lifecycle) => match &*lifecycle {
                Lifecycle::Opened(_) => StoreState::Opened,
                Lifecycle::Initialized { .. } => StoreState::Initialized,
                Lifecycle::Closed => StoreState::Closed,
            },
            Err(_) => StoreState::Closed,
        }
    }

    /// Snapshot of this store's operation counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Lifecycle<T>>> {
        self.lifecycle.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl<T> fmt::Debug for RecordStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("path", &self.path)
            .field("state", &self.state())
            .finish()
    }
}

impl<T> Drop for RecordStore<T> {
    fn drop(&mut self) {
        // Best-effort close for handles that were never closed explicitly.
        let lifecycle = match self.lifecycle.get_mut() {
            Ok(lifecycle) => lifecycle,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Lifecycle::Initialized { requests, worker } =
            mem::replace(lifecycle, Lifecycle::Closed)
        {
            drop(requests);
            let _ = worker.join();
        }
    }
}
