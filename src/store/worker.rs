//! Single-consumer request worker
//!
//! One worker thread owns the table file and the cached table. Every
//! operation arrives on one queue and is handled to completion (mutate
//! cache, rewrite file, reply) before the next request is taken, so at most
//! one operation is in flight and all operations complete in arrival order.
//!
//! The worker exits once every sender is dropped and the queue is drained,
//! handing the file back to whoever joins it.

use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::{StoreError, StoreResult};
use super::table_file::TableFile;
use crate::observability::{log_event_with_fields, Event, Logger, Severity, StoreMetrics};

/// One-shot reply channel for a request
pub(crate) type Reply<R> = SyncSender<StoreResult<R>>;

/// A queued store operation and where to send its result
pub(crate) enum Request<T> {
    Append { record: T, reply: Reply<()> },
    ReadAll { reply: Reply<Vec<T>> },
    Update { index: usize, record: T, reply: Reply<()> },
    Delete { index: usize, reply: Reply<()> },
    Reload { reply: Reply<usize> },
    Len { reply: Reply<usize> },
}

/// Owner of the table file and its in-memory mirror
pub(crate) struct TableWorker<T> {
    file: TableFile,
    table: Vec<T>,
    metrics: Arc<StoreMetrics>,
}

impl<T> TableWorker<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub(crate) fn new(file: TableFile, table: Vec<T>, metrics: Arc<StoreMetrics>) -> Self {
        metrics.set_records(table.len());
        Self {
            file,
            table,
            metrics,
        }
    }

    /// Serve requests until the queue is closed and drained.
    pub(crate) fn run(mut self, requests: Receiver<Request<T>>) -> TableFile {
        for request in requests {
            self.handle(request);
        }
        self.file
    }

    fn handle(&mut self, request: Request<T>) {
        // A caller that gave up waiting is not an error for the worker.
        match request {
            Request::Append { record, reply } => {
                let result = self.append(record);
                let _ = reply.send(self.observe(result, StoreMetrics::increment_appends));
            }
            Request::ReadAll { reply } => {
                let result = self.read_all();
                let _ = reply.send(self.observe(result, StoreMetrics::increment_reads));
            }
            Request::Update {
                index,
                record,
                reply,
            } => {
                let result = self.update(index, record);
                let _ = reply.send(self.observe(result, StoreMetrics::increment_updates));
            }
            Request::Delete { index, reply } => {
                let result = self.delete(index);
                let _ = reply.send(self.observe(result, StoreMetrics::increment_deletes));
            }
            Request::Reload { reply } => {
                let result = self.reload();
                let _ = reply.send(self.observe(result, StoreMetrics::increment_reloads));
            }
            Request::Len { reply } => {
                let _ = reply.send(Ok(self.table.len()));
            }
        }
    }

    fn observe<R>(&self, result: StoreResult<R>, on_success: fn(&StoreMetrics)) -> StoreResult<R> {
        match &result {
            Ok(_) => on_success(&self.metrics),
            Err(_) => self.metrics.increment_failures(),
        }
        self.metrics.set_records(self.table.len());
        result
    }

    /// Push onto the cache, then rewrite the file.
    ///
    /// The cache keeps the record even if the rewrite fails.
    pub(crate) fn append(&mut self, record: T) -> StoreResult<()> {
        self.table.push(record);
        self.persist()
    }

    /// Refresh the cache from the file and return a copy.
    ///
    /// On a parse or read failure the cache is left as it was.
    pub(crate) fn read_all(&mut self) -> StoreResult<Vec<T>> {
        self.table = self.file.read_table()?;
        Ok(self.table.clone())
    }

    pub(crate) fn update(&mut self, index: usize, record: T) -> StoreResult<()> {
        let len = self.table.len();
        let slot = self
            .table
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })?;
        *slot = record;
        self.persist()
    }

    pub(crate) fn delete(&mut self, index: usize) -> StoreResult<()> {
        let len = self.table.len();
        if index >= len {
            return Err(StoreError::IndexOutOfRange { index, len });
        }
        self.table.remove(index);
        self.persist()
    }

    /// Replace the cache with the file's contents, discarding any mutation
    /// that failed to reach disk.
    pub(crate) fn reload(&mut self) -> StoreResult<usize> {
        self.table = self.file.read_table()?;
        Ok(self.table.len())
    }

    #[cfg(test)]
    fn table(&self) -> &[T] {
        &self.table
    }

    fn persist(&mut self) -> StoreResult<()> {
        let bytes = self.file.rewrite(&self.table)?;
        self.metrics.record_rewrite(bytes);

        if Logger::enabled(Severity::Trace) {
            let bytes = bytes.to_string();
            let path = self.file.path().display().to_string();
            let records = self.table.len().to_string();
            log_event_with_fields(
                Event::TableRewritten,
                &[
                    ("bytes", bytes.as_str()),
                    ("path", path.as_str()),
                    ("records", records.as_str()),
                ],
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreConfig;
    use serde::Deserialize;
    use std::fs;
    use std::path::Path;
    use std::sync::mpsc;
    use std::thread;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u32,
        name: String,
    }

    fn row(id: u32, name: &str) -> Row {
        Row {
            id,
            name: name.to_string(),
        }
    }

    fn worker_at(path: &Path) -> TableWorker<Row> {
        let mut file = TableFile::open(path, StoreConfig::unsynced()).unwrap();
        let table = file.read_table().unwrap();
        TableWorker::new(file, table, Arc::new(StoreMetrics::new()))
    }

    fn on_disk(path: &Path) -> Vec<Row> {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_append_rewrites_whole_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.json");
        let mut worker = worker_at(&path);

        worker.append(row(1, "u1")).unwrap();
        worker.append(row(2, "u2")).unwrap();

        assert_eq!(on_disk(&path), vec![row(1, "u1"), row(2, "u2")]);
        assert_eq!(worker.table(), &[row(1, "u1"), row(2, "u2")]);
    }

    #[test]
    fn test_update_replaces_only_target() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.json");
        let mut worker = worker_at(&path);
        for i in 0..3 {
            worker.append(row(i, "old")).unwrap();
        }

        worker.update(1, row(42, "new")).unwrap();

        let expected = vec![row(0, "old"), row(42, "new"), row(2, "old")];
        assert_eq!(worker.table(), expected.as_slice());
        assert_eq!(on_disk(&path), expected);
    }

    #[test]
    fn test_update_out_of_range_leaves_table_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.json");
        let mut worker = worker_at(&path);
        worker.append(row(1, "u1")).unwrap();

        let err = worker.update(1, row(9, "x")).unwrap_err();

        assert!(matches!(
            err,
            StoreError::IndexOutOfRange { index: 1, len: 1 }
        ));
        assert_eq!(worker.table(), &[row(1, "u1")]);
        assert_eq!(on_disk(&path), vec![row(1, "u1")]);
    }

    #[test]
    fn test_delete_shifts_later_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.json");
        let mut worker = worker_at(&path);
        for i in 0..4 {
            worker.append(row(i, "r")).unwrap();
        }

        worker.delete(1).unwrap();

        let expected = vec![row(0, "r"), row(2, "r"), row(3, "r")];
        assert_eq!(worker.table(), expected.as_slice());
        assert_eq!(on_disk(&path), expected);
    }

    #[test]
    fn test_delete_on_empty_table_is_out_of_range() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.json");
        let mut worker = worker_at(&path);

        let err = worker.delete(0).unwrap_err();

        assert!(matches!(
            err,
            StoreError::IndexOutOfRange { index: 0, len: 0 }
        ));
        // Nothing was ever written
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_read_all_picks_up_external_changes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.json");
        let mut worker = worker_at(&path);
        worker.append(row(1, "u1")).unwrap();

        fs::write(&path, r#"[{"id":7,"name":"external"}]"#).unwrap();

        assert_eq!(worker.read_all().unwrap(), vec![row(7, "external")]);
        assert_eq!(worker.table(), &[row(7, "external")]);
    }

    #[test]
    fn test_read_all_parse_error_keeps_cache() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.json");
        let mut worker = worker_at(&path);
        worker.append(row(1, "u1")).unwrap();

        fs::write(&path, "not json").unwrap();

        let err = worker.read_all().unwrap_err();
        assert_eq!(err.code(), "JSONDB_PARSE_ERROR");
        assert_eq!(worker.table(), &[row(1, "u1")]);
    }

    #[test]
    fn test_reload_discards_unpersisted_cache() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.json");
        let mut worker = worker_at(&path);
        worker.append(row(1, "u1")).unwrap();

        // Simulate a cache that diverged from disk
        worker.table.push(row(2, "lost"));

        assert_eq!(worker.reload().unwrap(), 1);
        assert_eq!(worker.table(), &[row(1, "u1")]);
    }

    #[test]
    fn test_run_serves_queue_in_order_and_returns_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.json");
        let worker = worker_at(&path);
        let metrics = Arc::clone(&worker.metrics);

        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || worker.run(rx));

        let mut replies = Vec::new();
        for i in 0..5 {
            let (reply, response) = mpsc::sync_channel(1);
            tx.send(Request::Append {
                record: row(i, "q"),
                reply,
            })
            .unwrap();
            replies.push(response);
        }
        let (reply, len_response) = mpsc::sync_channel(1);
        tx.send(Request::Len { reply }).unwrap();
        drop(tx);

        for response in replies {
            response.recv().unwrap().unwrap();
        }
        assert_eq!(len_response.recv().unwrap().unwrap(), 5);

        let file = handle.join().unwrap();
        assert_eq!(file.path(), path.as_path());

        let ids: Vec<u32> = on_disk(&path).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.appends, 5);
        assert_eq!(snapshot.rewrites, 5);
        assert_eq!(snapshot.records, 5);
    }

    #[test]
    fn test_failures_are_counted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.json");
        let mut worker = worker_at(&path);

        let (reply, response) = mpsc::sync_channel(1);
        worker.handle(Request::Delete { index: 3, reply });

        assert!(response.recv().unwrap().is_err());
        assert_eq!(worker.metrics.snapshot().failures, 1);
        assert_eq!(worker.metrics.snapshot().deletes, 0);
    }
}
