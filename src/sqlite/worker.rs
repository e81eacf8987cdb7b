//! The serial execution queue.
//!
//! Every unit of work submitted to a [`SqlQueue`] runs on one dedicated
//! worker thread, in submission order, against the single [`Connection`] that
//! thread owns. Callers on any thread choose how to wait: not at all
//! (`run`), through a completion callback (`run_with_completion`), by
//! blocking (`run_synchronously`) or by awaiting (`run_async`).

mod channel;
mod dispatcher;
mod manager;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::SqlResult;
use crate::tx_outcome::TxOutcome;

use super::config::QueueOptions;
use super::connection::{ChangeEvent, ChangeHook, Connection};

use manager::QueueWorker;

/// Handle to a database served by a dedicated worker thread.
///
/// Cheap to clone; all clones feed the same worker. When the last clone is
/// dropped, work already submitted still runs, then the connection is closed
/// and the worker exits.
#[derive(Clone)]
pub struct SqlQueue {
    worker: Arc<QueueWorker>,
}

impl SqlQueue {
    /// Opens the database at `path` with default options.
    ///
    /// # Errors
    /// Returns [`SqlError::Open`](crate::SqlError::Open) if the database
    /// cannot be opened or the worker thread cannot be started.
    pub fn open(path: impl Into<String>) -> SqlResult<Self> {
        Self::builder(path).open()
    }

    pub(crate) fn with_options(options: QueueOptions) -> SqlResult<Self> {
        let worker = QueueWorker::spawn(options)?;
        Ok(Self {
            worker: Arc::new(worker),
        })
    }

    /// Submits `work` without waiting for it. A failure is only logged.
    pub fn run<F>(&self, work: F)
    where
        F: FnOnce(&Connection) -> SqlResult<()> + Send + 'static,
    {
        self.worker.submit(Box::new(move |conn: &Connection| {
            if let Err(err) = work(conn) {
                tracing::warn!(error = %err, "queued unit of work failed");
            }
        }));
    }

    /// Submits `work`; `completion` receives its outcome on the worker thread.
    pub fn run_with_completion<F, C>(&self, work: F, completion: C)
    where
        F: FnOnce(&Connection) -> SqlResult<()> + Send + 'static,
        C: FnOnce(SqlResult<()>) + Send + 'static,
    {
        self.worker
            .submit(Box::new(move |conn: &Connection| completion(work(conn))));
    }

    /// Runs `work` and blocks until it has finished.
    ///
    /// # Errors
    /// Returns whatever `work` returns.
    ///
    /// # Panics
    /// When called from inside a unit of work (or change hook) running on this
    /// queue, which would otherwise deadlock.
    pub fn run_synchronously<T, F>(&self, work: F) -> SqlResult<T>
    where
        F: FnOnce(&Connection) -> SqlResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.worker.request_blocking(work)
    }

    /// Submits `work` immediately; the future resolves once it has finished.
    ///
    /// Submission happens in this call, not on first poll, so the queue order
    /// is the call order and dropping the future unpolled does not cancel the
    /// work. The future does not borrow the queue.
    ///
    /// # Errors
    /// Returns whatever `work` returns.
    pub fn run_async<T, F>(&self, work: F) -> impl Future<Output = SqlResult<T>> + use<T, F>
    where
        F: FnOnce(&Connection) -> SqlResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.worker.request(work).wait()
    }

    /// Submits `work` as an exclusive transaction without waiting for it.
    pub fn transaction<F>(&self, work: F)
    where
        F: FnOnce(&Connection) -> SqlResult<TxOutcome> + Send + 'static,
    {
        self.run(move |conn| conn.transaction(work).map(|_| ()));
    }

    /// Submits `work` as an exclusive transaction; `completion` receives the
    /// outcome (or the error that caused a rollback).
    pub fn transaction_with_completion<F, C>(&self, work: F, completion: C)
    where
        F: FnOnce(&Connection) -> SqlResult<TxOutcome> + Send + 'static,
        C: FnOnce(SqlResult<TxOutcome>) + Send + 'static,
    {
        self.worker.submit(Box::new(move |conn: &Connection| {
            completion(conn.transaction(work));
        }));
    }

    /// Runs `work` as an exclusive transaction and blocks until it has finished.
    ///
    /// # Errors
    /// Returns the error from `work` after rolling back, or a failure to begin
    /// or end the transaction.
    ///
    /// # Panics
    /// Same as [`SqlQueue::run_synchronously`].
    pub fn transaction_synchronously<F>(&self, work: F) -> SqlResult<TxOutcome>
    where
        F: FnOnce(&Connection) -> SqlResult<TxOutcome> + Send + 'static,
    {
        self.worker.request_blocking(move |conn| conn.transaction(work))
    }

    /// Submits `work` as an exclusive transaction immediately, like
    /// [`SqlQueue::run_async`].
    ///
    /// # Errors
    /// Same as [`SqlQueue::transaction_synchronously`].
    pub fn transaction_async<F>(
        &self,
        work: F,
    ) -> impl Future<Output = SqlResult<TxOutcome>> + use<F>
    where
        F: FnOnce(&Connection) -> SqlResult<TxOutcome> + Send + 'static,
    {
        self.worker
            .request(move |conn| conn.transaction(work))
            .wait()
    }

    /// Queues a backup to `path` without waiting for it.
    pub fn store_backup(&self, path: impl Into<PathBuf>, vacuum: bool) {
        let path = path.into();
        self.run(move |conn| conn.store_backup(path, vacuum));
    }

    pub fn store_backup_with_completion<C>(
        &self,
        path: impl Into<PathBuf>,
        vacuum: bool,
        completion: C,
    ) where
        C: FnOnce(SqlResult<()>) + Send + 'static,
    {
        let path = path.into();
        self.run_with_completion(move |conn| conn.store_backup(path, vacuum), completion);
    }

    /// # Errors
    /// See [`Connection::store_backup`].
    pub fn store_backup_synchronously(
        &self,
        path: impl Into<PathBuf>,
        vacuum: bool,
    ) -> SqlResult<()> {
        let path = path.into();
        self.run_synchronously(move |conn| conn.store_backup(path, vacuum))
    }

    /// # Errors
    /// See [`Connection::store_backup`].
    pub fn store_backup_async<P>(
        &self,
        path: P,
        vacuum: bool,
    ) -> impl Future<Output = SqlResult<()>> + use<P>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();
        self.worker
            .request(move |conn| conn.store_backup(path, vacuum))
            .wait()
    }

    /// Queues a restore from `path` without waiting for it.
    pub fn restore_backup(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.run(move |conn| conn.restore_backup(path));
    }

    pub fn restore_backup_with_completion<C>(&self, path: impl Into<PathBuf>, completion: C)
    where
        C: FnOnce(SqlResult<()>) + Send + 'static,
    {
        let path = path.into();
        self.run_with_completion(move |conn| conn.restore_backup(path), completion);
    }

    /// # Errors
    /// See [`Connection::restore_backup`].
    pub fn restore_backup_synchronously(&self, path: impl Into<PathBuf>) -> SqlResult<()> {
        let path = path.into();
        self.run_synchronously(move |conn| conn.restore_backup(path))
    }

    /// # Errors
    /// See [`Connection::restore_backup`].
    pub fn restore_backup_async<P>(&self, path: P) -> impl Future<Output = SqlResult<()>> + use<P>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();
        self.worker
            .request(move |conn| conn.restore_backup(path))
            .wait()
    }

    /// Installs `hook` for every row inserted, updated or deleted through this
    /// queue, replacing any earlier one.
    ///
    /// The swap itself runs on the worker, after all work submitted before it.
    /// The hook runs on the worker thread and must not call back into this
    /// queue synchronously.
    ///
    /// # Panics
    /// Same as [`SqlQueue::run_synchronously`].
    pub fn set_did_update<H>(&self, hook: H)
    where
        H: Fn(ChangeEvent) + Send + 'static,
    {
        let hook: ChangeHook = Box::new(hook);
        self.swap_change_hook(Some(hook));
    }

    /// Removes the change hook, if any.
    ///
    /// # Panics
    /// Same as [`SqlQueue::run_synchronously`].
    pub fn clear_did_update(&self) {
        self.swap_change_hook(None);
    }

    fn swap_change_hook(&self, hook: Option<ChangeHook>) {
        let swapped = self.worker.request_blocking(move |conn| {
            conn.set_change_hook(hook);
            Ok(())
        });
        if let Err(err) = swapped {
            tracing::error!(error = %err, "failed to swap change hook");
        }
    }
}

impl fmt::Debug for SqlQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlQueue")
            .field("clones", &Arc::strong_count(&self.worker))
            .finish_non_exhaustive()
    }
}
