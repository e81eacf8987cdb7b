use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle, ThreadId};

use tokio::sync::oneshot;

use crate::error::{SqlError, SqlResult};
use crate::sqlite::config::QueueOptions;
use crate::sqlite::connection::Connection;
use crate::sqlite::ffi;

use super::channel::{Command, Job};
use super::dispatcher::run_queue_worker;

/// Owns the worker thread and the sending half of its command channel.
pub(super) struct QueueWorker {
    sender: Sender<Command>,
    thread: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

impl QueueWorker {
    /// Starts the worker and waits until it has opened the database.
    pub(super) fn spawn(options: QueueOptions) -> SqlResult<Self> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let (opened_tx, opened_rx) = mpsc::channel::<SqlResult<()>>();
        let thread = thread::Builder::new()
            .name(options.worker_name.clone())
            .spawn(move || run_queue_worker(&options, &opened_tx, &receiver))
            .map_err(|err| {
                SqlError::open(
                    ffi::SQLITE_CANTOPEN,
                    format!("failed to spawn queue worker thread: {err}"),
                )
            })?;
        let thread_id = thread.thread().id();

        let opened = opened_rx.recv().unwrap_or_else(|_| {
            Err(SqlError::open(
                ffi::SQLITE_CANTOPEN,
                "queue worker exited before opening the database",
            ))
        });
        if let Err(err) = opened {
            let _ = thread.join();
            return Err(err);
        }

        Ok(Self {
            sender,
            thread: Some(thread),
            thread_id,
        })
    }

    pub(super) fn is_worker_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Enqueues `job` behind everything submitted before it.
    pub(super) fn submit(&self, job: Job) {
        if self.sender.send(Command::Run(job)).is_err() {
            tracing::error!("queue worker has stopped; unit of work dropped");
        }
    }

    /// Runs `work` on the worker and blocks the calling thread for its result.
    ///
    /// # Panics
    /// When called from the worker thread itself, which could never make progress.
    pub(super) fn request_blocking<T, F>(&self, work: F) -> SqlResult<T>
    where
        F: FnOnce(&Connection) -> SqlResult<T> + Send + 'static,
        T: Send + 'static,
    {
        assert!(
            !self.is_worker_thread(),
            "synchronous queue call made from inside a unit of work on the same queue"
        );
        let (tx, rx) = mpsc::sync_channel(1);
        self.submit(Box::new(move |conn: &Connection| {
            let _ = tx.send(work(conn));
        }));
        rx.recv().map_err(|_| reply_dropped())?
    }

    /// Submits `work` right away; the returned [`Reply`] waits for its result.
    pub(super) fn request<T, F>(&self, work: F) -> Reply<T>
    where
        F: FnOnce(&Connection) -> SqlResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(Box::new(move |conn: &Connection| {
            let _ = tx.send(work(conn));
        }));
        Reply { rx }
    }
}

/// Pending result of a unit of work that is already queued.
pub(super) struct Reply<T> {
    rx: oneshot::Receiver<SqlResult<T>>,
}

impl<T> Reply<T> {
    pub(super) async fn wait(self) -> SqlResult<T> {
        self.rx.await.map_err(|_| reply_dropped())?
    }
}

impl Drop for QueueWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
        let Some(thread) = self.thread.take() else {
            return;
        };
        // The last handle can be released by a job or hook on the worker itself.
        if self.is_worker_thread() {
            return;
        }
        if thread.join().is_err() {
            tracing::error!("queue worker thread panicked");
        }
    }
}

fn reply_dropped() -> SqlError {
    SqlError::execute(
        ffi::SQLITE_MISUSE,
        "queue worker dropped the unit of work before replying",
    )
}
