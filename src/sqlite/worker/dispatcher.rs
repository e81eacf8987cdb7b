use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{Receiver, Sender};

use crate::error::SqlResult;
use crate::sqlite::config::QueueOptions;
use crate::sqlite::connection::Connection;

use super::channel::{Command, Job};

/// Worker thread body: open, report, then drain commands until shutdown.
pub(super) fn run_queue_worker(
    options: &QueueOptions,
    opened: &Sender<SqlResult<()>>,
    receiver: &Receiver<Command>,
) {
    let conn = match open_connection(options) {
        Ok(conn) => conn,
        Err(err) => {
            let _ = opened.send(Err(err));
            return;
        }
    };
    if opened.send(Ok(())).is_err() {
        return;
    }
    tracing::debug!(worker = %options.worker_name, path = %options.db_path, "queue worker started");

    while let Ok(command) = receiver.recv() {
        match command {
            Command::Run(job) => run_job(&conn, job),
            Command::Shutdown => break,
        }
    }

    drop(conn);
    tracing::debug!(worker = %options.worker_name, "queue worker stopped");
}

fn open_connection(options: &QueueOptions) -> SqlResult<Connection> {
    let conn = Connection::open(&options.db_path)?;
    if let Some(timeout) = options.busy_timeout {
        conn.set_busy_timeout(timeout)?;
    }
    Ok(conn)
}

fn run_job(conn: &Connection, job: Job) {
    // A panic may have left the handle mid-statement or mid-transaction.
    if panic::catch_unwind(AssertUnwindSafe(|| job(conn))).is_err() {
        tracing::error!("unit of work panicked on the queue worker; aborting");
        std::process::abort();
    }
}
