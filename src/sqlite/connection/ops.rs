use std::cell::RefCell;
use std::ffi::c_int;
use std::time::Duration;

use crate::error::{SqlError, SqlResult};
use crate::sqlite::ffi::{self, RawDb};
use crate::sqlite::statement::Statement;
use crate::types::Value;

use super::Connection;

pub(super) const OPEN_FLAGS: c_int =
    ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE | ffi::SQLITE_OPEN_URI;

impl Connection {
    /// Opens (or creates) the database at `path`.
    ///
    /// Most callers want [`SqlQueue::open`](crate::SqlQueue::open), which opens
    /// the connection on its own worker thread. A connection opened here stays
    /// on the calling thread.
    ///
    /// # Errors
    /// Returns [`SqlError::Open`]; any handle the engine allocated is closed first.
    pub fn open(path: &str) -> SqlResult<Self> {
        let db = RawDb::open(path, OPEN_FLAGS)?;
        tracing::debug!(path, "opened database");
        Ok(Self {
            db,
            update_hook: RefCell::new(None),
        })
    }

    /// Makes lock contention wait up to `timeout` before reporting busy.
    pub(crate) fn set_busy_timeout(&self, timeout: Duration) -> SqlResult<()> {
        let millis = c_int::try_from(timeout.as_millis()).unwrap_or(c_int::MAX);
        match self.db.busy_timeout(millis) {
            ffi::SQLITE_OK => Ok(()),
            rc => Err(SqlError::execute(rc, self.db.errmsg())),
        }
    }

    pub(crate) fn raw(&self) -> &RawDb {
        &self.db
    }

    /// Compiles one SQL statement.
    ///
    /// Only the first statement of `sql` is compiled; trailing text is ignored.
    ///
    /// # Errors
    /// Returns [`SqlError::Prepare`], also when the engine reports success
    /// without producing a statement (empty or comment-only SQL).
    pub fn prepare(&self, sql: &str) -> SqlResult<Statement<'_>> {
        let raw = self.db.prepare(sql)?;
        Ok(Statement::new(raw))
    }

    /// Prepare, bind `values` (when non-empty) and step once.
    ///
    /// Meant for statements that produce no rows; a produced row is discarded.
    /// The statement is finalized before returning.
    ///
    /// # Errors
    /// Propagates the classified error of the failing stage.
    pub fn execute(&self, sql: &str, values: &[Value]) -> SqlResult<()> {
        let mut stmt = self.prepare(sql)?;
        if !values.is_empty() {
            stmt.bind(values)?;
        }
        stmt.step()?;
        Ok(())
    }

    /// Runs several `;`-separated statements without parameters.
    ///
    /// # Errors
    /// Returns [`SqlError::Execute`] with the engine's message for the first failing statement.
    pub fn execute_batch(&self, sql: &str) -> SqlResult<()> {
        self.db.exec(sql)
    }

    /// Row id of the most recent successful insert on this connection.
    ///
    /// Not meaningful for `WITHOUT ROWID` tables, and not reverted when the
    /// inserting transaction rolls back.
    #[must_use]
    pub fn last_insert_rowid(&self) -> i64 {
        self.db.last_insert_rowid()
    }

    /// Rows changed by the most recent INSERT, UPDATE or DELETE.
    #[must_use]
    pub fn changes(&self) -> usize {
        usize::try_from(self.db.changes()).unwrap_or(0)
    }
}
