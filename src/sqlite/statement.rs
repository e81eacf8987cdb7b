//! Safe wrapper around one prepared statement.
//!
//! This file contains no `unsafe` code; the native handle lives in
//! [`RawStmt`], which finalizes it exactly once.

use std::ffi::c_int;

use crate::error::{SqlError, SqlResult};
use crate::results::Row;
use crate::types::Value;

use super::ffi::{self, RawStmt};

/// Result of advancing a statement by one step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    /// The statement has run to completion; no more rows.
    Done,
    /// A result row is available, already decoded.
    Row(Row),
}

/// A prepared statement.
///
/// Created via [`Connection::prepare`](super::Connection::prepare) and tied to
/// the lifetime of that connection, so it can never outlive the handle it
/// was compiled against. Finalized when dropped; a finalize failure on drop is
/// logged, never raised.
pub struct Statement<'conn> {
    raw: RawStmt<'conn>,
}

impl<'conn> Statement<'conn> {
    pub(crate) fn new(raw: RawStmt<'conn>) -> Self {
        Self { raw }
    }

    /// Number of `?` parameters the statement declares.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        usize::try_from(self.raw.parameter_count()).unwrap_or(0)
    }

    /// Number of columns each result row carries.
    #[must_use]
    pub fn column_count(&self) -> usize {
        usize::try_from(self.raw.column_count()).unwrap_or(0)
    }

    /// Binds `values` to parameters `1..=values.len()` in order.
    ///
    /// Assignments made before a failing one are kept; reset before retrying.
    ///
    /// # Errors
    /// Returns [`SqlError::Bind`] for the first assignment the engine rejects,
    /// including binding more values than the statement declares.
    pub fn bind(&mut self, values: &[Value]) -> SqlResult<()> {
        for (i, value) in values.iter().enumerate() {
            let Ok(idx) = c_int::try_from(i + 1) else {
                return Err(SqlError::bind(
                    ffi::SQLITE_TOOBIG,
                    "too many values to bind",
                ));
            };
            let rc = match value {
                Value::Text(text) => self.raw.bind_text(idx, text),
                Value::Integer(v) => self.raw.bind_i64(idx, *v),
                Value::Real(v) => self.raw.bind_f64(idx, *v),
                Value::Blob(bytes) => self.raw.bind_blob(idx, bytes),
                Value::Null => self.raw.bind_null(idx),
            };
            if rc != ffi::SQLITE_OK {
                return Err(SqlError::bind(rc, self.raw.db().errmsg()));
            }
        }
        Ok(())
    }

    /// Advances the statement by one row.
    ///
    /// # Errors
    /// Returns [`SqlError::Step`] for any status other than row-available or done.
    pub fn step(&mut self) -> SqlResult<StepResult> {
        match self.raw.step() {
            ffi::SQLITE_DONE => Ok(StepResult::Done),
            ffi::SQLITE_ROW => Ok(StepResult::Row(self.current_row())),
            rc => Err(SqlError::step(rc, self.raw.db().errmsg())),
        }
    }

    /// Steps until done, collecting every row in arrival order.
    ///
    /// # Errors
    /// Returns [`SqlError::Step`] as soon as a step fails; rows gathered so far are discarded.
    pub fn step_all(&mut self) -> SqlResult<Vec<Row>> {
        let mut rows = Vec::new();
        while let StepResult::Row(row) = self.step()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Rewinds the statement so it can be stepped again. Bindings are kept.
    ///
    /// # Errors
    /// Returns [`SqlError::Reset`] if the engine reports a failure, which
    /// includes the status of a preceding failed step.
    pub fn reset(&mut self) -> SqlResult<()> {
        match self.raw.reset() {
            ffi::SQLITE_OK => Ok(()),
            rc => Err(SqlError::reset(rc, self.raw.db().errmsg())),
        }
    }

    /// Reset, bind `values`, then step once.
    ///
    /// # Errors
    /// Propagates the first failing stage.
    pub fn reset_bind_step(&mut self, values: &[Value]) -> SqlResult<StepResult> {
        self.reset()?;
        self.bind(values)?;
        self.step()
    }

    /// Reset, bind `values`, then step to completion.
    ///
    /// # Errors
    /// Propagates the first failing stage.
    pub fn reset_bind_step_all(&mut self, values: &[Value]) -> SqlResult<Vec<Row>> {
        self.reset()?;
        self.bind(values)?;
        self.step_all()
    }

    /// Finalizes the statement now and reports the engine's status.
    ///
    /// # Errors
    /// Returns [`SqlError::Execute`] carrying the finalize status; the handle
    /// is released either way.
    pub fn finalize(self) -> SqlResult<()> {
        let db = self.raw.db();
        match self.raw.finalize() {
            ffi::SQLITE_OK => Ok(()),
            rc => Err(SqlError::execute(rc, db.errmsg())),
        }
    }

    fn current_row(&self) -> Row {
        let column_count = self.raw.column_count();
        let mut row = Row::with_capacity(usize::try_from(column_count).unwrap_or(0));

        for idx in 0..column_count {
            let value = match self.raw.column_type(idx) {
                ffi::SQLITE_INTEGER => Value::Integer(self.raw.column_i64(idx)),
                ffi::SQLITE_FLOAT => Value::Real(self.raw.column_f64(idx)),
                ffi::SQLITE_TEXT => self.raw.column_text(idx).map_or(Value::Null, Value::Text),
                ffi::SQLITE_BLOB => self.raw.column_blob(idx).map_or(Value::Null, Value::Blob),
                _ => Value::Null,
            };
            let name = self
                .raw
                .column_name(idx)
                .unwrap_or_else(|| format!("Column {idx}"));
            row.push_column(name, value);
        }

        row
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("parameter_count", &self.parameter_count())
            .field("column_count", &self.column_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;
    use crate::sqlite::Connection;

    fn seeded() -> Connection {
        let conn = Connection::open(":memory:").expect("open in-memory db");
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER, name TEXT);
             INSERT INTO t VALUES (1, 'a'), (2, 'b'), (3, 'c');",
        )
        .expect("seed");
        conn
    }

    #[test]
    fn step_decodes_each_storage_class() {
        let conn = Connection::open(":memory:").expect("open");
        let mut stmt = conn
            .prepare("SELECT 1 AS i, 2.5 AS r, 'x' AS t, X'0102' AS b, NULL AS n, X'' AS e")
            .expect("prepare");
        let StepResult::Row(row) = stmt.step().expect("step") else {
            panic!("expected a row");
        };
        assert_eq!(row["i"], Value::Integer(1));
        assert_eq!(row["r"], Value::Real(2.5));
        assert_eq!(row["t"], Value::Text("x".into()));
        assert_eq!(row["b"], Value::Blob(vec![1, 2]));
        assert_eq!(row["n"], Value::Null);
        // Zero-length blobs come back without data.
        assert_eq!(row["e"], Value::Null);
        assert_eq!(stmt.step().expect("step"), StepResult::Done);
    }

    #[test]
    fn reset_bind_step_matches_a_fresh_statement() {
        let conn = seeded();
        let sql = "SELECT name FROM t WHERE id = ?";
        let mut reused = conn.prepare(sql).expect("prepare");
        reused.bind(&params![1]).expect("bind");
        reused.step_all().expect("drain");

        for id in 1..=3_i64 {
            let again = reused.reset_bind_step_all(&params![id]).expect("reuse");
            let mut fresh = conn.prepare(sql).expect("prepare");
            fresh.bind(&params![id]).expect("bind");
            assert_eq!(again, fresh.step_all().expect("fresh"));
        }
    }

    #[test]
    fn reset_keeps_bindings() {
        let conn = seeded();
        let mut stmt = conn.prepare("SELECT name FROM t WHERE id = ?").expect("prepare");
        stmt.bind(&params![2]).expect("bind");
        let first = stmt.step_all().expect("first");
        stmt.reset().expect("reset");
        assert_eq!(first, stmt.step_all().expect("second"));
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn binding_too_many_values_is_a_bind_error() {
        let conn = seeded();
        let mut stmt = conn.prepare("SELECT * FROM t WHERE id = ?").expect("prepare");
        assert_eq!(stmt.parameter_count(), 1);
        let err = stmt.bind(&params![1, 2]).expect_err("second value has no slot");
        assert!(matches!(err, SqlError::Bind { code, .. } if code == rusqlite::ffi::SQLITE_RANGE));
    }

    #[test]
    fn failed_bind_keeps_earlier_assignments() {
        let conn = seeded();
        let mut stmt = conn.prepare("SELECT name FROM t WHERE id = ?").expect("prepare");
        stmt.bind(&params![2, 3]).expect_err("only one slot");
        let rows = stmt.step_all().expect("step with the kept binding");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value::<String>(0), Some("b".to_owned()));
    }

    #[test]
    fn reset_after_a_failed_step_reports_the_step_status() {
        let conn = Connection::open(":memory:").expect("open");
        conn.execute_batch("CREATE TABLE u (id INTEGER PRIMARY KEY); INSERT INTO u VALUES (1);")
            .expect("seed");
        let mut stmt = conn.prepare("INSERT INTO u VALUES (?)").expect("prepare");

        stmt.bind(&params![1]).expect("bind");
        let step_err = stmt.step().expect_err("duplicate key");
        assert!(matches!(step_err, SqlError::Step { .. }), "{step_err}");

        // The reset stage fails with the same status; nothing is bound or stepped.
        let reset_err = stmt
            .reset_bind_step(&params![2])
            .expect_err("reset surfaces the failed step");
        assert!(matches!(reset_err, SqlError::Reset { .. }), "{reset_err}");
        assert_eq!(reset_err.code(), step_err.code());
        assert_eq!(reset_err.code(), rusqlite::ffi::SQLITE_CONSTRAINT);

        assert_eq!(stmt.reset_bind_step(&params![3]).expect("recovered"), StepResult::Done);
        drop(stmt);

        let mut ids = conn.prepare("SELECT id FROM u ORDER BY id").expect("prepare");
        let ids: Vec<_> = ids
            .step_all()
            .expect("ids")
            .iter()
            .map(|row| row.value::<i64>(0))
            .collect();
        assert_eq!(ids, vec![Some(1), Some(3)]);
    }

    #[test]
    fn constraint_violation_is_a_step_error() {
        let conn = Connection::open(":memory:").expect("open");
        conn.execute_batch("CREATE TABLE u (id INTEGER PRIMARY KEY)")
            .expect("create");
        conn.execute("INSERT INTO u VALUES (1)", &[]).expect("insert");
        let err = conn
            .execute("INSERT INTO u VALUES (1)", &[])
            .expect_err("duplicate key");
        assert!(matches!(err, SqlError::Step { .. }));
        assert!(err.message().contains("UNIQUE"), "{}", err.message());
    }

    #[test]
    fn explicit_finalize_reports_success() {
        let conn = seeded();
        let mut stmt = conn.prepare("SELECT COUNT(*) FROM t").expect("prepare");
        let rows = stmt.step_all().expect("count");
        assert_eq!(rows[0].value::<i64>(0), Some(3));
        stmt.finalize().expect("finalize");
    }
}
