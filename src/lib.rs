//! Serialized access to an embedded SQLite database.
//!
//! A [`SqlQueue`] owns one [`Connection`] on a dedicated worker thread and
//! runs submitted units of work against it one at a time, in submission
//! order. Units of work use [`Connection`] and [`Statement`] directly and
//! exchange data as [`Value`]s and [`Row`]s.
//!
//! ```rust,no_run
//! use sqlkit::prelude::*;
//!
//! # fn main() -> SqlResult<()> {
//! let queue = SqlQueue::open("app.db")?;
//! queue.run_synchronously(|conn| {
//!     conn.execute_batch("CREATE TABLE IF NOT EXISTS t (id INTEGER, name TEXT)")?;
//!     conn.execute("INSERT INTO t VALUES (?, ?)", &params![1, "a"])
//! })?;
//! let rows = queue.run_synchronously(|conn| conn.prepare("SELECT * FROM t")?.step_all())?;
//! assert_eq!(rows[0]["name"], Value::Text("a".into()));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod prelude;
pub mod query_builder;
pub mod results;
pub mod sqlite;
pub mod tx_outcome;
pub mod types;

pub use error::{SqlError, SqlErrorCode, SqlResult};
pub use results::Row;
pub use sqlite::{
    ChangeEvent, ChangeHook, ChangeKind, Connection, QueueOptions, QueueOptionsBuilder, SqlQueue,
    Statement, StepResult,
};
pub use tx_outcome::TxOutcome;
pub use types::{FromValue, Value};
