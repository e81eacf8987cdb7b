//! Convenient imports for common functionality.
//!
//! ```rust
//! use sqlkit::prelude::*;
//! ```

pub use crate::error::{SqlError, SqlResult};
pub use crate::params;
pub use crate::query_builder::{
    Column, CreateTableOptions, CreateViewOptions, DropOptions, Query, Table, View,
};
pub use crate::results::Row;
pub use crate::sqlite::{ChangeEvent, ChangeKind, Connection, SqlQueue, Statement, StepResult};
pub use crate::tx_outcome::TxOutcome;
pub use crate::types::{FromValue, Value};
