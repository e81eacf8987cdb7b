//! DDL string builder.
//!
//! Produces [`Query`] values for `CREATE`/`DROP` of tables and views. Nothing
//! here touches a database; hand the result to
//! [`Connection::execute_query`](crate::Connection::execute_query) or one of
//! its convenience wrappers.
//!
//! ```rust
//! use sqlkit::query_builder::{Column, CreateTableOptions, Query, Table};
//!
//! let table = Table::new(
//!     "person",
//!     [
//!         Column::new::<i64>("id").not_null(),
//!         Column::new::<String>("name").default_to("anon"),
//!     ],
//! )
//! .primary_key(["id"], None);
//!
//! let query = Query::create_table(&table, CreateTableOptions::default());
//! assert!(query.as_str().starts_with("CREATE TABLE person ("));
//! ```

mod table;
mod view;

use std::fmt;

pub use table::{Column, Table};
pub use view::View;

/// A finished SQL string, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    sql: String,
}

impl Query {
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.sql
    }
}

impl From<&str> for Query {
    fn from(sql: &str) -> Self {
        Self::new(sql)
    }
}

impl From<String> for Query {
    fn from(sql: String) -> Self {
        Self::new(sql)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Options for [`Query::create_table`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateTableOptions {
    pub if_not_exists: bool,
    pub temporary: bool,
    pub without_rowid: bool,
    pub exclude_semicolon: bool,
}

/// Options for [`Query::create_view`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateViewOptions {
    pub if_not_exists: bool,
    pub temporary: bool,
    pub exclude_semicolon: bool,
}

/// Options for [`Query::drop_table`] and [`Query::drop_view`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropOptions {
    pub if_exists: bool,
    pub exclude_semicolon: bool,
}

/// Conflict resolution algorithm for `ON CONFLICT` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictResolution {
    Rollback,
    Abort,
    Fail,
    Ignore,
    Replace,
}

impl ConflictResolution {
    fn as_sql(self) -> &'static str {
        match self {
            ConflictResolution::Rollback => "ROLLBACK",
            ConflictResolution::Abort => "ABORT",
            ConflictResolution::Fail => "FAIL",
            ConflictResolution::Ignore => "IGNORE",
            ConflictResolution::Replace => "REPLACE",
        }
    }
}

/// Rust types that map onto a column's declared type.
///
/// `SQL_TYPE` is the declared type used in column definitions; `to_literal`
/// renders a value as an SQL literal for `DEFAULT` clauses.
pub trait ColumnType {
    const SQL_TYPE: &'static str;

    fn to_literal(&self) -> String;
}

impl ColumnType for String {
    const SQL_TYPE: &'static str = "TEXT";

    fn to_literal(&self) -> String {
        self.as_str().to_literal()
    }
}

impl ColumnType for &str {
    const SQL_TYPE: &'static str = "TEXT";

    fn to_literal(&self) -> String {
        format!("'{}'", self.replace('\'', "''"))
    }
}

impl ColumnType for i64 {
    const SQL_TYPE: &'static str = "INTEGER";

    fn to_literal(&self) -> String {
        self.to_string()
    }
}

impl ColumnType for i32 {
    const SQL_TYPE: &'static str = "INTEGER";

    fn to_literal(&self) -> String {
        self.to_string()
    }
}

impl ColumnType for bool {
    const SQL_TYPE: &'static str = "INTEGER";

    fn to_literal(&self) -> String {
        i64::from(*self).to_string()
    }
}

impl ColumnType for f64 {
    const SQL_TYPE: &'static str = "REAL";

    fn to_literal(&self) -> String {
        if self.is_finite() {
            // `{:?}` keeps a fractional part (`1.0`), so the literal stays REAL.
            format!("{self:?}")
        } else {
            "NULL".to_owned()
        }
    }
}

impl ColumnType for Vec<u8> {
    const SQL_TYPE: &'static str = "BLOB";

    fn to_literal(&self) -> String {
        let hex: String = self.iter().map(|byte| format!("{byte:02x}")).collect();
        format!("X'{hex}'")
    }
}

/// Space-separated clause accumulator.
#[derive(Default)]
struct Clauses(Vec<String>);

impl Clauses {
    fn push(&mut self, clause: impl Into<String>) {
        self.0.push(clause.into());
    }

    fn push_if(&mut self, condition: bool, clause: &str) {
        if condition {
            self.push(clause);
        }
    }

    fn finish(self, exclude_semicolon: bool) -> Query {
        let mut sql = self.0.join(" ");
        if !exclude_semicolon {
            sql.push(';');
        }
        Query::new(sql)
    }
}

fn qualified_name(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(schema) => format!("{schema}.{name}"),
        None => name.to_owned(),
    }
}

impl Query {
    /// `CREATE [TEMPORARY] TABLE [IF NOT EXISTS] ...`
    #[must_use]
    pub fn create_table(table: &Table, options: CreateTableOptions) -> Self {
        let mut clauses = Clauses::default();
        clauses.push("CREATE");
        clauses.push_if(options.temporary, "TEMPORARY");
        clauses.push("TABLE");
        clauses.push_if(options.if_not_exists, "IF NOT EXISTS");
        clauses.push(qualified_name(table.schema_name(), table.name()));
        match table.select_statement() {
            Some(select) => clauses.push(format!("AS {select}")),
            None => {
                clauses.push(format!("(\n  {}\n)", table.definitions().join(",\n  ")));
                clauses.push_if(options.without_rowid, "WITHOUT ROWID");
            }
        }
        clauses.finish(options.exclude_semicolon)
    }

    /// `CREATE [TEMPORARY] VIEW [IF NOT EXISTS] ... AS ...`
    #[must_use]
    pub fn create_view(view: &View, options: CreateViewOptions) -> Self {
        let mut clauses = Clauses::default();
        clauses.push("CREATE");
        clauses.push_if(options.temporary, "TEMPORARY");
        clauses.push("VIEW");
        clauses.push_if(options.if_not_exists, "IF NOT EXISTS");
        clauses.push(qualified_name(view.schema_name(), view.name()));
        if !view.column_names().is_empty() {
            clauses.push(format!("({})", view.column_names().join(", ")));
        }
        clauses.push(format!("AS {}", view.select_statement()));
        clauses.finish(options.exclude_semicolon)
    }

    #[must_use]
    pub fn drop_table(table: &Table, options: DropOptions) -> Self {
        drop_object("TABLE", table.schema_name(), table.name(), options)
    }

    #[must_use]
    pub fn drop_view(view: &View, options: DropOptions) -> Self {
        drop_object("VIEW", view.schema_name(), view.name(), options)
    }
}

fn drop_object(kind: &str, schema: Option<&str>, name: &str, options: DropOptions) -> Query {
    let mut clauses = Clauses::default();
    clauses.push(format!("DROP {kind}"));
    clauses.push_if(options.if_exists, "IF EXISTS");
    clauses.push(qualified_name(schema, name));
    clauses.finish(options.exclude_semicolon)
}
