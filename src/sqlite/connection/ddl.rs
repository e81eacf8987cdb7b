use crate::error::SqlResult;
use crate::query_builder::{CreateTableOptions, CreateViewOptions, DropOptions, Query, Table, View};

use super::Connection;

impl Connection {
    /// Executes a built [`Query`] without parameters.
    ///
    /// # Errors
    /// Same as [`Connection::execute`].
    pub fn execute_query(&self, query: &Query) -> SqlResult<()> {
        self.execute(query.as_str(), &[])
    }

    /// # Errors
    /// Same as [`Connection::execute`].
    pub fn create_table(&self, table: &Table, options: CreateTableOptions) -> SqlResult<()> {
        self.execute_query(&Query::create_table(table, options))
    }

    /// # Errors
    /// Same as [`Connection::execute`].
    pub fn drop_table(&self, table: &Table, options: DropOptions) -> SqlResult<()> {
        self.execute_query(&Query::drop_table(table, options))
    }

    /// # Errors
    /// Same as [`Connection::execute`].
    pub fn create_view(&self, view: &View, options: CreateViewOptions) -> SqlResult<()> {
        self.execute_query(&Query::create_view(view, options))
    }

    /// # Errors
    /// Same as [`Connection::execute`].
    pub fn drop_view(&self, view: &View, options: DropOptions) -> SqlResult<()> {
        self.execute_query(&Query::drop_view(view, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::{Column, ConflictResolution};

    #[test]
    fn built_ddl_is_accepted_by_the_engine() {
        let conn = Connection::open(":memory:").expect("open");
        let table = Table::new(
            "item",
            [
                Column::new::<i64>("id").not_null(),
                Column::new::<String>("label").default_to("none"),
                Column::new::<f64>("price").default_to(1.5),
                Column::new::<f64>("doubled").generated_as("price * 2"),
            ],
        )
        .primary_key(["id"], Some(ConflictResolution::Replace))
        .check("price >= 0");
        conn.create_table(&table, CreateTableOptions::default())
            .expect("create table");
        conn.create_table(
            &table,
            CreateTableOptions {
                if_not_exists: true,
                ..CreateTableOptions::default()
            },
        )
        .expect("if not exists is a no-op");

        conn.execute("INSERT INTO item (id) VALUES (1)", &[]).expect("insert");
        let view = View::new("labels", "SELECT label, doubled FROM item").with_columns(["l", "d"]);
        conn.create_view(&view, CreateViewOptions::default())
            .expect("create view");

        let rows = conn
            .prepare("SELECT l, d FROM labels")
            .expect("prepare")
            .step_all()
            .expect("select");
        assert_eq!(rows[0].value_by_name::<String>("l").as_deref(), Some("none"));
        assert_eq!(rows[0].value_by_name::<f64>("d"), Some(3.0));

        conn.drop_view(&view, DropOptions::default()).expect("drop view");
        conn.drop_table(&table, DropOptions::default()).expect("drop table");
        conn.drop_table(
            &table,
            DropOptions {
                if_exists: true,
                ..DropOptions::default()
            },
        )
        .expect("if exists is a no-op");
    }
}
