use super::{ColumnType, ConflictResolution};

/// One column definition inside a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    sql_type: &'static str,
    not_null: bool,
    not_null_on_conflict: Option<ConflictResolution>,
    default_literal: Option<String>,
    collation: Option<String>,
    generated_as: Option<String>,
    generated_stored: bool,
}

impl Column {
    /// A nullable column whose declared type comes from `T`.
    #[must_use]
    pub fn new<T: ColumnType>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: T::SQL_TYPE,
            not_null: false,
            not_null_on_conflict: None,
            default_literal: None,
            collation: None,
            generated_as: None,
            generated_stored: false,
        }
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// `NOT NULL ON CONFLICT <resolution>`
    #[must_use]
    pub fn not_null_on_conflict(mut self, resolution: ConflictResolution) -> Self {
        self.not_null = true;
        self.not_null_on_conflict = Some(resolution);
        self
    }

    #[must_use]
    pub fn default_to<T: ColumnType>(mut self, value: T) -> Self {
        self.default_literal = Some(value.to_literal());
        self
    }

    #[must_use]
    pub fn collate(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    /// `GENERATED ALWAYS AS (<expression>)`; virtual unless [`stored`](Self::stored) is set.
    #[must_use]
    pub fn generated_as(mut self, expression: impl Into<String>) -> Self {
        self.generated_as = Some(expression.into());
        self
    }

    #[must_use]
    pub fn stored(mut self) -> Self {
        self.generated_stored = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(super) fn definition(&self) -> String {
        let mut parts = vec![self.name.clone(), self.sql_type.to_owned()];
        if self.not_null {
            parts.push("NOT NULL".to_owned());
            if let Some(resolution) = self.not_null_on_conflict {
                parts.push(format!("ON CONFLICT {}", resolution.as_sql()));
            }
        }
        if let Some(literal) = &self.default_literal {
            parts.push(format!("DEFAULT {literal}"));
        }
        if let Some(collation) = &self.collation {
            parts.push(format!("COLLATE {collation}"));
        }
        if let Some(expression) = &self.generated_as {
            parts.push(format!("GENERATED ALWAYS AS ({expression})"));
            if self.generated_stored {
                parts.push("STORED".to_owned());
            }
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyConstraint {
    columns: Vec<String>,
    on_conflict: Option<ConflictResolution>,
}

impl KeyConstraint {
    fn render(&self, keyword: &str) -> String {
        let mut sql = format!("{keyword} ({})", self.columns.join(", "));
        if let Some(resolution) = self.on_conflict {
            sql.push_str(" ON CONFLICT ");
            sql.push_str(resolution.as_sql());
        }
        sql
    }
}

/// A table description: either explicit columns plus constraints, or `AS <select>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    select_statement: Option<String>,
    schema_name: Option<String>,
    primary_key: Option<KeyConstraint>,
    unique: Option<KeyConstraint>,
    check: Option<String>,
}

impl Table {
    #[must_use]
    pub fn new(name: impl Into<String>, columns: impl IntoIterator<Item = Column>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().collect(),
            select_statement: None,
            schema_name: None,
            primary_key: None,
            unique: None,
            check: None,
        }
    }

    /// A table populated from `select`; constraints are not rendered for it.
    #[must_use]
    pub fn as_select(name: impl Into<String>, select: impl Into<String>) -> Self {
        Self {
            select_statement: Some(select.into()),
            ..Self::new(name, [])
        }
    }

    #[must_use]
    pub fn schema(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    /// Table-level `PRIMARY KEY`; replaces any earlier one.
    #[must_use]
    pub fn primary_key<I, S>(mut self, columns: I, on_conflict: Option<ConflictResolution>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = Some(KeyConstraint {
            columns: columns.into_iter().map(Into::into).collect(),
            on_conflict,
        });
        self
    }

    /// Table-level `UNIQUE`; replaces any earlier one.
    #[must_use]
    pub fn unique<I, S>(mut self, columns: I, on_conflict: Option<ConflictResolution>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique = Some(KeyConstraint {
            columns: columns.into_iter().map(Into::into).collect(),
            on_conflict,
        });
        self
    }

    #[must_use]
    pub fn check(mut self, expression: impl Into<String>) -> Self {
        self.check = Some(expression.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn schema_name(&self) -> Option<&str> {
        self.schema_name.as_deref()
    }

    #[must_use]
    pub fn select_statement(&self) -> Option<&str> {
        self.select_statement.as_deref()
    }

    /// Column definitions followed by table constraints.
    pub(super) fn definitions(&self) -> Vec<String> {
        let mut definitions: Vec<String> = self.columns.iter().map(Column::definition).collect();
        if let Some(primary_key) = &self.primary_key {
            definitions.push(primary_key.render("PRIMARY KEY"));
        }
        if let Some(unique) = &self.unique {
            definitions.push(unique.render("UNIQUE"));
        }
        if let Some(check) = &self.check {
            definitions.push(format!("CHECK ({check})"));
        }
        definitions
    }
}
