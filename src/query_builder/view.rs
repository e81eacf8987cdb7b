/// A view over a select statement, optionally renaming its result columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    name: String,
    column_names: Vec<String>,
    select_statement: String,
    schema_name: Option<String>,
}

impl View {
    #[must_use]
    pub fn new(name: impl Into<String>, select: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_names: Vec::new(),
            select_statement: select.into(),
            schema_name: None,
        }
    }

    #[must_use]
    pub fn with_columns<I, S>(mut self, column_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_names = column_names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn schema(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn select_statement(&self) -> &str {
        &self.select_statement
    }

    #[must_use]
    pub fn schema_name(&self) -> Option<&str> {
        self.schema_name.as_deref()
    }
}
