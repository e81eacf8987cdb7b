use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

use crate::types::{FromValue, Value};

/// One fetched result record.
///
/// Built once per step from the statement's current column buffers and never
/// mutated afterwards. Positional access sees every column; lookup by name
/// resolves a duplicated column name to its last occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    column_names: Vec<String>,
    values: Vec<Value>,
    // Name -> position; later registrations overwrite earlier ones
    column_index: HashMap<String, usize>,
}

impl Row {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            column_names: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            column_index: HashMap::with_capacity(capacity),
        }
    }

    pub(crate) fn push_column(&mut self, name: String, value: Value) {
        self.column_index.insert(name.clone(), self.values.len());
        self.column_names.push(name);
        self.values.push(value);
    }

    /// Number of columns in this row, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column names in result order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get_by_name(&self, column_name: &str) -> Option<&Value> {
        self.column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Typed value at `index`; `None` when out of range, NULL, or of another type.
    #[must_use]
    pub fn value<T: FromValue>(&self, index: usize) -> Option<T> {
        self.get(index).and_then(T::from_value)
    }

    /// Typed value for `column_name`; `None` when missing, NULL, or of another type.
    #[must_use]
    pub fn value_by_name<T: FromValue>(&self, column_name: &str) -> Option<T> {
        self.get_by_name(column_name).and_then(T::from_value)
    }

    /// Iterate `(column name, value)` pairs in result order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Consume the row, returning its values in result order.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl Index<usize> for Row {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl Index<&str> for Row {
    type Output = Value;

    fn index(&self, column_name: &str) -> &Self::Output {
        match self.get_by_name(column_name) {
            Some(value) => value,
            None => panic!("no column named `{column_name}` in row"),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for (name, value) in self.iter() {
            write!(f, "{name}={value} ")?;
        }
        write!(f, "}}")
    }
}
