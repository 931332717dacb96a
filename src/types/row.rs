use std::collections::HashMap;

use crate::error::{PgPatternsError, Result};
use crate::types::SqlValue;

/// Driver-agnostic raw result from a database query.
#[derive(Debug, Clone, Default)]
pub struct RawQueryResult {
    /// Column names in projection order
    pub columns: Vec<String>,
    /// Rows, where each row is a vector of values in column order
    pub rows: Vec<Vec<SqlValue>>,
}

impl RawQueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Converts the first row into a Record, if there is one.
    pub fn into_first_record(self) -> Option<Record> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .next()
            .map(|values| Record::new(&columns, values))
    }

    /// Converts every row into a Record, preserving row order.
    pub fn into_records(self) -> Vec<Record> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|values| Record::new(&columns, values))
            .collect()
    }
}

/// A single row of a result set.
/// Maps column names to values, keeping the order the query projected them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, SqlValue)>,
}

impl Record {
    /// Creates a new Record from column names and values.
    pub(crate) fn new(columns: &[String], values: Vec<SqlValue>) -> Self {
        let fields = columns.iter().cloned().zip(values).collect();
        Self { fields }
    }

    /// Gets a value by column name.
    /// With duplicate column names the last one wins, like a dictionary built from the row.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.fields
            .iter()
            .rev()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Gets a value by column name, failing if the column is not part of the record.
    pub fn try_get(&self, column: &str) -> Result<&SqlValue> {
        self.get(column)
            .ok_or_else(|| PgPatternsError::ColumnNotFound(column.to_string()))
    }

    /// Returns all column names in this record, in projection order.
    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of columns in this record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if this record has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts the record into an unordered map.
    pub fn into_map(self) -> HashMap<String, SqlValue> {
        self.fields.into_iter().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<SqlValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let fields = iter
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        Self { fields }
    }
}

impl IntoIterator for Record {
    type Item = (String, SqlValue);
    type IntoIter = std::vec::IntoIter<(String, SqlValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
