//! In-memory tabular data, the boundary type for task results.
//!
//! Task executors can return a [`DataTable`] when their result is tabular;
//! the data loader flattens it into row-oriented records, which is the one
//! data shape every rendering adapter accepts. The chart adapters use the
//! column accessors to pick out numeric series.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TaskResult;

/// A column-named, row-major table of JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl DataTable {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of a named column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<Value>> {
        let index = self.index_of(name)?;
        Some(self.rows.iter().map(|row| row[index].clone()).collect())
    }

    /// Whether the column holds at least one number and nothing but numbers
    /// and missing values.
    pub fn is_numeric(&self, name: &str) -> bool {
        let Some(index) = self.index_of(name) else {
            return false;
        };

        let mut seen = false;
        for row in &self.rows {
            match &row[index] {
                Value::Number(_) => seen = true,
                Value::Null => {}
                _ => return false,
            }
        }

        seen
    }

    /// Replace missing values in a column with a numeric placeholder.
    pub fn fill_missing(&mut self, name: &str, placeholder: f64) {
        if let Some(index) = self.index_of(name) {
            for row in &mut self.rows {
                if row[index].is_null() {
                    row[index] = Value::from(placeholder);
                }
            }
        }
    }

    /// Row-major records: one mapping of column name to value per row.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    /// Rebuild a table from row records. Columns appear in first-seen order;
    /// fields missing from a record become missing values.
    pub fn from_records(records: &[Map<String, Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.iter().any(|column| column == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Interpret a normalized data value (an array of record objects) as a
    /// table.
    pub fn from_value(value: &Value) -> TaskResult<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| anyhow!("expected an array of records"))?;

        let records = items
            .iter()
            .map(|item| {
                item.as_object()
                    .cloned()
                    .ok_or_else(|| anyhow!("expected a record object, got {item}"))
            })
            .collect::<TaskResult<Vec<_>>>()?;

        Ok(Self::from_records(&records))
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}
