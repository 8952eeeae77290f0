//! Column-oriented tables.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{CellValue, ModelError, Result, Row};

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// A column of `len` empty cells.
    pub fn empty(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, vec![CellValue::Empty; len])
    }

    /// Cell-for-cell comparison, see [`CellValue::loosely_equals`].
    pub fn same_values(&self, other: &Column) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.loosely_equals(b))
    }
}

/// An ordered sequence of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Builds a table, rejecting duplicate names and ragged columns.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        let expected = columns.first().map_or(0, |c| c.values.len());
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ModelError::DuplicateColumn(column.name.clone()));
            }
            if column.values.len() != expected {
                return Err(ModelError::RaggedColumns {
                    column: column.name.clone(),
                    expected,
                    found: column.values.len(),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Convenience constructor from `(name, values)` pairs.
    pub fn from_columns<N, V>(columns: Vec<(N, Vec<V>)>) -> Result<Self>
    where
        N: Into<String>,
        V: Into<CellValue>,
    {
        Self::new(
            columns
                .into_iter()
                .map(|(name, values)| {
                    Column::new(name, values.into_iter().map(Into::into).collect())
                })
                .collect(),
        )
    }

    /// A table with the given columns and no rows.
    pub fn with_column_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            columns: names
                .iter()
                .map(|name| Column::empty(name.as_ref(), 0))
                .collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Adds `column`, or replaces the values of an existing column with the
    /// same name in place.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        let expected = self.row_count();
        if !self.columns.is_empty() && column.values.len() != expected {
            return Err(ModelError::RaggedColumns {
                column: column.name,
                expected,
                found: column.values.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => existing.values = column.values,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub fn row(&self, index: usize) -> Result<Row> {
        let rows = self.row_count();
        if index >= rows {
            return Err(ModelError::RowOutOfRange { index, rows });
        }
        Ok(self
            .columns
            .iter()
            .map(|c| (c.name.clone(), c.values[index].clone()))
            .collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        (0..self.row_count()).map(move |index| {
            self.columns
                .iter()
                .map(|c| (c.name.clone(), c.values[index].clone()))
                .collect()
        })
    }

    /// Rows `start..end`, clamped to the table bounds.
    pub fn slice(&self, start: usize, end: usize) -> Table {
        let end = end.min(self.row_count());
        let start = start.min(end);
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.values[start..end].to_vec()))
                .collect(),
        }
    }

    /// Projects onto `names`, in that order. Unknown names become empty columns.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Table {
        let rows = self.row_count();
        Table {
            columns: names
                .iter()
                .map(|name| {
                    let name = name.as_ref();
                    self.column(name)
                        .cloned()
                        .unwrap_or_else(|| Column::empty(name, rows))
                })
                .collect(),
        }
    }

    /// Appends the rows of `other`, aligning columns by name.
    ///
    /// Columns missing on either side are padded with empty cells, so the
    /// result is never ragged.
    pub fn append(&mut self, other: &Table) {
        let existing_rows = self.row_count();
        let added_rows = other.row_count();
        for column in &mut self.columns {
            match other.column(&column.name) {
                Some(source) => column.values.extend(source.values.iter().cloned()),
                None => column
                    .values
                    .extend(std::iter::repeat_n(CellValue::Empty, added_rows)),
            }
        }
        for source in &other.columns {
            if self.has_column(&source.name) {
                continue;
            }
            let mut values = vec![CellValue::Empty; existing_rows];
            values.extend(source.values.iter().cloned());
            self.columns.push(Column::new(source.name.clone(), values));
        }
    }

    /// Appends a single row. Unknown columns are added, padded with empty cells.
    pub fn push_row(&mut self, row: &Row) {
        let existing_rows = self.row_count();
        for column in &mut self.columns {
            let value = row.get(&column.name).cloned().unwrap_or_default();
            column.values.push(value);
        }
        for (name, value) in row.iter() {
            if self.has_column(name) {
                continue;
            }
            let mut values = vec![CellValue::Empty; existing_rows];
            values.push(value.clone());
            self.columns.push(Column::new(name, values));
        }
    }

    /// Normalizes every missing cell (NaN, whitespace-only text) to `Empty`.
    pub fn fill_missing(&mut self) {
        for column in &mut self.columns {
            for value in &mut column.values {
                if value.is_empty() {
                    *value = CellValue::Empty;
                }
            }
        }
    }

    /// Column-oriented JSON: `{"col": [v0, v1, ...], ...}`.
    pub fn to_column_json(&self) -> Value {
        let map: Map<String, Value> = self
            .columns
            .iter()
            .map(|c| {
                (
                    c.name.clone(),
                    Value::Array(c.values.iter().map(CellValue::to_json).collect()),
                )
            })
            .collect();
        Value::Object(map)
    }
}

impl Serialize for Table {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_column_json().serialize(serializer)
    }
}
