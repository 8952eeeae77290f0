//! Ordered column-to-value rows.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::CellValue;

/// A single row keyed by column name.
///
/// Insertion order is kept for display and serialization; equality
/// ignores it.
#[derive(Debug, Clone, Default)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Sets `column`, keeping its position if it already exists.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Option<CellValue> {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.cells.push((column, value));
                None
            }
        }
    }

    pub fn remove(&mut self, column: &str) -> Option<CellValue> {
        let index = self.cells.iter().position(|(name, _)| name == column)?;
        Some(self.cells.remove(index).1)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &CellValue) -> bool) {
        self.cells.retain(|(name, value)| keep(name, value));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Projects the row onto `columns`, in that order.
    ///
    /// Columns absent from the row come back as [`CellValue::Empty`].
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Row {
        columns
            .iter()
            .map(|column| {
                let column = column.as_ref();
                (
                    column.to_string(),
                    self.get(column).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }

    /// Returns a copy holding only cells with a non-empty value.
    pub fn non_empty(&self) -> Row {
        self.iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    /// JSON object form, in row order.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .cells
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        Value::Object(map)
    }

    /// Builds a row from a JSON object, keeping the object's key order.
    pub fn from_json_object(object: &Map<String, Value>) -> Row {
        object
            .iter()
            .map(|(name, value)| (name.clone(), CellValue::from_json(value)))
            .collect()
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Row::from_json_object(&object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_order() {
        let a: Row = [("id", "1"), ("name", "Alice")].into_iter().collect();
        let b: Row = [("name", "Alice"), ("id", "1")].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut row: Row = [("a", "1"), ("b", "2")].into_iter().collect();
        let previous = row.insert("a", "3");
        assert_eq!(previous, Some(CellValue::text("1")));
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn select_fills_missing_columns() {
        let row: Row = [("a", "1")].into_iter().collect();
        let projected = row.select(&["b", "a"]);
        assert_eq!(projected.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(projected.get("b"), Some(&CellValue::Empty));
    }

    #[test]
    fn serializes_in_insertion_order() {
        let row: Row = [("z", CellValue::text("last")), ("a", CellValue::Integer(1))]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"z":"last","a":1}"#);
    }
}
