//! Collapsing duplicate-content target columns.
//!
//! Columns are visited in declaration order. The first unassigned column
//! becomes a representative and absorbs every later unassigned column whose
//! cells equal its own, so the first-found representative always wins and
//! the result does not depend on anything but column order.
//!
//! A target without rows gives no evidence that two columns hold the same
//! data, so every column of a header-only target is its own group.

use std::collections::BTreeMap;

use tabmap_model::{Column, Row, Table};

/// A representative column and every column identical to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup {
    pub representative: String,
    /// All members in declaration order, the representative first.
    pub members: Vec<String>,
}

impl ColumnGroup {
    /// True when the group holds more than its representative.
    pub fn is_merged(&self) -> bool {
        self.members.len() > 1
    }

    /// Members other than the representative.
    pub fn duplicates(&self) -> &[String] {
        &self.members[1..]
    }
}

/// Result of grouping a target table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnGrouping {
    reduced: Table,
    groups: Vec<ColumnGroup>,
    original_columns: Vec<String>,
}

/// Groups the columns of `target` by cell-for-cell equality.
pub fn group_columns(target: &Table) -> ColumnGrouping {
    let columns = target.columns();
    let mut assigned = vec![false; columns.len()];
    let mut groups = Vec::new();
    let mut representatives: Vec<Column> = Vec::new();
    let comparable = target.row_count() > 0;

    for (idx, column) in columns.iter().enumerate() {
        if assigned[idx] {
            continue;
        }
        assigned[idx] = true;
        let mut members = vec![column.name.clone()];
        for (other_idx, other) in columns.iter().enumerate().skip(idx + 1) {
            if comparable && !assigned[other_idx] && column.same_values(other) {
                assigned[other_idx] = true;
                members.push(other.name.clone());
            }
        }
        groups.push(ColumnGroup {
            representative: column.name.clone(),
            members,
        });
        representatives.push(column.clone());
    }

    let merged = groups.iter().filter(|g| g.is_merged()).count();
    if merged > 0 {
        tracing::debug!(
            columns = columns.len(),
            reduced = representatives.len(),
            merged,
            "collapsed identical target columns"
        );
    }

    ColumnGrouping {
        // Representatives are a subset of an already valid table.
        reduced: Table::new(representatives).unwrap_or_default(),
        groups,
        original_columns: target.column_names(),
    }
}

impl ColumnGrouping {
    /// The target restricted to one column per group.
    pub fn reduced(&self) -> &Table {
        &self.reduced
    }

    pub fn reduced_columns(&self) -> Vec<String> {
        self.reduced.column_names()
    }

    pub fn groups(&self) -> &[ColumnGroup] {
        &self.groups
    }

    /// Groups that absorbed at least one duplicate.
    pub fn merged(&self) -> impl Iterator<Item = &ColumnGroup> {
        self.groups.iter().filter(|g| g.is_merged())
    }

    /// Representative name to member names, for every group.
    pub fn group_map(&self) -> BTreeMap<String, Vec<String>> {
        self.groups
            .iter()
            .map(|g| (g.representative.clone(), g.members.clone()))
            .collect()
    }

    /// Column order of the ungrouped target.
    pub fn original_columns(&self) -> &[String] {
        &self.original_columns
    }

    pub fn group_of(&self, column: &str) -> Option<&ColumnGroup> {
        self.groups
            .iter()
            .find(|g| g.members.iter().any(|m| m == column))
    }

    fn source_name<'a>(&'a self, column: &'a str) -> &'a str {
        self.group_of(column)
            .map_or(column, |g| g.representative.as_str())
    }

    /// Restores the full target column set on a reduced-shape table.
    ///
    /// Each duplicate receives a copy of its representative's column,
    /// columns the table lacks come back empty, every missing cell is
    /// normalized to empty, and columns follow the original target order.
    /// Columns outside the original target are dropped.
    pub fn expand_table(&self, table: &Table) -> tabmap_model::Result<Table> {
        let rows = table.row_count();
        let columns = self
            .original_columns
            .iter()
            .map(|name| {
                let source = table
                    .column(self.source_name(name))
                    .or_else(|| table.column(name));
                match source {
                    Some(found) => Column::new(name.clone(), found.values.clone()),
                    None => Column::empty(name.clone(), rows),
                }
            })
            .collect();
        let mut expanded = Table::new(columns)?;
        expanded.fill_missing();
        Ok(expanded)
    }

    /// Row form of [`ColumnGrouping::expand_table`].
    pub fn expand_row(&self, row: &Row) -> Row {
        self.original_columns
            .iter()
            .map(|name| {
                let value = row
                    .get(self.source_name(name))
                    .or_else(|| row.get(name))
                    .filter(|value| !value.is_empty())
                    .cloned()
                    .unwrap_or_default();
                (name.clone(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use tabmap_model::CellValue;

    use super::*;

    #[test]
    fn later_identical_column_folds_into_first() {
        let target = Table::from_columns(vec![
            ("a", vec!["x", "y"]),
            ("b", vec!["x", "y"]),
            ("c", vec!["x", "z"]),
        ])
        .unwrap();
        let grouping = group_columns(&target);
        assert_eq!(grouping.reduced_columns(), vec!["a", "c"]);
        assert_eq!(grouping.group_of("b").unwrap().representative, "a");
        assert_eq!(grouping.merged().count(), 1);
    }

    #[test]
    fn mixed_kinds_compare_by_text() {
        let target = Table::from_columns(vec![
            ("n", vec![CellValue::Integer(1)]),
            ("s", vec![CellValue::text("1")]),
        ])
        .unwrap();
        assert_eq!(group_columns(&target).reduced_columns(), vec!["n"]);
    }

    #[test]
    fn expand_row_copies_representative() {
        let target = Table::from_columns(vec![("a", vec!["x"]), ("b", vec!["x"])]).unwrap();
        let grouping = group_columns(&target);
        let row: Row = [("a", "v")].into_iter().collect();
        let expanded = grouping.expand_row(&row);
        assert_eq!(expanded.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(expanded.get("b"), Some(&CellValue::text("v")));
    }

    #[test]
    fn header_only_target_keeps_every_column() {
        let empty: Vec<CellValue> = Vec::new();
        let target = Table::from_columns(vec![
            ("a", empty.clone()),
            ("b", empty.clone()),
            ("c", empty),
        ])
        .unwrap();
        let grouping = group_columns(&target);
        assert_eq!(grouping.reduced_columns(), vec!["a", "b", "c"]);
        assert_eq!(grouping.merged().count(), 0);
    }
}
