//! Restyling a transformed row after the target's conventions.

use tabmap_llm::{PromptStrategy, TextGenerator, Variables, prompts};
use tabmap_model::{CellValue, Row, Table};

use crate::error::Result;
use crate::transformer::expect_object;

#[derive(Debug, Clone)]
pub struct CellReconciler {
    strategy: PromptStrategy,
}

impl Default for CellReconciler {
    fn default() -> Self {
        Self::new(prompts::cell_reconciler())
    }
}

impl CellReconciler {
    pub fn new(strategy: PromptStrategy) -> Self {
        Self { strategy }
    }

    /// Restyles the values of `transformed` to match `reference_rows`.
    ///
    /// The result has exactly `columns` as keys. A column that was empty in
    /// `transformed` is empty in the result whatever the service answers, and
    /// a column the service drops keeps its transformed value.
    pub fn reconcile(
        &self,
        generator: &dyn TextGenerator,
        transformed: &Row,
        reference_rows: &[Row],
        columns: &[String],
    ) -> Result<Row> {
        let variables = Variables::new()
            .with("columns", columns.join(", "))
            .with("reference_rows", json_lines(reference_rows))
            .with("row", transformed.to_json().to_string());
        let object = expect_object(self.strategy.run(generator, &variables, None)?, &self.strategy)?;
        let restyled = Row::from_json_object(&object);
        Ok(keep_empty_cells(transformed, &restyled, columns))
    }
}

/// The leading `count` rows of `target`, used as style references.
pub fn style_reference_rows(target: &Table, count: usize) -> Vec<Row> {
    target.rows().take(count).collect()
}

/// One compact JSON object per line.
pub fn json_lines(rows: &[Row]) -> String {
    rows.iter()
        .map(|row| row.to_json().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the reconciled row: `restyled` values (or `before` values the
/// service dropped) where `before` had content, empty cells everywhere else.
pub fn keep_empty_cells(before: &Row, restyled: &Row, columns: &[String]) -> Row {
    columns
        .iter()
        .map(|column| {
            let was_empty = before.get(column).is_none_or(CellValue::is_empty);
            let value = if was_empty {
                CellValue::Empty
            } else {
                restyled
                    .get(column)
                    .filter(|v| !v.is_empty())
                    .or_else(|| before.get(column))
                    .cloned()
                    .unwrap_or_default()
            };
            (column.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use tabmap_llm::ScriptedGenerator;

    use super::*;

    #[test]
    fn blank_columns_stay_blank() {
        let columns = vec!["id".to_string(), "name".to_string(), "date".to_string()];
        let before: Row = [("id", "9"), ("name", ""), ("date", "1/2/2024")]
            .into_iter()
            .collect();
        let generator = ScriptedGenerator::with_responses([
            r#"{"id": "ID-009", "name": "Invented", "date": "2024-01-02", "extra": "x"}"#,
        ]);
        let row = CellReconciler::default()
            .reconcile(&generator, &before, &[], &columns)
            .unwrap();
        assert_eq!(row.get("id"), Some(&CellValue::text("ID-009")));
        assert_eq!(row.get("name"), Some(&CellValue::Empty));
        assert_eq!(row.get("date"), Some(&CellValue::text("2024-01-02")));
        assert!(!row.contains("extra"));
    }

    #[test]
    fn reference_rows_are_json_lines() {
        let target = Table::from_columns(vec![("id", vec!["1", "2", "3"])]).unwrap();
        let rows = style_reference_rows(&target, 2);
        assert_eq!(json_lines(&rows), "{\"id\":\"1\"}\n{\"id\":\"2\"}");
    }
}
