//! Mapping one source row onto the target columns.

use serde_json::{Map, Value};
use tabmap_llm::{PromptStrategy, StrategyOutput, TextGenerator, Variables, prompts};
use tabmap_model::{CellValue, Row};

use crate::error::{MapError, Result};
use crate::examples::ExampleSet;

/// Asks the service to rewrite a row's textual rendering as a target row.
#[derive(Debug, Clone)]
pub struct RowTransformer {
    strategy: PromptStrategy,
}

impl Default for RowTransformer {
    fn default() -> Self {
        Self::new(prompts::row_transformer())
    }
}

impl RowTransformer {
    pub fn new(strategy: PromptStrategy) -> Self {
        Self { strategy }
    }

    /// Transforms `row_text` into a row whose keys are exactly `columns`.
    ///
    /// Falsy values in the response are dropped, unknown keys are ignored and
    /// every column the response leaves out comes back empty. A response with
    /// no JSON object fails the call.
    pub fn transform(
        &self,
        generator: &dyn TextGenerator,
        examples: &ExampleSet,
        columns: &[String],
        row_text: &str,
    ) -> Result<Row> {
        let variables = Variables::new()
            .with("columns", columns.join(", "))
            .with("examples", examples.text.as_str())
            .with("row", row_text);
        let object = expect_object(self.strategy.run(generator, &variables, None)?, &self.strategy)?;
        let row = complete_row(&object, columns);
        tracing::debug!(
            columns = columns.len(),
            filled = row.non_empty().len(),
            "row transformed"
        );
        Ok(row)
    }
}

/// Keeps the truthy values of `object` for `columns` and fills the rest with empty cells.
///
/// The result always has exactly `columns` as keys, in that order.
pub fn complete_row(object: &Map<String, Value>, columns: &[String]) -> Row {
    columns
        .iter()
        .map(|column| {
            let value = object
                .get(column)
                .filter(|value| is_truthy(value))
                .map_or(CellValue::Empty, CellValue::from_json);
            (column.clone(), value)
        })
        .collect()
}

/// Takes every value of `object` for `columns` as returned, falsy ones
/// included, and fills absent columns with empty cells.
pub fn project_row(object: &Map<String, Value>, columns: &[String]) -> Row {
    columns
        .iter()
        .map(|column| {
            let value = object.get(column).map_or(CellValue::Empty, CellValue::from_json);
            (column.clone(), value)
        })
        .collect()
}

/// Whether a returned value counts as filled. Null, false, zero and empty
/// strings, arrays or objects do not.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub(crate) fn expect_object(
    output: StrategyOutput,
    strategy: &PromptStrategy,
) -> Result<Map<String, Value>> {
    match output {
        StrategyOutput::Object(object) => Ok(object),
        other => Err(unexpected(&other, strategy, "object")),
    }
}

pub(crate) fn unexpected(
    output: &StrategyOutput,
    strategy: &PromptStrategy,
    expected: &'static str,
) -> MapError {
    let found = match output {
        StrategyOutput::Text(_) => "text",
        StrategyOutput::Object(_) => "object",
        StrategyOutput::Frame(_) => "table",
    };
    MapError::UnexpectedOutput {
        strategy: strategy.name(),
        expected,
        found,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tabmap_llm::ScriptedGenerator;

    use super::*;

    fn columns() -> Vec<String> {
        vec!["id".to_string(), "name".to_string()]
    }

    #[test]
    fn falsy_values_and_extra_keys_are_dropped() {
        let object = json!({"name": "", "id": 0, "extra": "x"});
        let Value::Object(object) = object else {
            unreachable!()
        };
        let row = complete_row(&object, &columns());
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["id", "name"]);
        assert!(row.iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn transform_parses_service_json() {
        let generator =
            ScriptedGenerator::with_responses(["Result:\n{\"name\": \"Carol\", \"id\": 9}"]);
        let examples = ExampleSet {
            text: String::new(),
            columns: columns(),
            count: 0,
        };
        let row = RowTransformer::default()
            .transform(&generator, &examples, &columns(), "Carol 9")
            .unwrap();
        assert_eq!(row.get("id"), Some(&CellValue::Integer(9)));
        assert_eq!(row.get("name"), Some(&CellValue::text("Carol")));
        assert!(generator.requests()[0].human.contains("Carol 9"));
    }

    #[test]
    fn unparseable_response_fails() {
        let generator = ScriptedGenerator::with_responses(["no idea"]);
        let examples = ExampleSet {
            text: String::new(),
            columns: columns(),
            count: 0,
        };
        let err = RowTransformer::default()
            .transform(&generator, &examples, &columns(), "x")
            .unwrap_err();
        assert!(matches!(err, MapError::Parse(_)));
    }
}
