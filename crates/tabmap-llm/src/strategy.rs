//! Prompting strategies.
//!
//! Every call the pipeline makes has the same shape: render two templates,
//! call the generator once, post-process the text. A [`PromptStrategy`] holds
//! the templates and names the post-processing step as an [`OutputPolicy`].

use serde_json::{Map, Value};
use tabmap_model::{CellValue, Column, Table};

use crate::error::{ParseError, StrategyError};
use crate::generator::{PromptRequest, TextGenerator};
use crate::parse::{JsonShape, extract_json, extract_object, kind_of};
use crate::template::{PromptTemplate, Variables};

/// How raw service text becomes a [`StrategyOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPolicy {
    /// Return the text unchanged.
    FreeText,
    /// Parse a single JSON object.
    JsonObject,
    /// Parse a JSON object and drop keys outside the allowed set.
    KeyFilteredObject,
    /// Parse a column-oriented or record-oriented JSON table.
    FrameFromJson,
}

/// A table recovered from service JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    pub table: Table,
    /// True when some columns were shorter than the longest and got padded.
    pub padded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutput {
    Text(String),
    Object(Map<String, Value>),
    Frame(FrameOutput),
}

#[derive(Debug, Clone)]
pub struct PromptStrategy {
    name: &'static str,
    system: PromptTemplate,
    human: PromptTemplate,
    policy: OutputPolicy,
}

impl PromptStrategy {
    pub fn new(
        name: &'static str,
        system: PromptTemplate,
        human: PromptTemplate,
        policy: OutputPolicy,
    ) -> Self {
        Self {
            name,
            system,
            human,
            policy,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> OutputPolicy {
        self.policy
    }

    pub fn request(&self, variables: &Variables) -> Result<PromptRequest, StrategyError> {
        Ok(PromptRequest {
            system: self.system.render(variables)?,
            human: self.human.render(variables)?,
        })
    }

    /// Renders the prompt and returns the raw service text.
    pub fn invoke(
        &self,
        generator: &dyn TextGenerator,
        variables: &Variables,
    ) -> Result<String, StrategyError> {
        let request = self.request(variables)?;
        let text = generator.generate(&request)?;
        tracing::debug!(
            strategy = self.name,
            response_bytes = text.len(),
            "generation call completed"
        );
        Ok(text)
    }

    /// Invokes the service and applies this strategy's [`OutputPolicy`].
    ///
    /// `allowed_keys` is only consulted by [`OutputPolicy::KeyFilteredObject`].
    pub fn run(
        &self,
        generator: &dyn TextGenerator,
        variables: &Variables,
        allowed_keys: Option<&[String]>,
    ) -> Result<StrategyOutput, StrategyError> {
        let text = self.invoke(generator, variables)?;
        apply_policy(self.policy, &text, allowed_keys).map_err(StrategyError::from)
    }
}

pub fn apply_policy(
    policy: OutputPolicy,
    text: &str,
    allowed_keys: Option<&[String]>,
) -> Result<StrategyOutput, ParseError> {
    match policy {
        OutputPolicy::FreeText => Ok(StrategyOutput::Text(text.trim().to_string())),
        OutputPolicy::JsonObject => extract_object(text).map(StrategyOutput::Object),
        OutputPolicy::KeyFilteredObject => {
            let mut object = extract_object(text)?;
            if let Some(allowed) = allowed_keys {
                object.retain(|key, _| allowed.iter().any(|k| k == key));
            }
            Ok(StrategyOutput::Object(object))
        }
        OutputPolicy::FrameFromJson => {
            let value = extract_json(text, JsonShape::Any)?;
            frame_from_json(&value).map(StrategyOutput::Frame)
        }
    }
}

/// Builds a table from service JSON.
///
/// Accepted forms:
/// - `{"col": [v0, v1, ...]}`
/// - `{"col": {"0": v0, "1": v1}}` (index-keyed, ordered numerically)
/// - `[{"col": v0}, {"col": v1}]`
///
/// Columns shorter than the longest one are padded with empty cells.
pub fn frame_from_json(value: &Value) -> Result<FrameOutput, ParseError> {
    let mut columns: Vec<Column> = match value {
        Value::Object(object) => object
            .iter()
            .map(|(name, cells)| Column::new(name.clone(), column_values(cells)))
            .collect(),
        Value::Array(records) => {
            let mut table = Table::default();
            for record in records {
                let Value::Object(object) = record else {
                    return Err(ParseError::WrongShape {
                        expected: "object record",
                        found: kind_of(record),
                    });
                };
                table.push_row(&tabmap_model::Row::from_json_object(object));
            }
            table.columns().to_vec()
        }
        other => {
            return Err(ParseError::WrongShape {
                expected: "table",
                found: kind_of(other),
            });
        }
    };

    let longest = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
    let mut padded = false;
    for column in &mut columns {
        if column.values.len() < longest {
            padded = true;
            column.values.resize(longest, CellValue::Empty);
        }
    }

    // Keys of a JSON object are unique and every column now has `longest`
    // values, so construction cannot fail; map the error anyway.
    let table = Table::new(columns).map_err(|_| ParseError::WrongShape {
        expected: "rectangular table",
        found: "ragged table",
    })?;
    Ok(FrameOutput { table, padded })
}

fn column_values(cells: &Value) -> Vec<CellValue> {
    match cells {
        Value::Array(items) => items.iter().map(CellValue::from_json).collect(),
        Value::Object(indexed) => {
            let mut entries: Vec<(Option<usize>, usize, &Value)> = indexed
                .iter()
                .enumerate()
                .map(|(position, (key, value))| (key.trim().parse().ok(), position, value))
                .collect();
            entries.sort_by_key(|(index, position, _)| (index.is_none(), *index, *position));
            entries
                .into_iter()
                .map(|(_, _, value)| CellValue::from_json(value))
                .collect()
        }
        scalar => vec![CellValue::from_json(scalar)],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn pads_ragged_columns() {
        let frame = frame_from_json(&json!({"x": ["a", "b", "c"], "y": ["d"]})).unwrap();
        assert!(frame.padded);
        assert_eq!(
            frame.table.column("y").unwrap().values,
            vec![CellValue::text("d"), CellValue::Empty, CellValue::Empty]
        );
        assert_eq!(frame.table.column("x").unwrap().values.len(), 3);
    }

    #[test]
    fn reads_index_keyed_columns_in_numeric_order() {
        let frame = frame_from_json(&json!({"x": {"10": "c", "2": "b", "0": "a"}})).unwrap();
        assert!(!frame.padded);
        assert_eq!(
            frame.table.column("x").unwrap().values,
            vec![CellValue::text("a"), CellValue::text("b"), CellValue::text("c")]
        );
    }

    #[test]
    fn reads_record_arrays() {
        let frame = frame_from_json(&json!([{"a": 1}, {"a": 2, "b": "x"}])).unwrap();
        assert_eq!(frame.table.row_count(), 2);
        assert_eq!(
            frame.table.column("b").unwrap().values,
            vec![CellValue::Empty, CellValue::text("x")]
        );
    }

    #[test]
    fn rejects_scalars() {
        assert!(matches!(
            frame_from_json(&json!("nope")),
            Err(ParseError::WrongShape { .. })
        ));
    }

    #[test]
    fn key_filter_drops_unknown_keys() {
        let allowed = vec!["id".to_string()];
        let output = apply_policy(
            OutputPolicy::KeyFilteredObject,
            r#"{"id": "1", "extra": "x"}"#,
            Some(&allowed),
        )
        .unwrap();
        let StrategyOutput::Object(object) = output else {
            panic!("expected object output");
        };
        assert_eq!(object.len(), 1);
        assert!(object.contains_key("id"));
    }

    #[test]
    fn free_text_is_trimmed() {
        assert_eq!(
            apply_policy(OutputPolicy::FreeText, "  hello \n", None).unwrap(),
            StrategyOutput::Text("hello".to_string())
        );
    }
}
