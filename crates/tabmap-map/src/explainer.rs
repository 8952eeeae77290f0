//! Advisory source-to-target column correspondence.
//!
//! Correspondence is inferred by value equality between the source row and
//! the transformed row. It can over-report when values collide and
//! under-report when a value was restyled, so it is only ever shown to the
//! user, never acted upon.

use std::collections::BTreeSet;
use std::fmt;

use tabmap_llm::{PromptStrategy, StrategyOutput, TextGenerator, Variables, prompts};
use tabmap_model::Row;

use crate::error::Result;
use crate::transformer::unexpected;

/// One target column and the source columns holding the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub target_column: String,
    /// Rendered value shared by the target and source cells.
    pub value: String,
    pub source_columns: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: Vec<MappingEntry>,
    unmatched: Vec<String>,
}

impl Mapping {
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Target columns with a value that no source column holds.
    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }

    pub fn sources_of(&self, target_column: &str) -> Option<&BTreeSet<String>> {
        self.entries
            .iter()
            .find(|e| e.target_column == target_column)
            .map(|e| &e.source_columns)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.unmatched.is_empty()
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let sources: Vec<&str> = entry.source_columns.iter().map(String::as_str).collect();
            writeln!(f, "{} <- {}", entry.target_column, sources.join(", "))?;
        }
        if !self.unmatched.is_empty() {
            writeln!(f, "unmatched: {}", self.unmatched.join(", "))?;
        }
        Ok(())
    }
}

/// Joins the non-empty cells of both rows on loosely equal values.
///
/// Target columns appear in `transformed` order. Empty cells on either side
/// are ignored.
pub fn explain_mapping(source: &Row, transformed: &Row) -> Mapping {
    let source_cells: Vec<(&str, &tabmap_model::CellValue)> = source
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .collect();

    let mut mapping = Mapping::default();
    for (target_column, value) in transformed.iter().filter(|(_, v)| !v.is_empty()) {
        let source_columns: BTreeSet<String> = source_cells
            .iter()
            .filter(|(_, source)| source.loosely_equals(value))
            .map(|(name, _)| (*name).to_string())
            .collect();
        if source_columns.is_empty() {
            mapping.unmatched.push(target_column.to_string());
        } else {
            mapping.entries.push(MappingEntry {
                target_column: target_column.to_string(),
                value: value.render(),
                source_columns,
            });
        }
    }
    mapping
}

/// Asks the service for a prose account of a proposed mapping.
#[derive(Debug, Clone)]
pub struct MappingNarrator {
    strategy: PromptStrategy,
}

impl Default for MappingNarrator {
    fn default() -> Self {
        Self::new(prompts::mapping_narrator())
    }
}

impl MappingNarrator {
    pub fn new(strategy: PromptStrategy) -> Self {
        Self { strategy }
    }

    pub fn narrate(
        &self,
        generator: &dyn TextGenerator,
        original: &Row,
        transformed: &Row,
    ) -> Result<String> {
        let variables = Variables::new()
            .with("original_row", original.to_json().to_string())
            .with("transformed_row", transformed.to_json().to_string());
        match self.strategy.run(generator, &variables, None)? {
            StrategyOutput::Text(text) => Ok(text),
            other => Err(unexpected(&other, &self.strategy, "text")),
        }
    }
}

#[cfg(test)]
mod tests {
    use tabmap_model::CellValue;

    use super::*;

    #[test]
    fn joins_on_equal_values() {
        let source: Row = [("full_name", CellValue::text("Carol")), ("uid", CellValue::Integer(9))]
            .into_iter()
            .collect();
        let transformed: Row = [("id", "9"), ("name", "Carol"), ("code", "")]
            .into_iter()
            .collect();
        let mapping = explain_mapping(&source, &transformed);
        assert_eq!(
            mapping.sources_of("id").unwrap().iter().collect::<Vec<_>>(),
            vec!["uid"]
        );
        assert_eq!(
            mapping.sources_of("name").unwrap().iter().collect::<Vec<_>>(),
            vec!["full_name"]
        );
        assert!(mapping.sources_of("code").is_none());
        assert!(mapping.unmatched().is_empty());
    }

    #[test]
    fn empty_cells_never_match() {
        let source: Row = [("a", "")].into_iter().collect();
        let transformed: Row = [("b", "")].into_iter().collect();
        assert!(explain_mapping(&source, &transformed).is_empty());
    }
}
