//! Propagating a confirmed example transformation over the source table.
//!
//! The source is cut into chunks of `rows_per_chunk` rows and each chunk is
//! sent in one call together with the confirmed example pair. Results
//! accumulate in source order. After every chunk a [`BatchProgress`] with
//! `min(99, floor(100 * processed / total))` is emitted; once all chunks are
//! in, duplicate target columns are restored and a final snapshot with
//! exactly 100 closes the sequence.
//!
//! Progress is pull-based: nothing runs until the caller asks for the next
//! snapshot. A run is finite and fused after its terminal emission or its
//! first error. Starting a new run begins again from row 0.

use tabmap_llm::{PromptStrategy, StrategyOutput, TextGenerator, Variables, prompts};
use tabmap_model::{CellValue, Column, Row, Table};

use crate::error::Result;
use crate::grouping::ColumnGrouping;
use crate::transformer::unexpected;

/// A snapshot of propagation.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    /// Rows propagated so far. Reduced target shape until the terminal
    /// snapshot, which carries the full target column set.
    pub table: Table,
    pub percent: u8,
    pub rows_processed: usize,
    pub total_rows: usize,
}

impl BatchProgress {
    pub fn is_final(&self) -> bool {
        self.percent == 100
    }
}

/// The source row and its accepted target-shaped counterpart.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedExample {
    pub source: Row,
    /// Target row restricted to the reduced columns.
    pub target: Row,
}

#[derive(Debug, Clone)]
pub struct BatchApplier {
    strategy: PromptStrategy,
}

impl Default for BatchApplier {
    fn default() -> Self {
        Self::new(prompts::batch_applier())
    }
}

impl BatchApplier {
    pub fn new(strategy: PromptStrategy) -> Self {
        Self { strategy }
    }

    /// An iterator over the progress of propagating `source`.
    pub fn stream<'a>(
        &'a self,
        generator: &'a dyn TextGenerator,
        source: &'a Table,
        grouping: &'a ColumnGrouping,
        example: &ConfirmedExample,
        rows_per_chunk: usize,
    ) -> BatchStream<'a> {
        BatchStream {
            applier: self,
            generator,
            source,
            grouping,
            run: BatchRun::new(source, grouping, example, rows_per_chunk),
        }
    }

    /// Transforms one chunk into a table with exactly `columns` and as many
    /// rows as the chunk.
    pub fn apply_chunk(
        &self,
        generator: &dyn TextGenerator,
        example_source: &str,
        example_target: &str,
        chunk: &Table,
        columns: &[String],
    ) -> Result<Table> {
        let variables = Variables::new()
            .with("example_source", example_source)
            .with("example_target", example_target)
            .with("chunk", chunk.to_column_json().to_string());
        let frame = match self.strategy.run(generator, &variables, None)? {
            StrategyOutput::Frame(frame) => frame,
            other => return Err(unexpected(&other, &self.strategy, "table")),
        };
        if frame.padded {
            tracing::warn!(
                rows = frame.table.row_count(),
                "chunk result had columns of unequal length; padded"
            );
        }

        let expected = chunk.row_count();
        let table = frame.table.select(columns);
        if table.row_count() == expected {
            return Ok(table);
        }
        tracing::warn!(
            expected,
            found = table.row_count(),
            "chunk result row count differs from chunk; fitted"
        );
        Ok(fit_rows(&table, expected)?)
    }
}

/// Pads with empty cells or truncates so every column has `rows` values.
pub fn fit_rows(table: &Table, rows: usize) -> tabmap_model::Result<Table> {
    Table::new(
        table
            .columns()
            .iter()
            .map(|column| {
                let mut values = column.values.clone();
                values.resize(rows, CellValue::Empty);
                Column::new(column.name.clone(), values)
            })
            .collect(),
    )
}

/// The state of one propagation run, independent of what it borrows.
#[derive(Debug, Clone)]
pub struct BatchRun {
    rows_per_chunk: usize,
    total_rows: usize,
    next_row: usize,
    columns: Vec<String>,
    example_source: String,
    example_target: String,
    accumulated: Table,
    finished: bool,
}

impl BatchRun {
    pub fn new(
        source: &Table,
        grouping: &ColumnGrouping,
        example: &ConfirmedExample,
        rows_per_chunk: usize,
    ) -> Self {
        let columns = grouping.reduced_columns();
        let example_target = example.target.select(&columns).non_empty().to_json().to_string();
        Self {
            rows_per_chunk: rows_per_chunk.max(1),
            total_rows: source.row_count(),
            next_row: 0,
            accumulated: Table::with_column_names(&columns),
            columns,
            example_source: example.source.to_json().to_string(),
            example_target,
            finished: false,
        }
    }

    pub fn rows_per_chunk(&self) -> usize {
        self.rows_per_chunk
    }

    /// Snapshots this run emits before the terminal one.
    pub fn chunk_count(&self) -> usize {
        self.total_rows.div_ceil(self.rows_per_chunk)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Processes the next chunk, or finishes the run.
    ///
    /// `None` once the terminal snapshot or an error has been returned.
    pub fn advance(
        &mut self,
        applier: &BatchApplier,
        generator: &dyn TextGenerator,
        source: &Table,
        grouping: &ColumnGrouping,
    ) -> Option<Result<BatchProgress>> {
        if self.finished {
            return None;
        }
        let step = if self.next_row < self.total_rows {
            self.process_chunk(applier, generator, source)
        } else {
            self.finish(grouping)
        };
        if step.is_err() {
            self.finished = true;
        }
        Some(step)
    }

    fn process_chunk(
        &mut self,
        applier: &BatchApplier,
        generator: &dyn TextGenerator,
        source: &Table,
    ) -> Result<BatchProgress> {
        let start = self.next_row;
        let end = (start + self.rows_per_chunk).min(self.total_rows);
        let chunk = source.slice(start, end);
        tracing::debug!(start, end, total = self.total_rows, "propagating chunk");

        let result = applier.apply_chunk(
            generator,
            &self.example_source,
            &self.example_target,
            &chunk,
            &self.columns,
        )?;
        self.accumulated.append(&result);
        self.next_row = end;

        Ok(BatchProgress {
            table: self.accumulated.clone(),
            percent: intermediate_percent(end, self.total_rows),
            rows_processed: end,
            total_rows: self.total_rows,
        })
    }

    fn finish(&mut self, grouping: &ColumnGrouping) -> Result<BatchProgress> {
        let table = grouping.expand_table(&self.accumulated)?;
        self.finished = true;
        tracing::debug!(
            rows = table.row_count(),
            columns = table.column_count(),
            "propagation finished"
        );
        Ok(BatchProgress {
            table,
            percent: 100,
            rows_processed: self.total_rows,
            total_rows: self.total_rows,
        })
    }
}

/// `min(99, floor(100 * processed / total))`.
pub fn intermediate_percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (processed.saturating_mul(100) / total).min(99);
    u8::try_from(percent).unwrap_or(99)
}

/// Borrowing iterator over a [`BatchRun`].
pub struct BatchStream<'a> {
    applier: &'a BatchApplier,
    generator: &'a dyn TextGenerator,
    source: &'a Table,
    grouping: &'a ColumnGrouping,
    run: BatchRun,
}

impl BatchStream<'_> {
    pub fn run(&self) -> &BatchRun {
        &self.run
    }
}

impl Iterator for BatchStream<'_> {
    type Item = Result<BatchProgress>;

    fn next(&mut self) -> Option<Self::Item> {
        self.run
            .advance(self.applier, self.generator, self.source, self.grouping)
    }
}

impl std::iter::FusedIterator for BatchStream<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_capped_below_completion() {
        assert_eq!(intermediate_percent(5, 500), 1);
        assert_eq!(intermediate_percent(499, 500), 99);
        assert_eq!(intermediate_percent(500, 500), 99);
        assert_eq!(intermediate_percent(1, 3), 33);
    }

    #[test]
    fn fit_rows_pads_and_truncates() {
        let table = Table::from_columns(vec![("x", vec!["a", "b"])]).unwrap();
        assert_eq!(fit_rows(&table, 3).unwrap().column("x").unwrap().values[2], CellValue::Empty);
        assert_eq!(fit_rows(&table, 1).unwrap().row_count(), 1);
    }
}
