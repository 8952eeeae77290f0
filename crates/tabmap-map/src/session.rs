//! The mapping session: one source/target pair from registration to the
//! finished table.
//!
//! ```text
//! Empty -> MappingInProgress -> AwaitingConfirmation -> Confirmed -> Finalizing -> Done
//!                                   |          ^
//!                                   v          |
//!                               AwaitingFeedback
//! ```
//!
//! Every operation called outside its stage fails with
//! [`MapError::InvalidTransition`] and leaves the session untouched.
//! `register_tables` is accepted in every stage and starts over.
//!
//! A failed `request_mapping` or `submit_feedback` leaves the stage as it
//! was, so the call can be retried. Propagation runs through a
//! [`Finalization`]; dropping it before the terminal snapshot, or a chunk
//! failing, returns the session to `AwaitingConfirmation` with the accepted
//! example intact. The next finalization starts from row 0.

use std::fmt;
use std::io::Write;

use rand::rngs::StdRng;
use tabmap_llm::TextGenerator;
use tabmap_model::{Row, Table};

use crate::applier::{BatchApplier, BatchProgress, BatchRun, ConfirmedExample};
use crate::config::PipelineConfig;
use crate::error::{MapError, Result};
use crate::examples::{ExampleSet, make_rng, row_text, select_examples};
use crate::explainer::{Mapping, MappingNarrator, explain_mapping};
use crate::grouping::{ColumnGrouping, group_columns};
use crate::reconciler::{CellReconciler, style_reference_rows};
use crate::refiner::FeedbackRefiner;
use crate::transformer::RowTransformer;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// No tables registered.
    Empty,
    /// Tables registered; a proposal has not been produced yet.
    MappingInProgress,
    /// A proposed first row waits for the user's verdict.
    AwaitingConfirmation,
    /// The proposal was accepted; propagation has not started.
    Confirmed,
    /// The proposal was rejected; feedback is expected.
    AwaitingFeedback,
    /// Propagation is running.
    Finalizing,
    /// The finished table is available.
    Done,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::MappingInProgress => "mapping in progress",
            Self::AwaitingConfirmation => "awaiting confirmation",
            Self::Confirmed => "confirmed",
            Self::AwaitingFeedback => "awaiting feedback",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user is asked to confirm.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingPreview {
    /// First source row.
    pub original: Row,
    /// The proposed target row, in original target column order.
    pub transformed: Row,
    pub mapping: Mapping,
    /// Prose account of the mapping, when narration is enabled and succeeded.
    pub narration: Option<String>,
}

#[derive(Debug)]
struct TablePair {
    source: Table,
    target: Table,
    grouping: ColumnGrouping,
}

/// Working state of the current table pair.
#[derive(Debug, Default)]
struct MappingState {
    examples: Option<ExampleSet>,
    /// Transformer output before restyling, reduced columns.
    transformed: Option<Row>,
    /// Row the user was last shown, reduced columns. Becomes the confirmed
    /// example target.
    proposed: Option<Row>,
    mapping: Mapping,
}

/// One mapping workflow over one source/target pair.
pub struct MappingSession<G: TextGenerator> {
    generator: G,
    config: PipelineConfig,
    rng: StdRng,
    transformer: RowTransformer,
    reconciler: CellReconciler,
    narrator: MappingNarrator,
    refiner: FeedbackRefiner,
    applier: BatchApplier,
    stage: Stage,
    tables: Option<TablePair>,
    state: MappingState,
    final_table: Option<Table>,
}

impl<G: TextGenerator> fmt::Debug for MappingSession<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingSession")
            .field("stage", &self.stage)
            .field("config", &self.config)
            .field("has_tables", &self.tables.is_some())
            .finish_non_exhaustive()
    }
}

impl<G: TextGenerator> MappingSession<G> {
    pub fn new(generator: G, config: PipelineConfig) -> Self {
        let rng = make_rng(config.seed);
        Self {
            generator,
            config,
            rng,
            transformer: RowTransformer::default(),
            reconciler: CellReconciler::default(),
            narrator: MappingNarrator::default(),
            refiner: FeedbackRefiner::default(),
            applier: BatchApplier::default(),
            stage: Stage::Empty,
            tables: None,
            state: MappingState::default(),
            final_table: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn grouping(&self) -> Option<&ColumnGrouping> {
        self.tables.as_ref().map(|t| &t.grouping)
    }

    pub fn source(&self) -> Option<&Table> {
        self.tables.as_ref().map(|t| &t.source)
    }

    pub fn target(&self) -> Option<&Table> {
        self.tables.as_ref().map(|t| &t.target)
    }

    /// The mapping of the current proposal.
    pub fn mapping(&self) -> Option<&Mapping> {
        self.state.proposed.as_ref().map(|_| &self.state.mapping)
    }

    /// Rows per propagation call for the registered source.
    pub fn rows_per_chunk(&self) -> Option<usize> {
        self.source()
            .map(|source| self.config.rows_per_chunk(source.column_count()))
    }

    /// Registers a table pair, discarding all previous state.
    pub fn register_tables(&mut self, source: Table, target: Table) -> &ColumnGrouping {
        let grouping = group_columns(&target);
        tracing::info!(
            source_rows = source.row_count(),
            source_columns = source.column_count(),
            target_columns = target.column_count(),
            reduced_columns = grouping.reduced().column_count(),
            "tables registered"
        );
        self.state = MappingState::default();
        self.final_table = None;
        self.rng = make_rng(self.config.seed);
        self.stage = Stage::MappingInProgress;
        let pair = self.tables.insert(TablePair {
            source,
            target,
            grouping,
        });
        &pair.grouping
    }

    /// Proposes a target-shaped version of the first source row.
    pub fn request_mapping(&mut self) -> Result<MappingPreview> {
        self.expect_stage("request a mapping", &[Stage::MappingInProgress])?;
        let _span = tracing::info_span!("request_mapping").entered();
        let Some(tables) = self.tables.as_ref() else {
            return Err(self.invalid("request a mapping"));
        };

        let source_row = tables.source.row(0)?;
        let reduced = tables.grouping.reduced();
        let columns = reduced.column_names();

        let examples = select_examples(reduced, &self.config, &mut self.rng);
        let transformed = self.transformer.transform(
            &self.generator,
            &examples,
            &columns,
            &row_text(&source_row),
        )?;
        let style_rows =
            style_reference_rows(reduced, self.config.style_example_count(columns.len()));
        let reconciled =
            self.reconciler
                .reconcile(&self.generator, &transformed, &style_rows, &columns)?;

        let preview = self.preview(&source_row, &reconciled);
        self.state.examples = Some(examples);
        self.state.transformed = Some(transformed);
        self.state.proposed = Some(reconciled);
        self.state.mapping = preview.mapping.clone();
        self.transition(Stage::AwaitingConfirmation);
        Ok(preview)
    }

    /// Declines the current proposal.
    pub fn reject(&mut self) -> Result<()> {
        self.expect_stage("reject the mapping", &[Stage::AwaitingConfirmation])?;
        self.transition(Stage::AwaitingFeedback);
        Ok(())
    }

    /// Revises the proposal from the user's feedback.
    pub fn submit_feedback(&mut self, feedback: &str) -> Result<MappingPreview> {
        self.expect_stage("submit feedback", &[Stage::AwaitingFeedback])?;
        let _span = tracing::info_span!("submit_feedback").entered();
        let (Some(tables), Some(prior)) = (self.tables.as_ref(), self.state.proposed.as_ref())
        else {
            return Err(self.invalid("submit feedback"));
        };

        let source_row = tables.source.row(0)?;
        let columns = tables.grouping.reduced_columns();
        let refined = self.refiner.refine(
            &self.generator,
            &columns,
            &source_row,
            prior,
            &self.state.mapping,
            feedback,
        )?;

        let preview = self.preview(&source_row, &refined);
        self.state.proposed = Some(refined);
        self.state.mapping = preview.mapping.clone();
        self.transition(Stage::AwaitingConfirmation);
        Ok(preview)
    }

    /// Rejects the proposal and submits `feedback` in one step.
    pub fn refine(&mut self, feedback: &str) -> Result<MappingPreview> {
        self.reject()?;
        self.submit_feedback(feedback)
    }

    /// Accepts the proposal and returns the propagation stream.
    pub fn finalize(&mut self) -> Result<Finalization<'_, G>> {
        self.expect_stage("finalize", &[Stage::AwaitingConfirmation])?;
        let (Some(tables), Some(proposed)) = (self.tables.as_ref(), self.state.proposed.as_ref())
        else {
            return Err(self.invalid("finalize"));
        };
        let example = ConfirmedExample {
            source: tables.source.row(0)?,
            target: proposed.clone(),
        };
        let rows_per_chunk = self.config.rows_per_chunk(tables.source.column_count());
        let run = BatchRun::new(&tables.source, &tables.grouping, &example, rows_per_chunk);
        tracing::info!(
            rows_per_chunk,
            chunks = run.chunk_count(),
            "starting propagation"
        );
        self.transition(Stage::Confirmed);
        self.transition(Stage::Finalizing);
        Ok(Finalization {
            session: self,
            run,
            settled: false,
        })
    }

    /// Accepts the proposal and propagates it over the whole source.
    pub fn confirm(&mut self) -> Result<&Table> {
        self.confirm_with(|_| {})
    }

    /// [`MappingSession::confirm`], reporting every snapshot to `on_progress`.
    pub fn confirm_with(&mut self, mut on_progress: impl FnMut(&BatchProgress)) -> Result<&Table> {
        {
            let finalization = self.finalize()?;
            for step in finalization {
                on_progress(&step?);
            }
        }
        self.final_table()
    }

    /// The finished table, once the session is done.
    pub fn final_table(&self) -> Result<&Table> {
        match (&self.final_table, self.stage) {
            (Some(table), Stage::Done) => Ok(table),
            _ => Err(self.invalid("read the final table")),
        }
    }

    /// Writes the finished table as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let table = self.final_table()?;
        tabmap_ingest::write_csv(table, writer)?;
        Ok(())
    }

    fn preview(&self, source_row: &Row, proposed: &Row) -> MappingPreview {
        let transformed = self
            .grouping()
            .map_or_else(|| proposed.clone(), |g| g.expand_row(proposed));
        let mapping = explain_mapping(source_row, &transformed);
        let narration = if self.config.narrate_mapping {
            match self
                .narrator
                .narrate(&self.generator, source_row, &transformed)
            {
                Ok(text) => Some(text),
                Err(err) => {
                    tracing::warn!(error = %err, "mapping narration failed");
                    None
                }
            }
        } else {
            None
        };
        MappingPreview {
            original: source_row.clone(),
            transformed,
            mapping,
            narration,
        }
    }

    fn expect_stage(&self, operation: &'static str, allowed: &[Stage]) -> Result<()> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> MapError {
        MapError::InvalidTransition {
            operation,
            stage: self.stage,
        }
    }

    fn transition(&mut self, to: Stage) {
        tracing::info!(from = %self.stage, to = %to, "stage changed");
        self.stage = to;
    }
}

/// A running propagation, yielding [`BatchProgress`] snapshots.
///
/// The session is borrowed for the lifetime of the run. Completing the
/// iterator moves it to [`Stage::Done`]; an error or an early drop moves it
/// back to [`Stage::AwaitingConfirmation`].
pub struct Finalization<'s, G: TextGenerator> {
    session: &'s mut MappingSession<G>,
    run: BatchRun,
    settled: bool,
}

impl<G: TextGenerator> Finalization<'_, G> {
    pub fn rows_per_chunk(&self) -> usize {
        self.run.rows_per_chunk()
    }

    /// Snapshots before the terminal one.
    pub fn chunk_count(&self) -> usize {
        self.run.chunk_count()
    }

    pub fn stage(&self) -> Stage {
        self.session.stage
    }
}

impl<G: TextGenerator> Iterator for Finalization<'_, G> {
    type Item = Result<BatchProgress>;

    fn next(&mut self) -> Option<Self::Item> {
        let session = &mut *self.session;
        let tables = session.tables.as_ref()?;
        let step = self.run.advance(
            &session.applier,
            &session.generator,
            &tables.source,
            &tables.grouping,
        )?;
        match &step {
            Ok(progress) if progress.is_final() => {
                session.final_table = Some(progress.table.clone());
                session.transition(Stage::Done);
                self.settled = true;
            }
            Ok(progress) => {
                tracing::debug!(percent = progress.percent, "propagation progress");
            }
            Err(err) => {
                tracing::warn!(error = %err, "propagation failed");
                session.transition(Stage::AwaitingConfirmation);
                self.settled = true;
            }
        }
        Some(step)
    }
}

impl<G: TextGenerator> Drop for Finalization<'_, G> {
    fn drop(&mut self) {
        if !self.settled && self.session.stage == Stage::Finalizing {
            tracing::info!("propagation cancelled before completion");
            self.session.transition(Stage::AwaitingConfirmation);
        }
    }
}
