//! Learning a source-to-target table transformation from one row and
//! propagating it over the rest.
//!
//! Pipeline, leaves first:
//!
//! 1. [`grouping`] collapses duplicate target columns.
//! 2. [`examples`] renders few-shot examples from target rows.
//! 3. [`transformer`] maps the first source row onto the target columns.
//! 4. [`reconciler`] restyles it after the target's conventions.
//! 5. [`explainer`] shows which columns went where.
//! 6. [`refiner`] patches the proposal from user feedback.
//! 7. [`applier`] propagates the accepted example chunk by chunk.
//!
//! [`MappingSession`] sequences all of it.

#![deny(unsafe_code)]

pub mod applier;
pub mod config;
pub mod error;
pub mod examples;
pub mod explainer;
pub mod grouping;
pub mod reconciler;
pub mod refiner;
pub mod session;
pub mod transformer;

pub use applier::{BatchApplier, BatchProgress, BatchRun, BatchStream, ConfirmedExample};
pub use config::{ExamplePlan, ExampleProfile, PipelineConfig};
pub use error::{MapError, Result};
pub use examples::{ExampleSet, make_rng, row_text, select_examples};
pub use explainer::{Mapping, MappingEntry, MappingNarrator, explain_mapping};
pub use grouping::{ColumnGroup, ColumnGrouping, group_columns};
pub use reconciler::CellReconciler;
pub use refiner::FeedbackRefiner;
pub use session::{Finalization, MappingPreview, MappingSession, Stage};
pub use transformer::RowTransformer;
