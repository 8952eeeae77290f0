//! Correcting a proposed row from free-text feedback.

use tabmap_llm::{PromptStrategy, TextGenerator, Variables, prompts};
use tabmap_model::Row;

use crate::error::Result;
use crate::explainer::Mapping;
use crate::transformer::{expect_object, project_row};

#[derive(Debug, Clone)]
pub struct FeedbackRefiner {
    strategy: PromptStrategy,
}

impl Default for FeedbackRefiner {
    fn default() -> Self {
        Self::new(prompts::feedback_refiner())
    }
}

impl FeedbackRefiner {
    pub fn new(strategy: PromptStrategy) -> Self {
        Self { strategy }
    }

    /// Patches `prior` according to `feedback`.
    ///
    /// Keys outside `columns` are discarded and missing columns come back
    /// empty. Returned values are kept as given, so `0` and `false` survive. Untouched columns are not protected: the service sees the whole
    /// prior row and may change any of it.
    pub fn refine(
        &self,
        generator: &dyn TextGenerator,
        columns: &[String],
        source_row: &Row,
        prior: &Row,
        prior_mapping: &Mapping,
        feedback: &str,
    ) -> Result<Row> {
        let variables = Variables::new()
            .with("columns", columns.join(", "))
            .with("source_row", source_row.to_json().to_string())
            .with("result_row", prior.non_empty().to_json().to_string())
            .with("relations", prior_mapping.to_string())
            .with("feedback", feedback.trim());
        let output = self.strategy.run(generator, &variables, Some(columns))?;
        let object = expect_object(output, &self.strategy)?;
        let refined = project_row(&object, columns);
        tracing::debug!(
            columns = columns.len(),
            filled = refined.non_empty().len(),
            "row refined from feedback"
        );
        Ok(refined)
    }
}
