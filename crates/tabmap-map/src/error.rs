//! Error types for the mapping pipeline.

use tabmap_ingest::IngestError;
use tabmap_llm::{GenerationError, ParseError, StrategyError, TemplateError};
use tabmap_model::ModelError;
use thiserror::Error;

use crate::session::Stage;

/// Errors from mapping operations.
#[derive(Debug, Error)]
pub enum MapError {
    /// The generation call failed or timed out.
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// The service answered with text that holds no usable JSON.
    #[error("could not recover structured data from the response: {0}")]
    Parse(#[from] ParseError),

    #[error("prompt rendering failed: {0}")]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Model(#[from] ModelError),

    /// An operation was called in a stage that does not allow it.
    #[error("cannot {operation} while the session is {stage}")]
    InvalidTransition {
        operation: &'static str,
        stage: Stage,
    },

    /// The finished table could not be exported.
    #[error("export failed: {0}")]
    Export(#[from] IngestError),

    /// A strategy produced a different kind of output than its caller needs.
    #[error("{strategy} produced {found} output, expected {expected}")]
    UnexpectedOutput {
        strategy: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

impl MapError {
    /// True when repeating the same operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Generation(_) | Self::Parse(_))
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Generation(err) if err.is_timeout())
    }
}

impl From<StrategyError> for MapError {
    fn from(err: StrategyError) -> Self {
        match err {
            StrategyError::Template(e) => Self::Template(e),
            StrategyError::Generation(e) => Self::Generation(e),
            StrategyError::Parse(e) => Self::Parse(e),
        }
    }
}

/// Result type for mapping operations.
pub type Result<T> = std::result::Result<T, MapError>;
