//! Error types for text generation, prompt rendering and response parsing.

use std::time::Duration;

use thiserror::Error;

/// Failures of a single call to the text-generation service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    /// The call exceeded its configured bound.
    #[error("generation request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, TLS or body decoding failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered without any completion text.
    #[error("service returned no completion")]
    EmptyResponse,

    /// No API key in the configuration or the environment.
    #[error("no API key configured (set provider.api_key or OPENAI_API_KEY)")]
    MissingApiKey,

    /// A scripted test generator ran out of responses.
    #[error("scripted generator has no response left for call #{call}")]
    Exhausted { call: usize },
}

impl GenerationError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// The service text could not be recovered as structured data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no JSON {expected} found in response")]
    NotFound { expected: &'static str },

    #[error("response is not valid JSON ({strict}); lenient parse failed too ({lenient})")]
    Invalid { strict: String, lenient: String },

    #[error("expected a JSON {expected}, found {found}")]
    WrongShape {
        expected: &'static str,
        found: &'static str,
    },
}

/// A prompt template could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template variable '{0}' is not bound")]
    MissingVariable(String),

    #[error("unclosed placeholder starting at byte {position}")]
    UnclosedPlaceholder { position: usize },

    #[error("unmatched '}}' at byte {position}")]
    UnmatchedBrace { position: usize },

    #[error("invalid placeholder name '{name}'")]
    InvalidPlaceholder { name: String },
}

/// Anything that can go wrong running a [`crate::PromptStrategy`].
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
