//! The text-generation capability.

use crate::error::GenerationError;

/// A fully rendered prompt: one system message and one human message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub system: String,
    pub human: String,
}

/// An opaque service that turns a prompt into text.
///
/// Each call blocks until the service answers or its timeout elapses.
pub trait TextGenerator {
    fn generate(&self, request: &PromptRequest) -> Result<String, GenerationError>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn generate(&self, request: &PromptRequest) -> Result<String, GenerationError> {
        (**self).generate(request)
    }
}

impl<T: TextGenerator + ?Sized> TextGenerator for std::sync::Arc<T> {
    fn generate(&self, request: &PromptRequest) -> Result<String, GenerationError> {
        (**self).generate(request)
    }
}
