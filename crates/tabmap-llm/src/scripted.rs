//! In-process generators for tests and offline runs.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::error::GenerationError;
use crate::generator::{PromptRequest, TextGenerator};

/// Replays queued responses in order and records every request.
///
/// Once the queue is empty it answers with the fallback response if one is
/// set, and with [`GenerationError::Exhausted`] otherwise.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<PromptRequest>>,
    fallback: Option<String>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator that answers with `responses`, in order.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::new();
        for response in responses {
            generator.push_response(response);
        }
        generator
    }

    /// Answer with `response` once the queue runs dry.
    #[must_use]
    pub fn with_fallback(mut self, response: impl Into<String>) -> Self {
        self.fallback = Some(response.into());
        self
    }

    pub fn push_response(&self, response: impl Into<String>) {
        self.lock_responses().push_back(Ok(response.into()));
    }

    pub fn push_error(&self, error: GenerationError) {
        self.lock_responses().push_back(Err(error));
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<PromptRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn remaining(&self) -> usize {
        self.lock_responses().len()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, GenerationError>>> {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, request: &PromptRequest) -> Result<String, GenerationError> {
        let call = {
            let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
            requests.push(request.clone());
            requests.len()
        };
        match self.lock_responses().pop_front() {
            Some(response) => response,
            None => self
                .fallback
                .clone()
                .ok_or(GenerationError::Exhausted { call }),
        }
    }
}

/// Wraps a closure as a [`TextGenerator`].
pub struct FnGenerator<F>(pub F);

impl<F> FnGenerator<F>
where
    F: Fn(&PromptRequest) -> Result<String, GenerationError>,
{
    pub fn new(respond: F) -> Self {
        Self(respond)
    }
}

impl<F> TextGenerator for FnGenerator<F>
where
    F: Fn(&PromptRequest) -> Result<String, GenerationError>,
{
    fn generate(&self, request: &PromptRequest) -> Result<String, GenerationError> {
        (self.0)(request)
    }
}

impl<F> std::fmt::Debug for FnGenerator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnGenerator")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(human: &str) -> PromptRequest {
        PromptRequest {
            system: String::new(),
            human: human.to_string(),
        }
    }

    #[test]
    fn replays_in_order_then_reports_exhaustion() {
        let generator = ScriptedGenerator::with_responses(["one", "two"]);
        assert_eq!(generator.generate(&request("a")).unwrap(), "one");
        assert_eq!(generator.generate(&request("b")).unwrap(), "two");
        assert!(matches!(
            generator.generate(&request("c")),
            Err(GenerationError::Exhausted { call: 3 })
        ));
        assert_eq!(generator.call_count(), 3);
        assert_eq!(generator.requests()[1].human, "b");
    }

    #[test]
    fn queued_errors_are_returned() {
        let generator = ScriptedGenerator::new();
        generator.push_error(GenerationError::Timeout(std::time::Duration::from_secs(1)));
        assert!(generator.generate(&request("a")).unwrap_err().is_timeout());
    }

    #[test]
    fn fallback_answers_after_queue() {
        let generator = ScriptedGenerator::with_responses(["first"]).with_fallback("{}");
        generator.generate(&request("a")).unwrap();
        assert_eq!(generator.generate(&request("b")).unwrap(), "{}");
        assert_eq!(generator.remaining(), 0);
    }

    #[test]
    fn closures_generate() {
        let generator = FnGenerator::new(|req: &PromptRequest| Ok(req.human.to_uppercase()));
        assert_eq!(generator.generate(&request("hi")).unwrap(), "HI");
    }
}
