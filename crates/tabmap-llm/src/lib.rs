//! Text-generation capability for tabmap.
//!
//! - [`TextGenerator`]: the opaque prompt-to-text service, with a blocking
//!   [`OpenAiClient`] and an in-process [`ScriptedGenerator`].
//! - [`PromptTemplate`]: `{name}` templates.
//! - [`parse`]: brace scanning plus strict and lenient JSON recovery.
//! - [`PromptStrategy`]: a template pair with an [`OutputPolicy`]; the
//!   built-in strategies live in [`prompts`].

#![deny(unsafe_code)]

pub mod error;
pub mod generator;
pub mod openai;
pub mod parse;
pub mod prompts;
pub mod scripted;
pub mod strategy;
pub mod template;

pub use error::{GenerationError, ParseError, StrategyError, TemplateError};
pub use generator::{PromptRequest, TextGenerator};
pub use openai::{DEFAULT_BASE_URL, OpenAiClient, ProviderConfig};
pub use parse::{JsonShape, extract_json, extract_object};
pub use scripted::{FnGenerator, ScriptedGenerator};
pub use strategy::{FrameOutput, OutputPolicy, PromptStrategy, StrategyOutput, frame_from_json};
pub use template::{PromptTemplate, Variables};
