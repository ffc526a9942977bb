//! RAG (Retrieval-Augmented Generation) for grounded admissions answers.
//!
//! Retrieval narrows candidates semantically; the relevance gate then decides
//! lexically whether the candidates are usable as grounding context, and the
//! prompt builder wraps them for the chat model.

mod engine;
pub mod prompt;
pub mod relevance;

pub use engine::{RagEngine, RagResponse, RagSource};
pub use prompt::PromptBuilder;
pub use relevance::RelevanceGate;
