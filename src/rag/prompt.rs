//! Prompt assembly for grounded and fallback responses.

use crate::config::Prompts;
use std::collections::HashMap;

/// Builds system prompts from retrieved context and the configured templates.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    prompts: Prompts,
}

impl PromptBuilder {
    /// Create a builder over the given prompt templates.
    pub fn new(prompts: Prompts) -> Self {
        Self { prompts }
    }

    /// Build the prompt for a query with retrieved context chunks.
    ///
    /// With zero chunks this falls back to the no-data template (honest
    /// admission plus a redirect to the admissions office); otherwise the
    /// chunks are joined with blank lines inside the grounding template.
    pub fn create_prompt_with_context(&self, query: &str, chunks: &[String]) -> String {
        if chunks.is_empty() {
            return self.fallback(query);
        }

        let context = chunks.join("\n\n");

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), query.to_string());
        vars.insert("context".to_string(), context);

        self.prompts.render_with_custom(&self.prompts.rag.grounded, &vars)
    }

    /// Build the no-data fallback prompt for a query.
    pub fn fallback(&self, query: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), query.to_string());
        self.prompts.render_with_custom(&self.prompts.rag.fallback, &vars)
    }
}
