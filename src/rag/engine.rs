//! Grounded answer generation.
//!
//! Ties retrieval, gating, and prompt building to the chat completion call.
//! Every failure path degrades to a graceful reply; a raw internal error is
//! never surfaced to the end user.

use crate::config::Settings;
use crate::error::{AbiturError, Result};
use crate::openai::create_client;
use crate::orchestrator::Orchestrator;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Static reply when the model itself is unreachable.
const UNAVAILABLE_REPLY: &str =
    "Извините, сейчас я не могу ответить на ваш вопрос. Пожалуйста, обратитесь в приемную комиссию университета.";

/// Kept conversation messages (excluding the system prompt).
const MAX_HISTORY: usize = 20;

/// Where the answer's grounding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RagSource {
    /// Answer grounded in knowledge-base context.
    Knowledge,
    /// No usable context; generic fallback prompt.
    Generic,
    /// The model call failed; static degraded reply.
    Unavailable,
}

/// An answer with its grounding provenance.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Grounding source of the answer.
    pub source: RagSource,
    /// Context chunks that were injected into the prompt.
    pub context: Vec<String>,
}

/// RAG engine for question answering.
pub struct RagEngine {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    orchestrator: Arc<Orchestrator>,
    max_context_chunks: usize,
    conversation_history: Vec<ChatCompletionRequestMessage>,
}

impl RagEngine {
    /// Create a new RAG engine over a shared orchestrator.
    pub fn new(orchestrator: Arc<Orchestrator>, settings: &Settings) -> Self {
        Self {
            client: create_client(),
            model: settings.rag.model.clone(),
            orchestrator,
            max_context_chunks: settings.rag.max_context_chunks as usize,
            conversation_history: Vec::new(),
        }
    }

    /// Override the chat model.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Answer a question, carrying the conversation history forward.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&mut self, question: &str) -> Result<RagResponse> {
        info!("processing question");

        // Retrieval failures degrade to the ungrounded path instead of
        // failing the user-facing request.
        let chunks = match self.orchestrator.find_relevant_chunks(question, self.max_context_chunks).await
        {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("retrieval unavailable, answering without context: {}", e);
                Vec::new()
            }
        };

        let grounded = self.orchestrator.has_relevant_information(&chunks, question);
        debug!(retrieved = chunks.len(), grounded, "relevance gate decision");

        let (system_prompt, source, context) = if grounded {
            let prompt = self.orchestrator.create_prompt_with_context(question, &chunks);
            (prompt, RagSource::Knowledge, chunks)
        } else {
            let prompt = self.orchestrator.create_prompt_with_context(question, &[]);
            (prompt, RagSource::Generic, Vec::new())
        };

        let messages = self.build_messages(&system_prompt, question)?;

        let answer = match self.complete(messages).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("chat completion failed, degrading: {}", e);
                return Ok(RagResponse {
                    answer: UNAVAILABLE_REPLY.to_string(),
                    source: RagSource::Unavailable,
                    context: Vec::new(),
                });
            }
        };

        self.push_history(question, &answer)?;

        Ok(RagResponse { answer, source, context })
    }

    /// Clear conversation history.
    pub fn clear_history(&mut self) {
        self.conversation_history.clear();
    }

    /// Assemble system prompt, prior history, and the user message.
    fn build_messages(
        &self,
        system_prompt: &str,
        question: &str,
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt.to_string())
                .build()
                .map_err(|e| AbiturError::Rag(e.to_string()))?
                .into(),
        ];
        messages.extend(self.conversation_history.iter().cloned());

        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(question.to_string())
            .build()
            .map_err(|e| AbiturError::Rag(e.to_string()))?;
        messages.push(user_message.into());

        Ok(messages)
    }

    async fn complete(&self, messages: Vec<ChatCompletionRequestMessage>) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .build()
            .map_err(|e| AbiturError::Rag(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AbiturError::OpenAI(format!("Chat API error: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .ok_or_else(|| AbiturError::Rag("Empty response from model".to_string()))
    }

    fn push_history(&mut self, question: &str, answer: &str) -> Result<()> {
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(question.to_string())
            .build()
            .map_err(|e| AbiturError::Rag(e.to_string()))?;
        self.conversation_history.push(user.into());

        let assistant = ChatCompletionRequestAssistantMessageArgs::default()
            .content(answer.to_string())
            .build()
            .map_err(|e| AbiturError::Rag(e.to_string()))?;
        self.conversation_history.push(assistant.into());

        if self.conversation_history.len() > MAX_HISTORY {
            let excess = self.conversation_history.len() - MAX_HISTORY;
            self.conversation_history.drain(..excess);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::embedding::Embedder;
    use crate::vector_store::MemoryVectorStore;
    use async_trait::async_trait;

    struct StaticEmbedder;

    #[async_trait]
    impl Embedder for StaticEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn engine() -> RagEngine {
        let settings = Settings::default();
        let prompts = Prompts::load(None, None).unwrap();
        let orchestrator = Arc::new(Orchestrator::with_components(
            settings.clone(),
            prompts,
            Arc::new(StaticEmbedder),
            Arc::new(MemoryVectorStore::new(2)),
        ));
        RagEngine::new(orchestrator, &settings)
    }

    #[test]
    fn test_build_messages_layout() {
        let engine = engine();
        let messages = engine.build_messages("системный промпт", "вопрос").unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_history_is_trimmed() {
        let mut engine = engine();
        for i in 0..30 {
            engine.push_history(&format!("q{}", i), &format!("a{}", i)).unwrap();
        }
        assert_eq!(engine.conversation_history.len(), MAX_HISTORY);
    }

    #[test]
    fn test_clear_history() {
        let mut engine = engine();
        engine.push_history("q", "a").unwrap();
        engine.clear_history();
        assert!(engine.conversation_history.is_empty());
    }
}
