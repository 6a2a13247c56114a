//! Retrieval-augmented answering pipeline.
//!
//! One pipeline instance is bound to one intent class. Each call embeds the
//! query, retrieves the top-k chunks from the index store snapshot, and asks
//! the chat backend with the class instruction, the prior turns and the
//! retrieved context.

use std::sync::Arc;

use super::prompt::{build_messages, format_context};
use crate::core::errors::EngineError;
use crate::index::VectorIndexStore;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::router::IntentClass;

/// A grounded answer. `context_found` is false when retrieval came back
/// empty and the model answered in degraded mode.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub text: String,
    pub context_found: bool,
}

pub struct RagPipeline {
    intent: IntentClass,
    store: Arc<VectorIndexStore>,
    provider: Arc<dyn LlmProvider>,
    chat_model: String,
    embedding_model: String,
    top_k: usize,
}

impl RagPipeline {
    pub fn new(
        intent: IntentClass,
        store: Arc<VectorIndexStore>,
        provider: Arc<dyn LlmProvider>,
        chat_model: String,
        embedding_model: String,
        top_k: usize,
    ) -> Self {
        Self {
            intent,
            store,
            provider,
            chat_model,
            embedding_model,
            top_k,
        }
    }

    pub fn intent(&self) -> IntentClass {
        self.intent
    }

    /// Answer one query against the accumulated history.
    ///
    /// The model output is returned verbatim. Empty retrieval degrades to a
    /// no-context prompt instead of failing; backend errors propagate
    /// unrecovered.
    pub async fn answer(
        &self,
        query: &str,
        history: &[ChatMessage],
    ) -> Result<RagAnswer, EngineError> {
        let query_embedding = self
            .provider
            .embed(&[query.to_string()], &self.embedding_model)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                EngineError::Internal("embedding backend returned no vector".to_string())
            })?;

        let hits = self.store.retrieve(&query_embedding, self.top_k).await?;
        let context_found = !hits.is_empty();

        let context = if context_found {
            Some(format_context(&hits))
        } else {
            tracing::warn!(
                "Retrieval returned no chunks for intent '{}', answering without context",
                self.intent
            );
            None
        };

        let messages = build_messages(self.intent, history, context.as_deref(), query);
        let text = self
            .provider
            .chat(ChatRequest::new(messages), &self.chat_model)
            .await?;

        Ok(RagAnswer {
            text,
            context_found,
        })
    }
}
