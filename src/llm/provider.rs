use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::EngineError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "ollama")
    fn name(&self) -> &str;

    /// check if the backend is healthy/reachable
    async fn health_check(&self) -> Result<bool, EngineError>;

    /// chat completion (non-streaming); returns the model output verbatim
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, EngineError>;

    /// generate embeddings, one fixed-dimension vector per input, in order
    async fn embed(&self, inputs: &[String], model_id: &str)
        -> Result<Vec<Vec<f32>>, EngineError>;
}
