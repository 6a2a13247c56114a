//! In-process test double for the LLM/embedding backend.
//!
//! Embeddings are looked up from an explicit table (exact text match) and
//! fall back to a deterministic byte-histogram vector, so chunking and
//! retrieval tests stay reproducible without a live backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::errors::EngineError;

pub(crate) struct MockProvider {
    embeddings: HashMap<String, Vec<f32>>,
    reply: String,
    fail_chat: bool,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            embeddings: HashMap::new(),
            reply: "mock answer".to_string(),
            fail_chat: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(reply: &str) -> Self {
        let mut provider = Self::new();
        provider.reply = reply.to_string();
        provider
    }

    pub fn failing_chat() -> Self {
        let mut provider = Self::new();
        provider.fail_chat = true;
        provider
    }

    pub fn embedding(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.embeddings.insert(text.to_string(), vector);
        self
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(vector) = self.embeddings.get(text) {
            return vector.clone();
        }

        // Deterministic fallback: 4-bin byte histogram, L2-normalized.
        let mut vector = vec![0.0f32; 4];
        for (i, byte) in text.bytes().enumerate() {
            vector[(byte as usize + i) % 4] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn health_check(&self) -> Result<bool, EngineError> {
        Ok(true)
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, EngineError> {
        self.requests.lock().unwrap().push(request);
        if self.fail_chat {
            return Err(EngineError::ModelUnavailable(
                "mock backend is down".to_string(),
            ));
        }
        Ok(self.reply.clone())
    }

    async fn embed(
        &self,
        inputs: &[String],
        _model_id: &str,
    ) -> Result<Vec<Vec<f32>>, EngineError> {
        Ok(inputs.iter().map(|text| self.vector_for(text)).collect())
    }
}
