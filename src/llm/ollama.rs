use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::errors::EngineError;

#[derive(Clone)]
pub struct OllamaProvider {
    base_url: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool, EngineError> {
        let url = format!("{}/api/tags", self.base_url);
        let res = self.client.get(&url).send().await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, EngineError> {
        let url = format!("{}/api/chat", self.base_url);

        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            let mut options = serde_json::Map::new();
            if let Some(t) = request.temperature {
                options.insert("temperature".to_string(), json!(t));
            }
            if let Some(n) = request.max_tokens {
                options.insert("num_predict".to_string(), json!(n));
            }
            if !options.is_empty() {
                obj.insert("options".to_string(), Value::Object(options));
            }
        }

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::ModelUnavailable(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(EngineError::ModelUnavailable(format!(
                "ollama chat error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(EngineError::internal)?;
        Ok(extract_chat_content(&payload))
    }

    async fn embed(
        &self,
        inputs: &[String],
        model_id: &str,
    ) -> Result<Vec<Vec<f32>>, EngineError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);

        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::ModelUnavailable(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(EngineError::ModelUnavailable(format!(
                "ollama embed error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(EngineError::internal)?;
        let embeddings = extract_embeddings(&payload);

        if embeddings.len() != inputs.len() {
            return Err(EngineError::Internal(format!(
                "embedding count mismatch: {} inputs, {} vectors",
                inputs.len(),
                embeddings.len()
            )));
        }

        Ok(embeddings)
    }
}

fn extract_chat_content(payload: &Value) -> String {
    payload["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

fn extract_embeddings(payload: &Value) -> Vec<Vec<f32>> {
    let mut embeddings = Vec::new();
    if let Some(data) = payload["embeddings"].as_array() {
        for item in data {
            if let Some(vals) = item.as_array() {
                let vec: Vec<f32> = vals
                    .iter()
                    .filter_map(|v| v.as_f64().map(|f| f as f32))
                    .collect();
                embeddings.push(vec);
            }
        }
    }
    embeddings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_payload() {
        let payload = json!({
            "model": "llama3",
            "message": { "role": "assistant", "content": "Hello there." },
            "done": true
        });
        assert_eq!(extract_chat_content(&payload), "Hello there.");
    }

    #[test]
    fn parses_embed_payload() {
        let payload = json!({
            "model": "nomic-embed-text",
            "embeddings": [[0.1, 0.2], [0.3, 0.4]]
        });
        let embeddings = extract_embeddings(&payload);
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].len(), 2);
        assert!((embeddings[1][1] - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    #[ignore]
    async fn live_ollama_roundtrip() {
        use crate::llm::types::ChatMessage;

        let provider = OllamaProvider::new("http://localhost:11434".to_string());
        if !provider.health_check().await.unwrap_or(false) {
            panic!("Ollama not reachable on localhost:11434");
        }

        let req = ChatRequest::new(vec![ChatMessage::user("Say hello in one word.")]);
        let reply = provider.chat(req, "llama3").await.unwrap();
        println!("Ollama reply: {}", reply);

        let vectors = provider
            .embed(&["hello".to_string()], "nomic-embed-text")
            .await
            .unwrap();
        assert_eq!(vectors.len(), 1);
        assert!(!vectors[0].is_empty());
    }
}
