//! Vector index store.
//!
//! Owns chunking, embedding, persistence and reload of the similarity
//! index. The persisted form is a single JSON bundle replaced atomically
//! (write-to-temp-then-rename), so a concurrent reader never observes a
//! partially written index. In-memory, readers work against an `Arc`
//! snapshot while `refresh` swaps in a rebuilt index.

use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::chunker::{split_document, Chunk, ChunkConfig};
use crate::core::errors::EngineError;
use crate::llm::LlmProvider;
use crate::source::{DocumentSource, RawDocument};

/// Chunks retrieved per query when the caller does not override it.
pub const DEFAULT_TOP_K: usize = 4;

const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// An immutable similarity-searchable index over (chunk, vector) pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    pub format_version: u32,
    pub embedding_model: String,
    pub chunk_config: ChunkConfig,
    pub built_at: DateTime<Utc>,
    pub entries: Vec<IndexEntry>,
}

/// A retrieval hit.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

impl VectorIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-k entries by cosine similarity, descending. Ties keep ingestion
    /// order (stable sort). Returns fewer than k results when the index
    /// holds fewer chunks; `k == 0` is a caller contract violation.
    pub fn retrieve(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, EngineError> {
        if k == 0 {
            return Err(EngineError::InvalidArgument(
                "retrieve requires k >= 1".to_string(),
            ));
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(scored)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

/// Builds, persists, reloads and serves the vector index.
pub struct VectorIndexStore {
    index_path: PathBuf,
    chunk_config: ChunkConfig,
    embedding_model: String,
    provider: Arc<dyn LlmProvider>,
    current: RwLock<Arc<VectorIndex>>,
}

impl VectorIndexStore {
    /// Open the store: reuse the persisted index when present, otherwise
    /// build one from the live source and persist it. A corrupt persisted
    /// index is surfaced to the caller, who recovers by forcing `refresh`.
    pub async fn open(
        index_path: PathBuf,
        chunk_config: ChunkConfig,
        embedding_model: String,
        provider: Arc<dyn LlmProvider>,
        source: &dyn DocumentSource,
    ) -> Result<Self, EngineError> {
        let store = Self::with_empty_index(index_path, chunk_config, embedding_model, provider);

        match store.load() {
            Ok(index) => {
                tracing::info!(
                    "Loaded persisted index: {} chunks (built {})",
                    index.len(),
                    index.built_at
                );
                *store.current.write().await = Arc::new(index);
            }
            Err(EngineError::IndexNotFound(_)) => {
                tracing::info!("No persisted index, building from source");
                store.refresh(source).await?;
            }
            Err(err) => return Err(err),
        }

        Ok(store)
    }

    /// A store with an empty in-memory index and nothing persisted yet.
    pub fn with_empty_index(
        index_path: PathBuf,
        chunk_config: ChunkConfig,
        embedding_model: String,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        let empty = VectorIndex {
            format_version: INDEX_FORMAT_VERSION,
            embedding_model: embedding_model.clone(),
            chunk_config: chunk_config.clone(),
            built_at: Utc::now(),
            entries: Vec::new(),
        };

        Self {
            index_path,
            chunk_config,
            embedding_model,
            provider,
            current: RwLock::new(Arc::new(empty)),
        }
    }

    /// Chunk and embed every document into a fresh index. Empty documents
    /// are skipped (logged as ingestion failures), never fatal.
    pub async fn build(&self, documents: &[RawDocument]) -> Result<VectorIndex, EngineError> {
        let mut chunks: Vec<Chunk> = Vec::new();

        for doc in documents {
            if doc.text.trim().is_empty() {
                let err = EngineError::Ingestion(format!("empty document from {}", doc.origin));
                tracing::warn!("{}, skipping", err);
                continue;
            }
            chunks.extend(split_document(&doc.text, &doc.origin, &self.chunk_config));
        }

        let mut entries = Vec::with_capacity(chunks.len());

        if !chunks.is_empty() {
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.provider.embed(&texts, &self.embedding_model).await?;

            if embeddings.len() != chunks.len() {
                return Err(EngineError::Internal(format!(
                    "embedding count mismatch: {} chunks, {} vectors",
                    chunks.len(),
                    embeddings.len()
                )));
            }

            let dim = embeddings[0].len();
            if embeddings.iter().any(|e| e.len() != dim) {
                return Err(EngineError::Internal(
                    "embedding backend returned mixed dimensions".to_string(),
                ));
            }

            entries = chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
                .collect();
        }

        Ok(VectorIndex {
            format_version: INDEX_FORMAT_VERSION,
            embedding_model: self.embedding_model.clone(),
            chunk_config: self.chunk_config.clone(),
            built_at: Utc::now(),
            entries,
        })
    }

    /// Serialize the index to the well-known location. Writes to a temp
    /// file in the same directory, then renames over the target.
    pub fn persist(&self, index: &VectorIndex) -> Result<(), EngineError> {
        if let Some(parent) = self.index_path.parent() {
            fs::create_dir_all(parent).map_err(EngineError::internal)?;
        }

        let tmp_path = self
            .index_path
            .with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        let bytes = serde_json::to_vec(index).map_err(EngineError::internal)?;

        fs::write(&tmp_path, bytes).map_err(EngineError::internal)?;
        fs::rename(&tmp_path, &self.index_path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            EngineError::internal(e)
        })?;

        Ok(())
    }

    /// Deserialize the persisted index.
    pub fn load(&self) -> Result<VectorIndex, EngineError> {
        if !self.index_path.exists() {
            return Err(EngineError::IndexNotFound(
                self.index_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.index_path).map_err(EngineError::internal)?;
        let index: VectorIndex = serde_json::from_str(&contents)
            .map_err(|e| EngineError::IndexCorrupt(e.to_string()))?;

        self.validate_loaded(index)
    }

    fn validate_loaded(&self, index: VectorIndex) -> Result<VectorIndex, EngineError> {
        if index.format_version != INDEX_FORMAT_VERSION {
            return Err(EngineError::IndexCorrupt(format!(
                "unsupported format version {}",
                index.format_version
            )));
        }

        if index.embedding_model != self.embedding_model {
            return Err(EngineError::IndexCorrupt(format!(
                "index built with embedding model '{}' but '{}' is configured; refresh required",
                index.embedding_model, self.embedding_model
            )));
        }

        if let Some(first) = index.entries.first() {
            let dim = first.embedding.len();
            if index.entries.iter().any(|e| e.embedding.len() != dim) {
                return Err(EngineError::IndexCorrupt(
                    "stored vectors have inconsistent dimensions".to_string(),
                ));
            }
        }

        Ok(index)
    }

    /// The current in-memory index. Callers hold the returned `Arc` as a
    /// stable snapshot for the duration of one retrieval.
    pub async fn snapshot(&self) -> Arc<VectorIndex> {
        self.current.read().await.clone()
    }

    pub async fn retrieve(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, EngineError> {
        let snapshot = self.snapshot().await;
        snapshot.retrieve(query_embedding, k)
    }

    /// Rebuild from the live source, persist atomically, then swap the
    /// in-memory snapshot. In-flight retrievals finish against the old
    /// snapshot. Returns the new chunk count.
    pub async fn refresh(&self, source: &dyn DocumentSource) -> Result<usize, EngineError> {
        let documents = source.fetch_all().await;
        let index = self.build(&documents).await?;
        let count = index.len();

        self.persist(&index)?;
        *self.current.write().await = Arc::new(index);

        tracing::info!("Index refreshed: {} chunks", count);
        Ok(count)
    }

    pub fn chunk_config(&self) -> &ChunkConfig {
        &self.chunk_config
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}
