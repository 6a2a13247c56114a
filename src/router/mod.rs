//! Semantic intent router.
//!
//! Classifies the first utterance of a session against per-class example
//! corpora by embedding similarity. Construction embeds every example
//! exactly once; classification embeds only the incoming utterance.

mod corpus;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::errors::EngineError;
use crate::llm::LlmProvider;

/// A routing category with a fixed example corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentClass {
    Research,
    Resume,
}

impl IntentClass {
    /// Tie-break order for equal mean similarity: earlier wins.
    pub const PRIORITY_ORDER: [IntentClass; 2] = [IntentClass::Research, IntentClass::Resume];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentClass::Research => "research",
            IntentClass::Resume => "resume",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            IntentClass::Research => "research paper writing",
            IntentClass::Resume => "resume and CV writing",
        }
    }

    pub fn examples(&self) -> &'static [&'static str] {
        match self {
            IntentClass::Research => corpus::RESEARCH_EXAMPLES,
            IntentClass::Resume => corpus::RESUME_EXAMPLES,
        }
    }

    /// System instruction for this class's answering pipeline.
    pub fn system_instruction(&self) -> &'static str {
        match self {
            IntentClass::Research => {
                "You are a university writing support assistant specialized in \
                 academic research papers. Help the student plan, structure, \
                 draft and revise their paper: outlines, section contents, \
                 citation and formatting conventions, and academic tone. \
                 Answer the question using the provided context. Always answer \
                 in the same language that the user used."
            }
            IntentClass::Resume => {
                "You are a university writing support assistant specialized in \
                 resumes and CVs. Help the student present their education, \
                 experience and skills effectively for internships and job \
                 applications. Answer the question using the provided context. \
                 Always answer in the same language that the user used."
            }
        }
    }
}

impl std::fmt::Display for IntentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct ClassCorpus {
    class: IntentClass,
    embeddings: Vec<Vec<f32>>,
}

/// Embeds each class's examples once and scores utterances against them.
pub struct SemanticRouter {
    provider: Arc<dyn LlmProvider>,
    embedding_model: String,
    corpora: Vec<ClassCorpus>,
}

impl SemanticRouter {
    /// Build the router, embedding every example utterance of every class.
    /// This is the expensive step; it runs once per router lifetime.
    pub async fn new(
        provider: Arc<dyn LlmProvider>,
        embedding_model: String,
    ) -> Result<Self, EngineError> {
        let mut corpora = Vec::with_capacity(IntentClass::PRIORITY_ORDER.len());

        for class in IntentClass::PRIORITY_ORDER {
            let examples: Vec<String> =
                class.examples().iter().map(|s| s.to_string()).collect();
            let embeddings = provider.embed(&examples, &embedding_model).await?;

            if embeddings.len() != examples.len() {
                return Err(EngineError::Internal(format!(
                    "embedding count mismatch for class '{}': {} examples, {} vectors",
                    class,
                    examples.len(),
                    embeddings.len()
                )));
            }

            tracing::debug!("Embedded {} examples for class '{}'", embeddings.len(), class);
            corpora.push(ClassCorpus { class, embeddings });
        }

        Ok(Self {
            provider,
            embedding_model,
            corpora,
        })
    }

    /// Classify one utterance.
    ///
    /// Scores are the MEAN cosine similarity against each class's examples,
    /// not the max: one strong outlier example must not capture the route.
    /// Equal means resolve by `IntentClass::PRIORITY_ORDER`.
    pub async fn classify(&self, utterance: &str) -> Result<IntentClass, EngineError> {
        let trimmed = utterance.trim();
        if trimmed.is_empty() {
            return Err(EngineError::EmptyInput);
        }

        let query = self
            .provider
            .embed(&[trimmed.to_string()], &self.embedding_model)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                EngineError::Internal("embedding backend returned no vector".to_string())
            })?;

        let mut best: Option<(IntentClass, f32)> = None;

        for corpus in &self.corpora {
            let score = mean_similarity(&query, &corpus.embeddings);
            tracing::debug!("Class '{}' mean similarity: {:.4}", corpus.class, score);

            // Strictly greater keeps the earlier (higher-priority) class on ties.
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((corpus.class, score)),
            }
        }

        let (class, score) =
            best.ok_or_else(|| EngineError::Internal("router has no classes".to_string()))?;
        tracing::info!("Classified utterance as '{}' (mean {:.4})", class, score);
        Ok(class)
    }
}

fn mean_similarity(query: &[f32], examples: &[Vec<f32>]) -> f32 {
    if examples.is_empty() {
        return 0.0;
    }

    let total: f32 = examples
        .iter()
        .map(|example| cosine_similarity(query, example))
        .sum();
    total / examples.len() as f32
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
