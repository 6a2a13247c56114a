//! Prompt composition for the answering pipeline.
//!
//! A prompt is: the intent class's system instruction carrying the
//! retrieved reference context (or an explicit no-context marker), the
//! prior conversation turns, then the new query.

use crate::llm::ChatMessage;
use crate::router::IntentClass;

/// Inserted in place of retrieved context when retrieval comes back empty,
/// so the model knows it is answering without references.
pub const NO_CONTEXT_MARKER: &str =
    "No reference context was found for this question. Answer from general \
     knowledge and say that no reference material was available.";

pub fn build_messages(
    intent: IntentClass,
    history: &[ChatMessage],
    context: Option<&str>,
    query: &str,
) -> Vec<ChatMessage> {
    let context_block = match context {
        Some(context) => format!("Context:\n{}", context),
        None => NO_CONTEXT_MARKER.to_string(),
    };

    let system = format!("{}\n\n{}", intent.system_instruction(), context_block);

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(query));
    messages
}

/// Formats retrieval hits into a numbered context block with source
/// citations.
pub fn format_context(hits: &[crate::index::ScoredChunk]) -> String {
    let mut context = String::new();

    for (i, hit) in hits.iter().enumerate() {
        context.push_str(&format!(
            "[{}] (Source: {})\n{}\n\n",
            i + 1,
            hit.chunk.source,
            hit.chunk.text
        ));
    }

    context.trim_end().to_string()
}
