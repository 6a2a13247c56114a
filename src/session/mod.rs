//! Conversation session.
//!
//! Holds the per-session routing decision and per-class chat history, and
//! mediates between the semantic router and the answering pipelines. The
//! route is a one-time transition: `Unrouted -> Routed(class)`, re-entered
//! only through `reset`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::config::Settings;
use crate::core::errors::EngineError;
use crate::index::VectorIndexStore;
use crate::llm::{ChatMessage, LlmProvider};
use crate::rag::RagPipeline;
use crate::router::{IntentClass, SemanticRouter};

const GREETING: &str = "Welcome to WriteDesk! Tell me what you are working on - \
                        a research paper or a resume - and I will connect you \
                        with the right assistant.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    Unrouted,
    Routed(IntentClass),
}

pub struct ChatSession {
    id: String,
    router: Arc<SemanticRouter>,
    store: Arc<VectorIndexStore>,
    provider: Arc<dyn LlmProvider>,
    chat_model: String,
    embedding_model: String,
    top_k: usize,
    max_history_turns: Option<usize>,
    state: RouteState,
    pipelines: HashMap<IntentClass, RagPipeline>,
    histories: HashMap<IntentClass, Vec<ChatMessage>>,
}

impl ChatSession {
    pub fn new(
        router: Arc<SemanticRouter>,
        store: Arc<VectorIndexStore>,
        provider: Arc<dyn LlmProvider>,
        settings: &Settings,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            router,
            store,
            provider,
            chat_model: settings.llm.chat_model.clone(),
            embedding_model: settings.llm.embedding_model.clone(),
            top_k: settings.index.top_k,
            max_history_turns: settings.session.max_history_turns,
            state: RouteState::Unrouted,
            pipelines: HashMap::new(),
            histories: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn route_state(&self) -> RouteState {
        self.state
    }

    /// Completed (query, answer) pairs recorded for a class.
    pub fn history_turns(&self, class: IntentClass) -> usize {
        self.histories.get(&class).map_or(0, |h| h.len() / 2)
    }

    /// Reset to a fresh session and emit the greeting.
    pub fn start(&mut self) -> String {
        self.reset();
        GREETING.to_string()
    }

    /// Discard all session state ("new chat").
    pub fn reset(&mut self) {
        self.state = RouteState::Unrouted;
        self.histories.clear();
        self.pipelines.clear();
        tracing::debug!("Session {} reset", self.id);
    }

    /// Process one utterance.
    ///
    /// The first turn classifies and pins the expert track, returning a
    /// routing announcement without calling the answering pipeline. Every
    /// later turn is answered by the pinned class's pipeline against its
    /// accumulated history. A failed turn leaves route state and history
    /// untouched.
    pub async fn turn(&mut self, utterance: &str) -> Result<String, EngineError> {
        match self.state {
            RouteState::Unrouted => {
                let class = self.router.classify(utterance).await?;
                self.state = RouteState::Routed(class);
                tracing::info!("Session {} routed to '{}'", self.id, class);
                Ok(format!(
                    "You are connected to the {} assistant. Go ahead and ask \
                     your question.",
                    class.display_name()
                ))
            }
            RouteState::Routed(class) => {
                let history = self.histories.get(&class).cloned().unwrap_or_default();

                let answer = {
                    let pipeline = self.pipeline_for(class);
                    pipeline.answer(utterance, &history).await?
                };

                let entry = self.histories.entry(class).or_default();
                entry.push(ChatMessage::user(utterance));
                entry.push(ChatMessage::assistant(answer.text.clone()));

                if let Some(max_turns) = self.max_history_turns {
                    while entry.len() > max_turns * 2 {
                        entry.drain(..2);
                    }
                }

                Ok(answer.text)
            }
        }
    }

    /// Memoizing accessor: one pipeline per resolved class, built on first
    /// use for the session lifetime.
    fn pipeline_for(&mut self, class: IntentClass) -> &RagPipeline {
        match self.pipelines.entry(class) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(RagPipeline::new(
                class,
                self.store.clone(),
                self.provider.clone(),
                self.chat_model.clone(),
                self.embedding_model.clone(),
                self.top_k,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ChunkConfig;
    use crate::llm::testing::MockProvider;
    use crate::source::testing::StaticSource;
    use tempfile::TempDir;

    /// Embedding table steering classification: the paper query lands on
    /// research, the job query on resume.
    fn routed_provider(reply: &str) -> MockProvider {
        let mut provider = MockProvider::with_reply(reply)
            .embedding("paper question", vec![1.0, 0.0])
            .embedding("job question", vec![0.0, 1.0]);
        for example in IntentClass::Research.examples() {
            provider = provider.embedding(example, vec![0.9, 0.1]);
        }
        for example in IntentClass::Resume.examples() {
            provider = provider.embedding(example, vec![0.1, 0.9]);
        }
        provider
    }

    async fn session_with(provider: Arc<MockProvider>, dir: &TempDir) -> ChatSession {
        let store = Arc::new(crate::index::VectorIndexStore::with_empty_index(
            dir.path().join("index.json"),
            ChunkConfig {
                chunk_size: 120,
                chunk_overlap: 20,
            },
            "mock-embed".to_string(),
            provider.clone(),
        ));
        store
            .refresh(&StaticSource::new(&[(
                "guide",
                "Write an outline before drafting. Cite all sources.",
            )]))
            .await
            .unwrap();

        let router = Arc::new(
            SemanticRouter::new(provider.clone(), "mock-embed".to_string())
                .await
                .unwrap(),
        );

        let settings = Settings::default();
        ChatSession::new(router, store, provider, &settings)
    }

    #[tokio::test]
    async fn first_turn_routes_without_answering() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(routed_provider("an answer"));
        let mut session = session_with(provider.clone(), &dir).await;

        assert_eq!(session.route_state(), RouteState::Unrouted);

        let reply = session.turn("paper question").await.unwrap();
        assert!(reply.contains("research paper writing"));
        assert_eq!(
            session.route_state(),
            RouteState::Routed(IntentClass::Research)
        );
        // No chat call happened: routing announces, it does not answer.
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn routing_is_pinned_for_the_session_lifetime() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(routed_provider("an answer"));
        let mut session = session_with(provider.clone(), &dir).await;

        session.turn("paper question").await.unwrap();

        // A resume-flavored utterance must not re-route a routed session.
        let reply = session.turn("job question").await.unwrap();
        assert_eq!(reply, "an answer");
        assert_eq!(
            session.route_state(),
            RouteState::Routed(IntentClass::Research)
        );
    }

    #[tokio::test]
    async fn history_grows_and_reaches_the_next_prompt() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(routed_provider("the answer"));
        let mut session = session_with(provider.clone(), &dir).await;

        session.turn("paper question").await.unwrap();

        session.turn("first question").await.unwrap();
        assert_eq!(session.history_turns(IntentClass::Research), 1);

        session.turn("second question").await.unwrap();
        assert_eq!(session.history_turns(IntentClass::Research), 2);

        // The second prompt carries the first Q/A pair and the new query.
        let request = provider.last_request().unwrap();
        let contents: Vec<&str> = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert!(contents.contains(&"first question"));
        assert!(contents.contains(&"the answer"));
        assert_eq!(*contents.last().unwrap(), "second question");
    }

    #[tokio::test]
    async fn empty_first_utterance_keeps_the_session_unrouted() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(routed_provider("an answer"));
        let mut session = session_with(provider, &dir).await;

        let err = session.turn("   ").await.unwrap_err();
        assert!(matches!(err, EngineError::EmptyInput));
        assert_eq!(session.route_state(), RouteState::Unrouted);
    }

    #[tokio::test]
    async fn failed_answer_leaves_state_and_history_intact() {
        let dir = TempDir::new().unwrap();
        let mut provider = MockProvider::failing_chat()
            .embedding("paper question", vec![1.0, 0.0]);
        for example in IntentClass::Research.examples() {
            provider = provider.embedding(example, vec![0.9, 0.1]);
        }
        for example in IntentClass::Resume.examples() {
            provider = provider.embedding(example, vec![0.1, 0.9]);
        }
        let provider = Arc::new(provider);
        let mut session = session_with(provider, &dir).await;

        session.turn("paper question").await.unwrap();

        let err = session.turn("first question").await.unwrap_err();
        assert!(matches!(err, EngineError::ModelUnavailable(_)));
        assert_eq!(
            session.route_state(),
            RouteState::Routed(IntentClass::Research)
        );
        assert_eq!(session.history_turns(IntentClass::Research), 0);
    }

    #[tokio::test]
    async fn reset_returns_to_unrouted_and_clears_history() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(routed_provider("an answer"));
        let mut session = session_with(provider, &dir).await;

        session.turn("paper question").await.unwrap();
        session.turn("first question").await.unwrap();
        assert_eq!(session.history_turns(IntentClass::Research), 1);

        let greeting = session.start();
        assert!(greeting.contains("Welcome"));
        assert_eq!(session.route_state(), RouteState::Unrouted);
        assert_eq!(session.history_turns(IntentClass::Research), 0);
    }

    #[tokio::test]
    async fn history_window_drops_the_oldest_pairs() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(routed_provider("an answer"));

        let store = Arc::new(crate::index::VectorIndexStore::with_empty_index(
            dir.path().join("index.json"),
            ChunkConfig::default(),
            "mock-embed".to_string(),
            provider.clone(),
        ));
        store
            .refresh(&StaticSource::new(&[("guide", "Reference text.")]))
            .await
            .unwrap();
        let router = Arc::new(
            SemanticRouter::new(provider.clone(), "mock-embed".to_string())
                .await
                .unwrap(),
        );

        let mut settings = Settings::default();
        settings.session.max_history_turns = Some(1);
        let mut session = ChatSession::new(router, store, provider.clone(), &settings);

        session.turn("paper question").await.unwrap();
        session.turn("first question").await.unwrap();
        session.turn("second question").await.unwrap();
        assert_eq!(session.history_turns(IntentClass::Research), 1);

        // The windowed history no longer carries the first question.
        session.turn("third question").await.unwrap();
        let request = provider.last_request().unwrap();
        let contents: Vec<&str> = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert!(!contents.contains(&"first question"));
        assert!(contents.contains(&"second question"));
    }
}
