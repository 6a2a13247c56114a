use std::io::Write as _;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncBufReadExt;

use writedesk::core::config::{AppPaths, Settings};
use writedesk::core::logging;
use writedesk::index::{ChunkConfig, VectorIndexStore};
use writedesk::llm::{LlmProvider, OllamaProvider};
use writedesk::router::SemanticRouter;
use writedesk::session::ChatSession;
use writedesk::source::WebDocumentSource;
use writedesk::EngineError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = AppPaths::new();
    logging::init(&paths);

    let settings = Settings::load(&paths).context("Failed to load settings")?;

    let provider: Arc<dyn LlmProvider> =
        Arc::new(OllamaProvider::new(settings.llm.base_url.clone()));
    if !provider.health_check().await.unwrap_or(false) {
        tracing::warn!(
            "LLM backend not reachable at {} (answers will fail until it is up)",
            settings.llm.base_url
        );
    }

    let source = WebDocumentSource::new(
        settings.sources.urls.clone(),
        settings.sources.fetch_timeout_secs,
    )?;

    let chunk_config = ChunkConfig {
        chunk_size: settings.index.chunk_size,
        chunk_overlap: settings.index.chunk_overlap,
    };

    let store = match VectorIndexStore::open(
        paths.index_path.clone(),
        chunk_config.clone(),
        settings.llm.embedding_model.clone(),
        provider.clone(),
        &source,
    )
    .await
    {
        Ok(store) => Arc::new(store),
        Err(err @ EngineError::IndexCorrupt(_)) => {
            tracing::warn!("{}; rebuilding from source", err);
            let store = VectorIndexStore::with_empty_index(
                paths.index_path.clone(),
                chunk_config,
                settings.llm.embedding_model.clone(),
                provider.clone(),
            );
            store
                .refresh(&source)
                .await
                .context("Failed to rebuild index")?;
            Arc::new(store)
        }
        Err(err) => return Err(err).context("Failed to open vector index"),
    };

    let router = Arc::new(
        SemanticRouter::new(provider.clone(), settings.llm.embedding_model.clone())
            .await
            .context("Failed to build semantic router")?,
    );

    let mut session = ChatSession::new(router, store.clone(), provider, &settings);

    println!("{}", session.start());
    println!("Commands: 'refresh' rebuilds the index, 'new' starts a new chat, 'exit' quits.\n");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" => break,
            "refresh" => {
                println!("Rebuilding index...");
                match store.refresh(&source).await {
                    Ok(count) => println!("Done: {} chunks indexed.\n", count),
                    Err(err) => eprintln!("Refresh failed: {}\n", err),
                }
            }
            "new" => {
                println!("{}\n", session.start());
            }
            _ => match session.turn(input).await {
                Ok(reply) => println!("Bot: {}\n", reply),
                Err(err) => {
                    tracing::error!("Turn failed: {}", err);
                    eprintln!("Bot: Sorry, that did not work: {}\n", err);
                }
            },
        }
    }

    Ok(())
}
