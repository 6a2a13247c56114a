//! Document source adapter.
//!
//! Fetches and normalizes raw text for indexing. Per-document failures
//! degrade to an empty document (skipped downstream), never aborting the
//! whole ingestion run.

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::core::errors::EngineError;

/// A fetched reference document, prior to chunking.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Normalized plain text.
    pub text: String,
    /// Source identifier (URL).
    pub origin: String,
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch every configured document. A document that cannot be fetched
    /// comes back with empty text.
    async fn fetch_all(&self) -> Vec<RawDocument>;
}

/// Scrapes a fixed list of reference pages.
pub struct WebDocumentSource {
    client: reqwest::Client,
    urls: Vec<String>,
}

impl WebDocumentSource {
    pub fn new(urls: Vec<String>, fetch_timeout_secs: u64) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("writedesk/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(fetch_timeout_secs))
            .build()
            .map_err(EngineError::internal)?;

        Ok(Self { client, urls })
    }

    async fn fetch_page(&self, url: &str) -> Result<String, EngineError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(EngineError::internal)?;

        if !response.status().is_success() {
            return Err(EngineError::Internal(format!(
                "fetch {} failed: {}",
                url,
                response.status()
            )));
        }

        let html = response.text().await.map_err(EngineError::internal)?;
        Ok(extract_text(&html))
    }
}

#[async_trait]
impl DocumentSource for WebDocumentSource {
    async fn fetch_all(&self) -> Vec<RawDocument> {
        let mut documents = Vec::with_capacity(self.urls.len());

        for url in &self.urls {
            match self.fetch_page(url).await {
                Ok(text) => {
                    tracing::info!("Fetched {} ({} chars)", url, text.chars().count());
                    documents.push(RawDocument {
                        text,
                        origin: url.clone(),
                    });
                }
                Err(err) => {
                    tracing::warn!("Skipping {}: {}", url, err);
                    documents.push(RawDocument {
                        text: String::new(),
                        origin: url.clone(),
                    });
                }
            }
        }

        documents
    }
}

/// Extracts readable text from an HTML page, preferring the main content
/// region and falling back to the whole body.
fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let selectors = ["article", "main", "[role=main]", "#content", "body"];
    for selector_str in selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = element_text(&element);
                if text.chars().count() > 100 || selector_str == "body" {
                    return text;
                }
            }
        }
    }

    String::new()
}

fn element_text(element: &scraper::ElementRef) -> String {
    let mut text = String::new();
    for node in element.text() {
        let trimmed = node.trim();
        if !trimmed.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(trimmed);
        }
    }
    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    if let Ok(re) = regex::Regex::new(r"\s+") {
        re.replace_all(text, " ").trim().to_string()
    } else {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_main_content_over_navigation() {
        let html = r#"
            <html>
                <body>
                    <nav>Navigation menu</nav>
                    <article>
                        The writing center offers one-on-one tutoring for
                        research papers, theses, and dissertations across all
                        disciplines and degree levels.
                    </article>
                    <footer>Footer content</footer>
                </body>
            </html>
        "#;
        let text = extract_text(html);
        assert!(text.contains("one-on-one tutoring"));
        assert!(!text.contains("Navigation menu"));
    }

    #[test]
    fn falls_back_to_body_for_short_pages() {
        let html = "<html><body><p>Short page.</p></body></html>";
        let text = extract_text(html);
        assert_eq!(text, "Short page.");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(collapse_whitespace("a \n\t b   c "), "a b c");
    }

    #[tokio::test]
    async fn static_source_returns_configured_documents() {
        let source = testing::StaticSource::new(&[("doc-a", "alpha"), ("doc-b", "beta")]);
        let docs = source.fetch_all().await;
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].origin, "doc-a");
        assert_eq!(docs[1].text, "beta");
    }
}
