use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::AppPaths;
use crate::core::errors::EngineError;

/// Document source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Pages scraped into the reference index.
    #[serde(default = "default_urls")]
    pub urls: Vec<String>,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

/// Chunking and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Maximum chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overlap between neighboring chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Language/embedding backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

/// Conversation session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Sliding window over (query, answer) pairs per expert track.
    /// `None` keeps the full history for the session lifetime.
    #[serde(default)]
    pub max_history_turns: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub sources: SourceSettings,
    #[serde(default)]
    pub index: IndexSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            urls: default_urls(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_history_turns: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sources: SourceSettings::default(),
            index: IndexSettings::default(),
            llm: LlmSettings::default(),
            session: SessionSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the resolved config path, falling back to defaults
    /// when no config file exists.
    pub fn load(paths: &AppPaths) -> Result<Self, EngineError> {
        let path = config_path(paths);
        if !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            let settings = Settings::default();
            settings.validate()?;
            return Ok(settings);
        }

        let contents = fs::read_to_string(&path).map_err(EngineError::internal)?;
        let settings: Settings = serde_yaml::from_str(&contents)
            .map_err(|e| EngineError::InvalidArgument(format!("config {:?}: {}", path, e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.index.chunk_size == 0 {
            return Err(EngineError::InvalidArgument(
                "index.chunk_size must be >= 1".to_string(),
            ));
        }
        if self.index.chunk_overlap >= self.index.chunk_size {
            return Err(EngineError::InvalidArgument(format!(
                "index.chunk_overlap ({}) must be smaller than index.chunk_size ({})",
                self.index.chunk_overlap, self.index.chunk_size
            )));
        }
        if self.index.top_k == 0 {
            return Err(EngineError::InvalidArgument(
                "index.top_k must be >= 1".to_string(),
            ));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(EngineError::InvalidArgument(
                "llm.base_url must not be empty".to_string(),
            ));
        }
        if let Some(0) = self.session.max_history_turns {
            return Err(EngineError::InvalidArgument(
                "session.max_history_turns must be >= 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

fn config_path(paths: &AppPaths) -> PathBuf {
    if let Ok(path) = env::var("WRITEDESK_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    let user_config = paths.user_data_dir.join("config.yml");
    if user_config.exists() {
        return user_config;
    }

    paths.project_root.join("config.yml")
}

fn default_urls() -> Vec<String> {
    [
        "https://tutoring.asu.edu/writing-centers",
        "https://tutoring.asu.edu/graduate-writing-centers",
        "https://tutoring.asu.edu/expanded-writing-support",
        "https://libguides.asu.edu/designresources/citing",
        "https://libguides.asu.edu/c.php?g=264286&p=1763856",
        "https://libguides.asu.edu/c.php?g=263905&p=6112359",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_chunk_size() -> usize {
    400
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_top_k() -> usize {
    4
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_chat_model() -> String {
    "llama3".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.index.chunk_size, 400);
        assert_eq!(settings.index.chunk_overlap, 50);
        assert_eq!(settings.index.top_k, 4);
        assert!(settings.session.max_history_turns.is_none());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        let mut settings = Settings::default();
        settings.index.chunk_overlap = settings.index.chunk_size;
        assert!(matches!(
            settings.validate(),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_zero_top_k() {
        let mut settings = Settings::default();
        settings.index.top_k = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn parses_partial_yaml_with_defaults() {
        let yaml = "index:\n  chunk_size: 800\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.index.chunk_size, 800);
        assert_eq!(settings.index.chunk_overlap, 50);
        assert_eq!(settings.llm.chat_model, "llama3");
    }
}
