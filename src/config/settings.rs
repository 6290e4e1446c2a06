//! Configuration settings for EduAI.

use crate::error::{EduError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub canvas: CanvasSettings,
    pub dataset: DatasetSettings,
    pub embedding: EmbeddingSettings,
    pub chat: ChatSettings,
    pub time: TimeSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error) used when no `-v` flag is given.
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.eduai".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Canvas LMS access settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    /// Base URL of the Canvas instance.
    pub api_url: String,
    /// Personal access token. `CANVAS_API_KEY` takes precedence.
    pub api_key: Option<String>,
    /// Courses starting before this instant are not collected (RFC 3339).
    pub cutoff_date: String,
    /// Page size requested from paginated endpoints.
    pub per_page: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            api_url: "https://canvas.instructure.com".to_string(),
            api_key: None,
            cutoff_date: "2025-01-01T00:00:00Z".to_string(),
            per_page: 100,
            timeout_secs: 60,
        }
    }
}

impl CanvasSettings {
    /// Environment variable holding the Canvas access token.
    pub const API_KEY_ENV: &'static str = "CANVAS_API_KEY";

    /// The access token from the environment or the config file.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(Self::API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    /// Parse the configured cutoff.
    pub fn cutoff(&self) -> Result<DateTime<Utc>> {
        parse_cutoff(&self.cutoff_date)
    }
}

/// Parse an RFC 3339 cutoff date.
pub fn parse_cutoff(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| EduError::Config(format!("Invalid cutoff date '{}': {}", raw, e)))
}

/// Location of the persisted dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSettings {
    pub path: String,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: "~/.eduai/my_canvas_data.json".to_string(),
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local sentence-transformer model via fastembed.
    #[default]
    Local,
    /// OpenAI embeddings API.
    OpenAI,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "fastembed" => Ok(EmbeddingProvider::Local),
            "openai" => Ok(EmbeddingProvider::OpenAI),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::Local => write!(f, "local"),
            EmbeddingProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (local, openai).
    pub provider: EmbeddingProvider,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Base URL of an OpenAI-compatible embeddings API. `None` uses OpenAI itself.
    pub api_base: Option<String>,
    /// Environment variable holding the embeddings API key.
    pub api_key_env: String,
    /// Timeout for one embeddings request, in seconds.
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Local,
            model: "all-minilm-l6-v2".to_string(),
            dimensions: 384,
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

impl EmbeddingSettings {
    /// The API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

/// Generative model and conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Model name passed to the chat-completions endpoint.
    pub model: String,
    /// Base URL of an OpenAI-compatible API. `None` uses OpenAI itself.
    pub api_base: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Number of documents retrieved per message.
    pub max_context_docs: usize,
    /// Per-session transcript bound in characters.
    pub history_max_chars: usize,
    pub temperature: f32,
    /// Timeout for one generation request, in seconds.
    pub timeout_secs: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            api_base: Some("https://generativelanguage.googleapis.com/v1beta/openai".to_string()),
            api_key_env: "GEMINI_API_KEY".to_string(),
            max_context_docs: 10,
            history_max_chars: 10_000,
            temperature: 0.7,
            timeout_secs: 300,
        }
    }
}

impl ChatSettings {
    /// The API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

/// Timezone used for due dates and the prompt clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSettings {
    /// IANA timezone name.
    pub timezone: String,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| EduError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eduai")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded dataset file path.
    pub fn dataset_path(&self) -> PathBuf {
        Self::expand_path(&self.dataset.path)
    }

    /// Parse the configured timezone.
    pub fn timezone(&self) -> Result<chrono_tz::Tz> {
        crate::timefmt::parse_timezone(&self.time.timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.chat.max_context_docs, 10);
        assert_eq!(settings.chat.history_max_chars, 10_000);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::Local);
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.general.log_level, "warn");
        assert_eq!(settings.time.timezone, "America/New_York");
        assert!(settings.timezone().is_ok());
        assert_eq!(
            settings.canvas.cutoff().unwrap(),
            "2025-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [chat]
            model = "gpt-4o-mini"

            [embedding]
            provider = "openai"
            model = "text-embedding-3-small"
            dimensions = 1536
            "#,
        )
        .unwrap();

        assert_eq!(settings.chat.model, "gpt-4o-mini");
        assert_eq!(settings.chat.max_context_docs, 10);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::OpenAI);
        assert_eq!(settings.embedding.api_base, None);
        assert_eq!(settings.embedding.api_key_env, "OPENAI_API_KEY");
        assert_eq!(settings.embedding.timeout_secs, 60);
        assert_eq!(settings.canvas.per_page, 100);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.server.port = 8080;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 8080);
    }

    #[test]
    fn test_invalid_cutoff() {
        assert!(matches!(parse_cutoff("last year"), Err(EduError::Config(_))));
    }

    #[test]
    fn test_embedding_provider_from_str() {
        let openai = "openai".parse::<EmbeddingProvider>().unwrap();
        assert_eq!(openai, EmbeddingProvider::OpenAI);
        let local = "FastEmbed".parse::<EmbeddingProvider>().unwrap();
        assert_eq!(local, EmbeddingProvider::Local);
        assert!("cohere".parse::<EmbeddingProvider>().is_err());
    }
}
