//! Error types for EduAI.

use thiserror::Error;

/// Library-level error type for EduAI operations.
#[derive(Error, Debug)]
pub enum EduError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Canvas API error: {0}")]
    Canvas(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    VectorStore(String),

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for EduAI operations.
pub type Result<T> = std::result::Result<T, EduError>;
