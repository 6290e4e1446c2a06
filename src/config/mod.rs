//! Configuration module for EduAI.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, Prompts};
pub use settings::{
    parse_cutoff, CanvasSettings, ChatSettings, DatasetSettings, EmbeddingProvider,
    EmbeddingSettings, GeneralSettings, PromptSettings, ServerSettings, Settings, TimeSettings,
};
