//! Pre-flight checks before expensive operations.
//!
//! Validates that required keys and files are available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{EduError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching requires a Canvas access token.
    Fetch,
    /// Chatting requires the dataset and a model API key.
    Chat,
    /// Search requires the dataset.
    Search,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Fetch => check_canvas_key(settings)?,
        Operation::Chat => {
            check_dataset(settings)?;
            check_chat_key(settings)?;
        }
        Operation::Search => check_dataset(settings)?,
    }
    Ok(())
}

fn check_canvas_key(settings: &Settings) -> Result<()> {
    if settings.canvas.resolve_api_key().is_some() {
        return Ok(());
    }
    Err(EduError::Config(format!(
        "{} not set. Create a token under Canvas > Account > Settings and run: export {}='...'",
        crate::config::CanvasSettings::API_KEY_ENV,
        crate::config::CanvasSettings::API_KEY_ENV
    )))
}

fn check_chat_key(settings: &Settings) -> Result<()> {
    // The default OpenAI endpoint falls back to OPENAI_API_KEY inside the client
    if settings.chat.api_base.is_none() || settings.chat.resolve_api_key().is_some() {
        return Ok(());
    }
    Err(EduError::Config(format!(
        "{} not set. Set it with: export {}='...'",
        settings.chat.api_key_env, settings.chat.api_key_env
    )))
}

fn check_dataset(settings: &Settings) -> Result<()> {
    let path = settings.dataset_path();
    if path.exists() {
        return Ok(());
    }
    Err(EduError::Dataset(format!(
        "No dataset at {}. Run 'eduai fetch' first.",
        path.display()
    )))
}
