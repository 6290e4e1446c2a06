//! Client construction for OpenAI-compatible APIs.

use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for any OpenAI-compatible endpoint.
///
/// `api_base` of `None` keeps the OpenAI default; `api_key` of `None` keeps
/// the key read from `OPENAI_API_KEY`.
pub fn create_client_with(
    api_base: Option<&str>,
    api_key: Option<String>,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let mut config = OpenAIConfig::default();
    if let Some(base) = api_base {
        config = config.with_api_base(base.trim_end_matches('/'));
    }
    if let Some(key) = api_key {
        config = config.with_api_key(key);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
