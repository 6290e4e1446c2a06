//! Per-session conversation transcripts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;

/// Keep only the last `max_chars` characters of `text`.
pub fn truncate_history(text: &mut String, max_chars: usize) {
    let total = text.chars().count();
    if total <= max_chars {
        return;
    }
    let cut = text
        .char_indices()
        .nth(total - max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text.drain(..cut);
}

/// Transcripts keyed by session id.
///
/// Each transcript has its own async lock; a caller holds it for a whole
/// turn so concurrent messages on one session are applied one after another.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<AsyncMutex<String>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<String>>>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The transcript for `session_id`, created empty on first use.
    pub fn transcript(&self, session_id: &str) -> Arc<AsyncMutex<String>> {
        self.map()
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(String::new())))
            .clone()
    }

    /// Clear a session's transcript. Unknown sessions are left alone.
    pub async fn reset(&self, session_id: &str) {
        let transcript = self.map().get(session_id).cloned();
        if let Some(transcript) = transcript {
            transcript.lock().await.clear();
        }
    }

    /// A copy of the current transcript, if the session exists.
    pub async fn snapshot(&self, session_id: &str) -> Option<String> {
        let transcript = self.map().get(session_id).cloned()?;
        let text = transcript.lock().await.clone();
        Some(text)
    }

    pub fn session_count(&self) -> usize {
        self.map().len()
    }
}
