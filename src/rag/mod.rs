//! RAG (Retrieval-Augmented Generation) over course documents.
//!
//! Documents are embedded into a flat index once at startup; each chat
//! message retrieves its nearest documents and sends them, along with the
//! session's transcript, to a hosted model.

pub mod context;
mod conversation;
mod generator;
mod knowledge;
mod session;

pub use context::{format_context_for_prompt, ContextBuilder};
pub use conversation::{
    build_prompt, ChatTurn, ConversationService, DEFAULT_HISTORY_MAX_CHARS, DEFAULT_SESSION,
};
pub use generator::{ChatCompletionGenerator, Generator};
pub use knowledge::KnowledgeBase;
pub use session::{truncate_history, SessionStore};

use crate::documents::DocumentMeta;

/// A retrieved document with its position and distance to the query.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    /// Position in the corpus and in the index.
    pub index: usize,
    /// Document text.
    pub content: String,
    pub meta: DocumentMeta,
    /// Squared L2 distance; smaller is closer.
    pub distance: f32,
}
