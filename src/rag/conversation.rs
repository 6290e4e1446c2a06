//! Retrieval-augmented conversation with per-session history.

use super::context::{format_context_for_prompt, ContextBuilder};
use super::session::{truncate_history, SessionStore};
use super::{ContextChunk, Generator, KnowledgeBase};
use crate::embedding::Embedder;
use crate::error::{EduError, Result};
use crate::timefmt::{format_in, PROMPT_DATETIME_FORMAT};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Session used when a client does not name one.
pub const DEFAULT_SESSION: &str = "default";

/// Default bound on a stored transcript, in characters.
pub const DEFAULT_HISTORY_MAX_CHARS: usize = 10_000;

/// Assemble the prompt for one turn.
pub fn build_prompt(instructions: &str, now: &str, context: &str, message: &str) -> String {
    format!(
        "{}\n\nCurrent Date and Time: {}\n\nCanvas Data Context:\n{}\n\nUser: {}\nAssistant:",
        instructions, now, context, message
    )
}

/// Result of one conversation turn.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub response: String,
    /// Documents retrieved for this turn, nearest first.
    pub sources: Vec<ContextChunk>,
}

/// Answers messages using retrieved course documents and session history.
pub struct ConversationService {
    knowledge: Arc<KnowledgeBase>,
    context: ContextBuilder,
    generator: Arc<dyn Generator>,
    sessions: SessionStore,
    instructions: String,
    timezone: Tz,
    history_max_chars: usize,
}

impl ConversationService {
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        instructions: String,
        timezone: Tz,
    ) -> Self {
        Self {
            context: ContextBuilder::new(knowledge.clone(), embedder),
            knowledge,
            generator,
            sessions: SessionStore::new(),
            instructions,
            timezone,
            history_max_chars: DEFAULT_HISTORY_MAX_CHARS,
        }
    }

    /// Set how many documents are retrieved per message.
    pub fn with_max_context_docs(mut self, max_docs: usize) -> Self {
        self.context = self.context.with_max_chunks(max_docs);
        self
    }

    /// Set the transcript bound in characters.
    pub fn with_history_limit(mut self, max_chars: usize) -> Self {
        self.history_max_chars = max_chars;
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one message at the current time.
    pub async fn chat(&self, session_id: &str, message: &str) -> Result<ChatTurn> {
        self.chat_at(session_id, message, Utc::now()).await
    }

    /// Handle one message as if it arrived at `now`.
    ///
    /// The stored transcript only changes when generation succeeds.
    #[instrument(skip(self, message, now), fields(session = %session_id))]
    pub async fn chat_at(
        &self,
        session_id: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<ChatTurn> {
        if message.is_empty() {
            return Err(EduError::InvalidInput("No message provided".to_string()));
        }

        let transcript = self.sessions.transcript(session_id);
        let mut history = transcript.lock().await;

        let sources = self.context.build(message).await?;
        let prompt = build_prompt(
            &self.instructions,
            &format_in(now, self.timezone, PROMPT_DATETIME_FORMAT),
            &format_context_for_prompt(&sources),
            message,
        );

        let mut next = String::with_capacity(history.len() + prompt.len() + 1);
        next.push_str(&history);
        next.push('\n');
        next.push_str(&prompt);

        debug!("Sending {} characters to the model", next.len());
        let response = self.generator.generate(&next).await?;

        next.push(' ');
        next.push_str(&response);
        truncate_history(&mut next, self.history_max_chars);
        *history = next;

        info!("Answered with {} sources", sources.len());
        Ok(ChatTurn { response, sources })
    }

    /// Forget a session's history.
    pub async fn reset(&self, session_id: &str) {
        self.sessions.reset(session_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::testing::{sample_knowledge, KeywordEmbedder, ScriptedGenerator};
    use chrono::TimeZone;

    async fn service(generator: Arc<ScriptedGenerator>) -> ConversationService {
        let embedder = Arc::new(KeywordEmbedder);
        let knowledge = Arc::new(sample_knowledge(embedder.as_ref()).await);
        ConversationService::new(
            knowledge,
            embedder,
            generator,
            "Be helpful.".to_string(),
            chrono_tz::America::New_York,
        )
    }

    fn monday_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 14, 5, 0).unwrap()
    }

    #[test]
    fn test_build_prompt_layout() {
        let prompt = build_prompt("Rules.", "Now", "Doc A\nDoc B", "What is due?");
        assert_eq!(
            prompt,
            "Rules.\n\nCurrent Date and Time: Now\n\nCanvas Data Context:\nDoc A\nDoc B\n\nUser: What is due?\nAssistant:"
        );
    }

    #[tokio::test]
    async fn test_first_turn_prompt_and_history() {
        let generator = Arc::new(ScriptedGenerator::with_replies(&["Lab 2 is due Friday."]));
        let service = service(generator.clone()).await.with_max_context_docs(1);

        let turn = service
            .chat_at("u1", "biology lab report", monday_morning())
            .await
            .unwrap();
        assert_eq!(turn.response, "Lab 2 is due Friday.");
        assert_eq!(turn.sources.len(), 1);
        assert_eq!(turn.sources[0].meta.title.as_deref(), Some("Lab 2"));

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with(
            "\nBe helpful.\n\n\
             Current Date and Time: Monday, March 10, 2025 at 10:05 AM EDT\n\n\
             Canvas Data Context:\n"
        ));
        assert!(prompts[0].ends_with("User: biology lab report\nAssistant:"));

        let history = service.sessions().snapshot("u1").await.unwrap();
        assert_eq!(history, format!("{} Lab 2 is due Friday.", prompts[0]));
    }

    #[tokio::test]
    async fn test_follow_up_includes_prior_turns() {
        let generator =
            Arc::new(ScriptedGenerator::with_replies(&["First answer.", "Second answer."]));
        let service = service(generator.clone()).await;

        service.chat_at("u1", "first question", monday_morning()).await.unwrap();
        service.chat_at("u1", "second question", monday_morning()).await.unwrap();

        let prompts = generator.prompts();
        assert!(prompts[1].contains("User: first question\nAssistant: First answer."));
        assert!(prompts[1].ends_with("User: second question\nAssistant:"));
    }

    #[tokio::test]
    async fn test_reset_starts_a_fresh_conversation() {
        let generator = Arc::new(ScriptedGenerator::with_replies(&["Remembered.", "Fresh."]));
        let service = service(generator.clone()).await;

        service.chat_at("u1", "remember this", monday_morning()).await.unwrap();
        service.reset("u1").await;
        service.chat_at("u1", "anything else", monday_morning()).await.unwrap();

        let prompts = generator.prompts();
        assert!(!prompts[1].contains("remember this"));
        assert!(!prompts[1].contains("Remembered."));
        assert_eq!(prompts[1].matches("User:").count(), 1);
    }

    #[tokio::test]
    async fn test_reset_unknown_session_then_chat() {
        let generator = Arc::new(ScriptedGenerator::with_replies(&["Hello!"]));
        let service = service(generator.clone()).await;

        service.reset("u1").await;
        let turn = service.chat_at("u1", "hi", monday_morning()).await.unwrap();
        assert_eq!(turn.response, "Hello!");
        assert_eq!(generator.prompts()[0].matches("User:").count(), 1);
    }

    #[tokio::test]
    async fn test_failed_generation_leaves_history_untouched() {
        let generator = Arc::new(ScriptedGenerator::with_replies(&["Kept."]));
        let service = service(generator.clone()).await;

        service.chat_at("u1", "first", monday_morning()).await.unwrap();
        let before = service.sessions().snapshot("u1").await.unwrap();

        generator.fail_next("rate limited");
        let err = service.chat_at("u1", "second", monday_morning()).await.unwrap_err();
        assert!(err.to_string().contains("rate limited"));

        assert_eq!(service.sessions().snapshot("u1").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_history_is_clamped_to_limit() {
        let long_reply = "x".repeat(3_000);
        let generator = Arc::new(ScriptedGenerator::repeating(&long_reply));
        let service = service(generator).await;

        for i in 0..5 {
            service
                .chat_at("u1", &format!("question {}", i), monday_morning())
                .await
                .unwrap();
        }

        let history = service.sessions().snapshot("u1").await.unwrap();
        assert_eq!(history.chars().count(), DEFAULT_HISTORY_MAX_CHARS);
        assert!(history.ends_with(&format!("question 4\nAssistant: {}", long_reply)));
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let generator = Arc::new(ScriptedGenerator::repeating("ok"));
        let service = service(generator.clone()).await;

        let err = service.chat_at("u1", "", monday_morning()).await.unwrap_err();
        assert!(matches!(err, EduError::InvalidInput(_)));
        assert!(generator.prompts().is_empty());

        // Only the empty string is rejected; whitespace is passed through
        service.chat_at("u1", " ", monday_morning()).await.unwrap();
        assert_eq!(generator.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_turns_on_one_session_are_serialized() {
        let generator = Arc::new(ScriptedGenerator::repeating("ok"));
        let service = Arc::new(service(generator).await);

        let a = {
            let service = service.clone();
            tokio::spawn(async move { service.chat("shared", "alpha").await })
        };
        let b = {
            let service = service.clone();
            tokio::spawn(async move { service.chat("shared", "beta").await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let history = service.sessions().snapshot("shared").await.unwrap();
        assert!(history.contains("User: alpha\nAssistant: ok"));
        assert!(history.contains("User: beta\nAssistant: ok"));
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let generator = Arc::new(ScriptedGenerator::repeating("ok"));
        let service = service(generator.clone()).await;

        service.chat_at("a", "from session a", monday_morning()).await.unwrap();
        service.chat_at("b", "from session b", monday_morning()).await.unwrap();

        assert!(!generator.prompts()[1].contains("from session a"));
    }
}
