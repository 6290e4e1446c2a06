//! Startup wiring for EduAI.
//!
//! Loads the dataset, flattens and embeds it, and assembles the services
//! shared by the HTTP server and the terminal commands.

use crate::config::{Prompts, Settings};
use crate::dataset::Dataset;
use crate::documents::flatten;
use crate::embedding::{create_embedder, Embedder};
use crate::error::Result;
use crate::rag::{ChatCompletionGenerator, ConversationService, Generator, KnowledgeBase};
use crate::server::AppState;
use crate::summary::DataSummary;
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{info, instrument};

/// Builds the knowledge base and conversation service from settings.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    timezone: Tz,
    embedder: Arc<dyn Embedder>,
}

impl Orchestrator {
    /// Create an orchestrator using the configured embedding provider.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let embedder = create_embedder(&settings)?;
        Self::with_components(settings, prompts, embedder)
    }

    /// Create an orchestrator with a custom embedder.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let timezone = settings.timezone()?;
        Ok(Self {
            settings,
            prompts,
            timezone,
            embedder,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Read the dataset from the configured path.
    pub fn load_dataset(&self) -> Result<Dataset> {
        Dataset::load(&self.settings.dataset_path())
    }

    /// Flatten and embed a dataset.
    #[instrument(skip_all, fields(courses = dataset.courses.len()))]
    pub async fn build_knowledge(&self, dataset: &Dataset) -> Result<Arc<KnowledgeBase>> {
        let corpus = flatten(dataset, self.timezone);
        info!("Flattened dataset into {} documents", corpus.len());
        let knowledge = KnowledgeBase::build(corpus, self.embedder.as_ref()).await?;
        Ok(Arc::new(knowledge))
    }

    /// A conversation service over `knowledge` answering through `generator`.
    pub fn conversation(
        &self,
        knowledge: Arc<KnowledgeBase>,
        generator: Arc<dyn Generator>,
    ) -> ConversationService {
        let instructions = self.prompts.chat_instructions(self.timezone.name());
        ConversationService::new(
            knowledge,
            self.embedder.clone(),
            generator,
            instructions,
            self.timezone,
        )
        .with_max_context_docs(self.settings.chat.max_context_docs)
        .with_history_limit(self.settings.chat.history_max_chars)
    }

    /// Load everything the server needs using the configured model.
    pub async fn start(&self) -> Result<AppState> {
        let dataset = self.load_dataset()?;
        let generator = Arc::new(ChatCompletionGenerator::from_settings(&self.settings.chat)?);
        self.start_with(&dataset, generator).await
    }

    /// Build the server state from an already loaded dataset.
    pub async fn start_with(
        &self,
        dataset: &Dataset,
        generator: Arc<dyn Generator>,
    ) -> Result<AppState> {
        let knowledge = self.build_knowledge(dataset).await?;
        let service = self.conversation(knowledge, generator);
        Ok(AppState::new(service, DataSummary::from_dataset(dataset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EduError;
    use crate::rag::testing::{sample_dataset, KeywordEmbedder, ScriptedGenerator};
    use tempfile::TempDir;

    fn orchestrator(settings: Settings) -> Orchestrator {
        Orchestrator::with_components(settings, Prompts::default(), Arc::new(KeywordEmbedder))
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_with_builds_aligned_state() {
        let generator = Arc::new(ScriptedGenerator::repeating("Sure."));
        let orchestrator = orchestrator(Settings::default());

        let state = orchestrator
            .start_with(&sample_dataset(), generator.clone())
            .await
            .unwrap();

        let knowledge = state.service.knowledge();
        // Two course overviews, one assignment, one quiz
        assert_eq!(knowledge.document_count(), 4);
        assert_eq!(knowledge.index_size(), 4);
        assert_eq!(state.summary.total_quizzes, 1);

        state.service.chat("s", "hello").await.unwrap();
        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("ALWAYS use the America/New_York timezone"));
        assert!(!prompt.contains("{{timezone}}"));
    }

    #[tokio::test]
    async fn test_dataset_is_read_from_configured_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        sample_dataset().save(&path).unwrap();

        let mut settings = Settings::default();
        settings.dataset.path = path.to_string_lossy().to_string();

        let dataset = orchestrator(settings).load_dataset().unwrap();
        assert_eq!(dataset.user.name, "Ada Student");
        assert_eq!(dataset.courses.len(), 2);
    }

    #[test]
    fn test_invalid_timezone_is_rejected() {
        let mut settings = Settings::default();
        settings.time.timezone = "Mars/Olympus_Mons".to_string();

        let result =
            Orchestrator::with_components(settings, Prompts::default(), Arc::new(KeywordEmbedder));
        assert!(matches!(result, Err(EduError::Config(_))));
    }
}
