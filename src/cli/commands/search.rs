//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::{ContextBuilder, ContextChunk};
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    preflight::check(Operation::Search, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner("Searching...");

    let results: crate::error::Result<Vec<ContextChunk>> = async {
        let dataset = orchestrator.load_dataset()?;
        let knowledge = orchestrator.build_knowledge(&dataset).await?;
        ContextBuilder::new(knowledge, orchestrator.embedder())
            .with_max_chunks(limit)
            .build(query)
            .await
    }
    .await;
    spinner.finish_and_clear();

    match results {
        Ok(chunks) => {
            if chunks.is_empty() {
                Output::warning("The dataset has no documents to search.");
            } else {
                Output::success(&format!("Found {} results", chunks.len()));

                for chunk in &chunks {
                    let label = chunk.meta.title.as_deref().unwrap_or("Course overview");
                    Output::search_result(
                        label,
                        &chunk.meta.course,
                        chunk.distance,
                        &chunk.content,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
