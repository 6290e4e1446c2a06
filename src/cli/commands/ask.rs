//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::{ChatCompletionGenerator, DEFAULT_SESSION};
use anyhow::Result;
use std::sync::Arc;

/// Run the ask command: one chat turn against the indexed dataset.
pub async fn run_ask(question: &str, show_sources: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'eduai doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let generator = Arc::new(ChatCompletionGenerator::from_settings(&settings.chat)?);
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Indexing course data...");
    let dataset = orchestrator.load_dataset()?;
    let knowledge = orchestrator.build_knowledge(&dataset).await;
    spinner.finish_and_clear();
    let service = orchestrator.conversation(knowledge?, generator);

    let spinner = Output::spinner("Thinking...");
    let turn = service.chat(DEFAULT_SESSION, question).await;
    spinner.finish_and_clear();

    match turn {
        Ok(turn) => {
            println!("\n{}\n", turn.response);

            if show_sources && !turn.sources.is_empty() {
                Output::header("Sources");
                for source in &turn.sources {
                    let label = source.meta.title.as_deref().unwrap_or("Course overview");
                    Output::search_result(
                        label,
                        &source.meta.course,
                        source.distance,
                        &source.content,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
