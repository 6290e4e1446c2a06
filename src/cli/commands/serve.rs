//! Serve command: build the index and run the HTTP chat API.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::server::router;
use anyhow::Result;
use std::sync::Arc;

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'eduai doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let spinner = Output::spinner("Loading dataset and building the index...");
    let orchestrator = Orchestrator::new(settings)?;
    let state = orchestrator.start().await;
    spinner.finish_and_clear();
    let state = state?;

    let documents = state.service.knowledge().document_count();
    let timezone = state.service.timezone();
    let app = router(Arc::new(state));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("EduAI API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Documents indexed", &documents.to_string());
    Output::kv("Timezone", timezone.name());
    println!();
    println!("Endpoints (also under /api):");
    Output::kv("Chat", "POST /chat");
    Output::kv("Reset chat", "POST /reset-chat");
    Output::kv("Data summary", "GET  /data/summary");
    Output::kv("Health", "GET  /health");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}
