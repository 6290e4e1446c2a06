//! EduAI - a study assistant over Canvas LMS course data
//!
//! Fetches a student's Canvas courses into a local dataset, flattens it into
//! short text documents, embeds them into an in-memory vector index and
//! answers questions about them through a hosted language model.
//!
//! # Overview
//!
//! EduAI allows you to:
//! - Download courses, assignments, quizzes, discussions, modules and pages
//! - Search your course material semantically
//! - Chat about due dates and study plans over HTTP or from the terminal
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `canvas` - Canvas REST client and course collection
//! - `dataset` - The persisted course dataset
//! - `documents` - Flattening the dataset into retrievable documents
//! - `embedding` - Embedding generation
//! - `vector_store` - Flat nearest-neighbor index
//! - `rag` - Retrieval, prompting and per-session history
//! - `server` - HTTP API
//! - `orchestrator` - Startup wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use eduai::config::Settings;
//! use eduai::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let state = orchestrator.start().await?;
//!     let turn = state.service.chat("default", "What is due this week?").await?;
//!     println!("{}", turn.response);
//!
//!     Ok(())
//! }
//! ```

pub mod canvas;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod documents;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod server;
pub mod summary;
pub mod timefmt;
pub mod vector_store;

pub use error::{EduError, Result};
