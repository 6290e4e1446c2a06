//! CLI module for EduAI.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// EduAI - a study assistant over your Canvas courses
///
/// Fetches your Canvas course data, indexes it for semantic search and
/// answers questions about assignments, quizzes and due dates.
#[derive(Parser, Debug)]
#[command(name = "eduai")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download course data from Canvas into the dataset file
    Fetch {
        /// Write the dataset here instead of the configured path
        #[arg(short, long)]
        output: Option<String>,

        /// Skip courses starting before this instant (RFC 3339)
        #[arg(long)]
        cutoff: Option<String>,
    },

    /// Start the HTTP chat server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question about your courses
    Ask {
        /// The question to ask
        question: String,

        /// Print the documents used as context
        #[arg(short, long)]
        sources: bool,
    },

    /// Show the course documents nearest to a query
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Summarize the fetched dataset
    Summary,

    /// Check configuration, API keys and the dataset
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
