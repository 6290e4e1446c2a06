//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod fetch;
mod search;
mod serve;
mod summary;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use fetch::run_fetch;
pub use search::run_search;
pub use serve::run_serve;
pub use summary::run_summary;
