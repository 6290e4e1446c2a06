//! Fetch command implementation.

use crate::canvas::{CanvasClient, CourseFetcher, FetchProgress};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{parse_cutoff, Settings};
use crate::dataset::{Course, Dataset};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Run the fetch command.
pub async fn run_fetch(
    output: Option<String>,
    cutoff: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Fetch, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'eduai doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let cutoff = match cutoff {
        Some(raw) => parse_cutoff(&raw)?,
        None => settings.canvas.cutoff()?,
    };
    let path = output
        .map(|p| Settings::expand_path(&p))
        .unwrap_or_else(|| settings.dataset_path());

    let client = CanvasClient::from_settings(&settings.canvas)?;
    let fetcher = CourseFetcher::new(Arc::new(client), cutoff);

    Output::info(&format!(
        "Fetching courses from {} starting on or after {}",
        settings.canvas.api_url,
        cutoff.format("%Y-%m-%d")
    ));

    let pb = Output::progress_bar(0, "Listing courses...");
    let dataset = fetcher
        .collect_with_progress(|event| match event {
            FetchProgress::Started { total } => pb.set_length(total as u64),
            FetchProgress::Skipped { name, start_at } => {
                pb.println(format!("  skipped {} (starts {})", name, start_at));
                pb.inc(1);
            }
            FetchProgress::Processing { name } => {
                pb.set_message(name.to_string());
                pb.inc(1);
            }
            FetchProgress::Finished { .. } => pb.finish_and_clear(),
        })
        .await;
    pb.finish_and_clear();

    let dataset = match dataset {
        Ok(d) => d,
        Err(e) => {
            Output::error(&format!("Fetch failed: {}", e));
            return Err(e.into());
        }
    };

    dataset.save(&path)?;
    report(&dataset, &path);
    Ok(())
}

fn report(dataset: &Dataset, path: &Path) {
    Output::success(&format!(
        "Saved {} courses for {} to {}",
        dataset.courses.len(),
        dataset.user.name,
        path.display()
    ));

    let failures: Vec<String> = dataset.courses.iter().flat_map(failed_sections).collect();
    if !failures.is_empty() {
        Output::warning(&format!("{} sections could not be retrieved:", failures.len()));
        for failure in &failures {
            Output::list_item(failure);
        }
    }
}

/// Course-level sections that failed, as "course: reason" lines.
fn failed_sections(course: &Course) -> Vec<String> {
    [
        course.enrollment.failure(),
        course.assignments.failure(),
        course.quizzes.failure(),
        course.discussions.failure(),
        course.modules.failure(),
        course.pages.failure(),
        course.gradebook_history.failure(),
    ]
    .into_iter()
    .flatten()
    .map(|reason| format!("{}: {}", course.name, reason))
    .collect()
}
