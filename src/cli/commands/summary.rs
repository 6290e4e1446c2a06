//! Summary command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::dataset::Dataset;
use crate::summary::DataSummary;
use anyhow::Result;

/// Print per-course counts for the fetched dataset.
pub fn run_summary(settings: &Settings) -> Result<()> {
    preflight::check(Operation::Search, settings)?;

    let dataset = Dataset::load(&settings.dataset_path())?;
    let summary = DataSummary::from_dataset(&dataset);

    Output::header(&format!("{} ({})", summary.user.name, summary.user.id));
    println!();
    if summary.courses.is_empty() {
        Output::warning("No courses in the dataset. Check canvas.cutoff_date and fetch again.");
        return Ok(());
    }

    for course in &summary.courses {
        Output::course_counts(&course.name, course.assignments_count, course.quizzes_count);
    }
    println!();
    Output::kv("Courses", &summary.courses.len().to_string());
    Output::kv("Assignments", &summary.total_assignments.to_string());
    Output::kv("Quizzes", &summary.total_quizzes.to_string());

    Ok(())
}
