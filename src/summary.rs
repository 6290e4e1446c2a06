//! Per-course counts over a loaded dataset.

use crate::dataset::Dataset;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub name: String,
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSummary {
    pub name: String,
    pub assignments_count: usize,
    pub quizzes_count: usize,
}

/// Overview of what was fetched. Sections that failed to load count as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSummary {
    pub user: UserSummary,
    pub courses: Vec<CourseSummary>,
    pub total_assignments: usize,
    pub total_quizzes: usize,
}

impl DataSummary {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let courses: Vec<CourseSummary> = dataset
            .courses
            .iter()
            .map(|course| CourseSummary {
                name: course.name.clone(),
                assignments_count: course.assignments.items().len(),
                quizzes_count: course.quizzes.items().len(),
            })
            .collect();

        Self {
            user: UserSummary {
                name: dataset.user.name.clone(),
                id: dataset.user.id,
            },
            total_assignments: courses.iter().map(|c| c.assignments_count).sum(),
            total_quizzes: courses.iter().map(|c| c.quizzes_count).sum(),
            courses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::testing::sample_dataset;

    #[test]
    fn test_counts_and_totals() {
        let summary = DataSummary::from_dataset(&sample_dataset());

        assert_eq!(
            summary.user,
            UserSummary {
                name: "Ada Student".to_string(),
                id: 7
            }
        );
        assert_eq!(summary.courses.len(), 2);
        assert_eq!(summary.courses[0].assignments_count, 1);
        assert_eq!(summary.courses[0].quizzes_count, 0);
        // History's assignments failed to load
        assert_eq!(summary.courses[1].assignments_count, 0);
        assert_eq!(summary.courses[1].quizzes_count, 1);
        assert_eq!(summary.total_assignments, 1);
        assert_eq!(summary.total_quizzes, 1);
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(DataSummary::from_dataset(&sample_dataset())).unwrap();
        assert_eq!(value["user"]["name"], "Ada Student");
        assert_eq!(value["courses"][1]["name"], "History 200");
        assert_eq!(value["total_quizzes"], 1);
    }
}
