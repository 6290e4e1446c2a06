//! Flattening of the nested dataset into retrievable text documents.

use crate::dataset::{Assignment, Course, Dataset, Quiz, Section, Submission, QuizSubmission};
use crate::timefmt::format_due_date;
use chrono_tz::Tz;
use serde::Serialize;

/// What a document was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Course,
    Assignment,
    Quiz,
}

/// Metadata tags paired with each document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMeta {
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    pub course: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Flattened documents with metadata at the same positions.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub documents: Vec<String>,
    pub metadata: Vec<DocumentMeta>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn push(&mut self, text: String, meta: DocumentMeta) {
        self.documents.push(text);
        self.metadata.push(meta);
    }
}

/// Flatten a dataset: one overview per course, then one document per
/// assignment and per quiz of that course, in dataset order.
pub fn flatten(dataset: &Dataset, tz: Tz) -> Corpus {
    let mut corpus = Corpus::default();

    for course in &dataset.courses {
        corpus.push(
            course_document(course),
            DocumentMeta {
                kind: DocumentKind::Course,
                course: course.name.clone(),
                title: None,
            },
        );

        for assignment in course.assignments.items() {
            corpus.push(
                assignment_document(&course.name, assignment, tz),
                DocumentMeta {
                    kind: DocumentKind::Assignment,
                    course: course.name.clone(),
                    title: Some(assignment.name.clone()),
                },
            );
        }

        for quiz in course.quizzes.items() {
            corpus.push(
                quiz_document(&course.name, quiz, tz),
                DocumentMeta {
                    kind: DocumentKind::Quiz,
                    course: course.name.clone(),
                    title: Some(quiz.title.clone()),
                },
            );
        }
    }

    corpus
}

fn course_document(course: &Course) -> String {
    let mut doc = format!(
        "**Course:** {}\n**Code:** {}\n",
        course.name,
        course.course_code.as_deref().unwrap_or("No code")
    );
    if let Some(description) = non_empty(course.description.as_deref()) {
        doc.push_str(&format!("**Description:** {}\n", description));
    }
    doc
}

fn assignment_document(course: &str, assignment: &Assignment, tz: Tz) -> String {
    format!(
        "**Assignment in {}:**\n\
         - **Name:** {}\n\
         - **Due Date:** {}\n\
         - **Description:** {}\n\
         - **Submission Scores:** {}\n",
        course,
        assignment.name,
        format_due_date(assignment.due_at.as_deref(), tz),
        non_empty(assignment.description.as_deref()).unwrap_or("No description"),
        submission_summary(&assignment.submission, assignment.points_possible),
    )
}

fn quiz_document(course: &str, quiz: &Quiz, tz: Tz) -> String {
    format!(
        "**Quiz in {}:**\n\
         - **Title:** {}\n\
         - **Due Date:** {}\n\
         - **Description:** {}\n\
         - **Submission Scores:** {}\n",
        course,
        quiz.title,
        format_due_date(quiz.due_at.as_deref(), tz),
        non_empty(quiz.description.as_deref()).unwrap_or("No description"),
        quiz_submission_summary(&quiz.submission, quiz.points_possible),
    )
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

fn score_text(score: f64, points_possible: Option<f64>) -> String {
    match points_possible {
        Some(points) => format!("{}/{}", score, points),
        None => score.to_string(),
    }
}

fn submission_summary(submission: &Section<Submission>, points_possible: Option<f64>) -> String {
    let Some(sub) = submission.data() else {
        return "No submission".to_string();
    };

    let mut parts = Vec::new();
    if let Some(score) = sub.score {
        parts.push(format!("score {}", score_text(score, points_possible)));
    }
    if let Some(grade) = non_empty(sub.grade.as_deref()) {
        parts.push(format!("grade {}", grade));
    }
    if let Some(state) = non_empty(sub.workflow_state.as_deref()) {
        parts.push(format!("status {}", state));
    }

    if parts.is_empty() {
        "No submission".to_string()
    } else {
        parts.join(", ")
    }
}

fn quiz_submission_summary(
    submission: &Section<Option<QuizSubmission>>,
    points_possible: Option<f64>,
) -> String {
    match submission.data() {
        Some(Some(QuizSubmission { score: Some(score), .. })) => {
            format!("score {}", score_text(*score, points_possible))
        }
        _ => "No submission".to_string(),
    }
}
