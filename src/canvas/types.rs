//! Records as returned by the Canvas REST API.
//!
//! Only the fields the dataset keeps are declared; everything else in the
//! responses is ignored.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CourseRecord {
    pub id: u64,
    /// Courses the user can no longer access come back without a name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_at: Option<String>,
    #[serde(default)]
    pub end_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub points_possible: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizRecord {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub points_possible: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizSubmissionRecord {
    pub user_id: u64,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub graded_at: Option<String>,
}

/// Envelope of the quiz submissions endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct QuizSubmissionList {
    #[serde(default)]
    pub quiz_submissions: Vec<QuizSubmissionRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscussionRecord {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub posted_at: Option<String>,
    #[serde(default)]
    pub author: Option<DiscussionAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscussionAuthor {
    #[serde(default)]
    pub id: Option<u64>,
}

impl DiscussionRecord {
    /// Whether the topic was posted by the given user.
    pub fn authored_by(&self, user_id: u64) -> bool {
        self.author
            .as_ref()
            .and_then(|a| a.id)
            .is_some_and(|id| id == user_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleRecord {
    pub id: u64,
    pub name: String,
}
