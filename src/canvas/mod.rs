//! Canvas LMS access and course data collection.
//!
//! [`CourseApi`] abstracts the remote API so the [`CourseFetcher`] walk can be
//! driven by the real [`CanvasClient`] or an in-process fake.

mod client;
mod fetcher;
mod types;

pub use client::{next_page_url, CanvasClient};
pub use fetcher::{CourseFetcher, FetchProgress};
pub use types::{
    AssignmentRecord, CourseRecord, DiscussionRecord, ModuleRecord, QuizRecord,
    QuizSubmissionRecord,
};

use crate::dataset::{Enrollment, ModuleItem, Page, Submission, User};
use crate::error::Result;
use async_trait::async_trait;

/// Read-only view of the course-management API for the authenticated user.
///
/// Every list method returns the fully paginated result.
#[async_trait]
pub trait CourseApi: Send + Sync {
    async fn current_user(&self) -> Result<User>;

    async fn courses(&self) -> Result<Vec<CourseRecord>>;

    async fn student_enrollments(&self, course_id: u64) -> Result<Vec<Enrollment>>;

    async fn assignments(&self, course_id: u64) -> Result<Vec<AssignmentRecord>>;

    async fn submission(
        &self,
        course_id: u64,
        assignment_id: u64,
        user_id: u64,
    ) -> Result<Submission>;

    async fn quizzes(&self, course_id: u64) -> Result<Vec<QuizRecord>>;

    async fn quiz_submissions(
        &self,
        course_id: u64,
        quiz_id: u64,
    ) -> Result<Vec<QuizSubmissionRecord>>;

    async fn discussion_topics(&self, course_id: u64) -> Result<Vec<DiscussionRecord>>;

    async fn modules(&self, course_id: u64) -> Result<Vec<ModuleRecord>>;

    async fn module_items(&self, course_id: u64, module_id: u64) -> Result<Vec<ModuleItem>>;

    async fn pages(&self, course_id: u64) -> Result<Vec<Page>>;

    /// Raw gradebook history feed entries.
    async fn gradebook_history(&self, course_id: u64) -> Result<Vec<serde_json::Value>>;
}
