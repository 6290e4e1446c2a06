//! Walks the course API and assembles the dataset.

use super::CourseApi;
use crate::dataset::{
    Assignment, Course, Dataset, Discussion, Enrollment, Module, Quiz, QuizSubmission, Section,
    User,
};
use crate::error::Result;
use crate::timefmt::parse_timestamp;
use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Progress events emitted while collecting.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchProgress<'a> {
    /// Course listing finished; `total` includes courses that will be skipped.
    Started { total: usize },
    Skipped { name: &'a str, start_at: &'a str },
    Processing { name: &'a str },
    Finished { collected: usize },
}

/// Collects every course section for the current user.
pub struct CourseFetcher {
    api: Arc<dyn CourseApi>,
    cutoff: DateTime<Utc>,
}

fn section<T>(label: &str, result: Result<T>) -> Section<T> {
    match result {
        Ok(data) => Section::Data(data),
        Err(e) => {
            warn!("Error retrieving {}: {}", label, e);
            Section::Failed(failure_message(label, e))
        }
    }
}

fn failure_message(label: &str, err: impl Display) -> String {
    format!("Error retrieving {}: {}", label, err)
}

/// Whether a course starting at `start_at` predates the cutoff.
///
/// Absent or unparseable start dates never cause a skip.
pub(crate) fn starts_before(start_at: Option<&str>, cutoff: DateTime<Utc>) -> bool {
    match start_at {
        Some(raw) => match parse_timestamp(raw) {
            Some(start) => start < cutoff,
            None => {
                warn!("Could not parse course start date '{}', including course", raw);
                false
            }
        },
        None => false,
    }
}

impl CourseFetcher {
    pub fn new(api: Arc<dyn CourseApi>, cutoff: DateTime<Utc>) -> Self {
        Self { api, cutoff }
    }

    /// Collect the full dataset.
    pub async fn collect(&self) -> Result<Dataset> {
        self.collect_with_progress(|_| {}).await
    }

    /// Collect the full dataset, reporting progress as courses are visited.
    ///
    /// Only the user lookup and the course listing can fail the run; every
    /// per-course section failure is recorded in the dataset instead.
    #[instrument(skip(self, on_progress), fields(cutoff = %self.cutoff))]
    pub async fn collect_with_progress<F>(&self, on_progress: F) -> Result<Dataset>
    where
        F: Fn(FetchProgress<'_>),
    {
        info!("Retrieving current user info");
        let user = self.api.current_user().await?;

        info!("Retrieving courses");
        let records = self.api.courses().await?;
        on_progress(FetchProgress::Started { total: records.len() });

        let mut courses = Vec::new();
        for record in records {
            let name = record.name.clone().unwrap_or_else(|| "Unknown Course".to_string());

            if starts_before(record.start_at.as_deref(), self.cutoff) {
                let start_at = record.start_at.as_deref().unwrap_or_default();
                info!("Skipping course {} (start_at: {})", name, start_at);
                on_progress(FetchProgress::Skipped { name: &name, start_at });
                continue;
            }

            info!("Processing course: {}", name);
            on_progress(FetchProgress::Processing { name: &name });

            let mut course = Course::new(record.id, name);
            course.course_code = record.course_code;
            course.description = record.description;
            course.start_at = record.start_at;
            course.end_at = record.end_at;

            self.fill_course(&mut course, &user).await;
            courses.push(course);
        }

        on_progress(FetchProgress::Finished { collected: courses.len() });
        info!("Collected {} courses", courses.len());

        Ok(Dataset { user, courses })
    }

    async fn fill_course(&self, course: &mut Course, user: &User) {
        let id = course.id;

        course.enrollment = section("enrollment", self.enrollment(id, user.id).await);
        course.assignments = section("assignments", self.assignments(id, user.id).await);
        course.quizzes = section("quizzes", self.quizzes(id, user.id).await);
        course.discussions = section("discussions", self.discussions(id, user.id).await);
        course.modules = section("modules", self.modules(id).await);
        course.pages = section("pages", self.api.pages(id).await);
        course.gradebook_history =
            section("gradebook history", self.api.gradebook_history(id).await);
    }

    async fn enrollment(&self, course_id: u64, user_id: u64) -> Result<Option<Enrollment>> {
        let enrollments = self.api.student_enrollments(course_id).await?;
        Ok(enrollments.into_iter().find(|e| e.user_id == user_id))
    }

    async fn assignments(&self, course_id: u64, user_id: u64) -> Result<Vec<Assignment>> {
        let records = self.api.assignments(course_id).await?;
        let mut assignments = Vec::with_capacity(records.len());

        for record in records {
            let submission = section(
                "submission",
                self.api.submission(course_id, record.id, user_id).await,
            );
            assignments.push(Assignment {
                id: record.id,
                name: record.name,
                due_at: record.due_at,
                description: record.description,
                points_possible: record.points_possible,
                submission,
            });
        }

        Ok(assignments)
    }

    async fn quizzes(&self, course_id: u64, user_id: u64) -> Result<Vec<Quiz>> {
        let records = self.api.quizzes(course_id).await?;
        let mut quizzes = Vec::with_capacity(records.len());

        for record in records {
            let submission = self
                .api
                .quiz_submissions(course_id, record.id)
                .await
                .map(|subs| {
                    subs.into_iter()
                        .find(|s| s.user_id == user_id)
                        .map(|s| QuizSubmission {
                            score: s.score,
                            graded_at: s.graded_at,
                        })
                });
            quizzes.push(Quiz {
                id: record.id,
                title: record.title,
                due_at: record.due_at,
                description: record.description,
                points_possible: record.points_possible,
                submission: section("quiz submission", submission),
            });
        }

        Ok(quizzes)
    }

    async fn discussions(&self, course_id: u64, user_id: u64) -> Result<Vec<Discussion>> {
        let topics = self.api.discussion_topics(course_id).await?;
        Ok(topics
            .into_iter()
            .filter(|t| t.authored_by(user_id))
            .map(|t| Discussion {
                id: t.id,
                title: t.title,
                message: t.message,
                posted_at: t.posted_at,
            })
            .collect())
    }

    async fn modules(&self, course_id: u64) -> Result<Vec<Module>> {
        let records = self.api.modules(course_id).await?;
        let mut modules = Vec::with_capacity(records.len());

        for record in records {
            let items = section("module items", self.api.module_items(course_id, record.id).await);
            modules.push(Module {
                id: record.id,
                name: record.name,
                items,
            });
        }

        Ok(modules)
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::*;
    use super::*;
    use crate::dataset::{ModuleItem, Page, Submission};
    use crate::error::EduError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    const ME: u64 = 42;

    /// Fake Canvas with configurable failures per (resource, course id).
    #[derive(Default)]
    struct FakeCanvas {
        courses: Vec<CourseRecord>,
        failing: Vec<(&'static str, u64)>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeCanvas {
        fn check(&self, resource: &'static str, id: u64) -> Result<()> {
            self.calls.lock().unwrap().push(format!("{}:{}", resource, id));
            if self.failing.contains(&(resource, id)) {
                Err(EduError::Canvas(format!("{} unavailable", resource)))
            } else {
                Ok(())
            }
        }
    }

    fn course(id: u64, name: &str, start_at: Option<&str>) -> CourseRecord {
        CourseRecord {
            id,
            name: Some(name.to_string()),
            course_code: Some(format!("C{}", id)),
            description: None,
            start_at: start_at.map(String::from),
            end_at: None,
        }
    }

    #[async_trait]
    impl CourseApi for FakeCanvas {
        async fn current_user(&self) -> Result<User> {
            Ok(User {
                id: ME,
                name: "Ada Lovelace".to_string(),
                sortable_name: None,
                login_id: Some("ada".to_string()),
            })
        }

        async fn courses(&self) -> Result<Vec<CourseRecord>> {
            Ok(self.courses.clone())
        }

        async fn student_enrollments(&self, course_id: u64) -> Result<Vec<Enrollment>> {
            self.check("enrollments", course_id)?;
            Ok(vec![
                Enrollment {
                    user_id: 7,
                    role: Some("StudentEnrollment".into()),
                    grades: serde_json::Value::Null,
                },
                Enrollment {
                    user_id: ME,
                    role: Some("StudentEnrollment".into()),
                    grades: serde_json::json!({"current_score": 91.5}),
                },
            ])
        }

        async fn assignments(&self, course_id: u64) -> Result<Vec<AssignmentRecord>> {
            self.check("assignments", course_id)?;
            Ok(vec![
                AssignmentRecord {
                    id: 1,
                    name: "HW1".into(),
                    due_at: Some("2025-03-10T23:59:00Z".into()),
                    description: None,
                    points_possible: Some(10.0),
                },
                AssignmentRecord {
                    id: 2,
                    name: "HW2".into(),
                    due_at: None,
                    description: None,
                    points_possible: None,
                },
            ])
        }

        async fn submission(
            &self,
            course_id: u64,
            assignment_id: u64,
            user_id: u64,
        ) -> Result<Submission> {
            assert_eq!(user_id, ME);
            self.check("submission", course_id * 100 + assignment_id)?;
            Ok(Submission {
                score: Some(9.0),
                grade: Some("9".into()),
                workflow_state: Some("graded".into()),
                ..Default::default()
            })
        }

        async fn quizzes(&self, course_id: u64) -> Result<Vec<QuizRecord>> {
            self.check("quizzes", course_id)?;
            Ok(vec![QuizRecord {
                id: 5,
                title: "Quiz 1".into(),
                due_at: None,
                description: None,
                points_possible: Some(5.0),
            }])
        }

        async fn quiz_submissions(
            &self,
            course_id: u64,
            _quiz_id: u64,
        ) -> Result<Vec<QuizSubmissionRecord>> {
            self.check("quiz_submissions", course_id)?;
            Ok(vec![QuizSubmissionRecord {
                user_id: 7,
                score: Some(1.0),
                graded_at: None,
            }])
        }

        async fn discussion_topics(&self, course_id: u64) -> Result<Vec<DiscussionRecord>> {
            self.check("discussions", course_id)?;
            let topic = |id: u64, title: &str, author: Option<u64>| DiscussionRecord {
                id,
                title: title.into(),
                message: None,
                posted_at: None,
                author: author.map(|id| DiscussionAuthor { id: Some(id) }),
            };
            Ok(vec![
                topic(10, "Mine", Some(ME)),
                topic(11, "Theirs", Some(7)),
                topic(12, "Anonymous", None),
            ])
        }

        async fn modules(&self, course_id: u64) -> Result<Vec<ModuleRecord>> {
            self.check("modules", course_id)?;
            Ok(vec![
                ModuleRecord {
                    id: 20,
                    name: "Week 1".into(),
                },
                ModuleRecord {
                    id: 21,
                    name: "Week 2".into(),
                },
            ])
        }

        async fn module_items(&self, _course_id: u64, module_id: u64) -> Result<Vec<ModuleItem>> {
            self.check("module_items", module_id)?;
            Ok(vec![ModuleItem {
                id: 1,
                title: "Intro".into(),
                item_type: "Page".into(),
                content_id: None,
                published: Some(true),
            }])
        }

        async fn pages(&self, course_id: u64) -> Result<Vec<Page>> {
            self.check("pages", course_id)?;
            Ok(vec![Page {
                url: "syllabus".into(),
                title: "Syllabus".into(),
                body: None,
            }])
        }

        async fn gradebook_history(&self, course_id: u64) -> Result<Vec<serde_json::Value>> {
            self.check("gradebook", course_id)?;
            Ok(vec![serde_json::json!({"id": 1})])
        }
    }

    fn cutoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_courses_before_cutoff_are_skipped() {
        let api = FakeCanvas {
            courses: vec![
                course(1, "Old", Some("2024-08-20T00:00:00Z")),
                course(2, "Current", Some("2025-03-01T00:00:00Z")),
                course(3, "Undated", None),
                course(4, "Garbled", Some("fall semester")),
                course(5, "Boundary", Some("2025-01-01T00:00:00Z")),
            ],
            ..Default::default()
        };
        let fetcher = CourseFetcher::new(Arc::new(api), cutoff());

        let dataset = fetcher.collect().await.unwrap();
        let names: Vec<_> = dataset.courses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Current", "Undated", "Garbled", "Boundary"]);
        assert_eq!(dataset.user.id, ME);
    }

    #[tokio::test]
    async fn test_skipped_course_is_not_fetched() {
        let api = Arc::new(FakeCanvas {
            courses: vec![course(1, "Old", Some("2024-08-20T00:00:00Z"))],
            ..Default::default()
        });
        let fetcher = CourseFetcher::new(api.clone(), cutoff());

        let dataset = fetcher.collect().await.unwrap();
        assert!(dataset.courses.is_empty());
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_section_failures_are_isolated() {
        let api = FakeCanvas {
            courses: vec![course(1, "A", None), course(2, "B", None)],
            failing: vec![
                ("assignments", 1),
                ("pages", 1),
                ("submission", 202),
                ("module_items", 21),
            ],
            ..Default::default()
        };
        let fetcher = CourseFetcher::new(Arc::new(api), cutoff());
        let dataset = fetcher.collect().await.unwrap();

        let a = &dataset.courses[0];
        assert_eq!(
            a.assignments.failure(),
            Some("Error retrieving assignments: Canvas API error: assignments unavailable")
        );
        assert!(a.pages.is_failed());
        // Siblings of the failed sections are still collected
        assert_eq!(a.quizzes.items().len(), 1);
        assert_eq!(a.discussions.items().len(), 1);
        assert!(!a.gradebook_history.is_failed());

        let b = &dataset.courses[1];
        assert_eq!(b.assignments.items().len(), 2);
        assert!(b.assignments.items()[0].submission.data().is_some());
        assert!(b.assignments.items()[1].submission.is_failed());

        let modules = b.modules.items();
        assert!(modules[0].items.data().is_some());
        assert!(modules[1].items.is_failed());
    }

    #[tokio::test]
    async fn test_only_own_discussions_and_enrollment_are_kept() {
        let api = FakeCanvas {
            courses: vec![course(1, "A", None)],
            ..Default::default()
        };
        let dataset = CourseFetcher::new(Arc::new(api), cutoff()).collect().await.unwrap();
        let course = &dataset.courses[0];

        let titles: Vec<_> = course.discussions.items().iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Mine"]);

        let enrollment = course.enrollment.data().unwrap().as_ref().unwrap();
        assert_eq!(enrollment.user_id, ME);
    }

    #[tokio::test]
    async fn test_quiz_without_own_submission_is_not_a_failure() {
        let api = FakeCanvas {
            courses: vec![course(1, "A", None), course(2, "B", None)],
            failing: vec![("quiz_submissions", 2)],
            ..Default::default()
        };
        let dataset = CourseFetcher::new(Arc::new(api), cutoff()).collect().await.unwrap();

        assert_eq!(dataset.courses[0].quizzes.items()[0].submission, Section::Data(None));
        assert!(dataset.courses[1].quizzes.items()[0].submission.is_failed());
    }

    #[tokio::test]
    async fn test_progress_events() {
        let api = FakeCanvas {
            courses: vec![course(1, "Old", Some("2020-01-01T00:00:00Z")), course(2, "New", None)],
            ..Default::default()
        };
        let events = Mutex::new(Vec::new());
        CourseFetcher::new(Arc::new(api), cutoff())
            .collect_with_progress(|e| events.lock().unwrap().push(format!("{:?}", e)))
            .await
            .unwrap();

        let events = events.into_inner().unwrap();
        assert_eq!(events.len(), 4);
        assert!(events[1].starts_with("Skipped"));
        assert!(events[2].starts_with("Processing"));
        assert_eq!(events[3], "Finished { collected: 1 }");
    }
}
