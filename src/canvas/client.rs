//! HTTP client for the Canvas REST API.

use super::types::{
    AssignmentRecord, CourseRecord, DiscussionRecord, ModuleRecord, QuizRecord,
    QuizSubmissionList, QuizSubmissionRecord,
};
use super::CourseApi;
use crate::config::CanvasSettings;
use crate::dataset::{Enrollment, ModuleItem, Page, Submission, User};
use crate::error::{EduError, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, LINK};
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

static NEXT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]*)>\s*;\s*rel="next""#).expect("Invalid regex"));

/// Extract the `rel="next"` URL from a Canvas `Link` header.
pub fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    NEXT_LINK
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Canvas API client authenticated with a personal access token.
pub struct CanvasClient {
    http: reqwest::Client,
    base: Url,
    token: String,
    per_page: u32,
}

impl CanvasClient {
    /// Create a client for the Canvas instance at `api_url`.
    pub fn new(api_url: &str, token: &str, per_page: u32, timeout: Duration) -> Result<Self> {
        let root = format!("{}/", api_url.trim_end_matches('/'));
        let base = Url::parse(&root)
            .and_then(|u| u.join("api/v1/"))
            .map_err(|e| EduError::Config(format!("Invalid Canvas API URL '{}': {}", api_url, e)))?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base,
            token: token.to_string(),
            per_page,
        })
    }

    /// Create a client from settings, resolving the access token.
    pub fn from_settings(settings: &CanvasSettings) -> Result<Self> {
        let token = settings.resolve_api_key().ok_or_else(|| {
            EduError::Config(
                "No Canvas API key configured. Set CANVAS_API_KEY or canvas.api_key.".to_string(),
            )
        })?;

        Self::new(
            &settings.api_url,
            &token,
            settings.per_page,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| EduError::Canvas(format!("Invalid endpoint '{}': {}", path, e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_url<T: DeserializeOwned>(&self, url: &str) -> Result<(T, Option<String>)> {
        debug!("GET {}", url);
        let response = self.http.get(url).bearer_auth(&self.token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EduError::Canvas(format!(
                "GET {} returned {}: {}",
                url,
                status,
                body.trim()
            )));
        }

        let next = next_page_url(response.headers());
        let parsed = response.json::<T>().await?;
        Ok((parsed, next))
    }

    async fn get_one<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.endpoint(path, query)?;
        let (parsed, _) = self.get_url(url.as_str()).await?;
        Ok(parsed)
    }

    /// Fetch every page of a paginated endpoint.
    async fn get_pages<P: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<P>> {
        let per_page = self.per_page.to_string();
        let mut params = query.to_vec();
        params.push(("per_page", per_page.as_str()));

        let mut next = Some(self.endpoint(path, &params)?.to_string());
        let mut pages = Vec::new();

        while let Some(url) = next {
            let (page, next_url) = self.get_url::<P>(&url).await?;
            pages.push(page);
            next = next_url;
        }

        Ok(pages)
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let pages = self.get_pages::<Vec<T>>(path, query).await?;
        Ok(pages.into_iter().flatten().collect())
    }
}

#[async_trait]
impl CourseApi for CanvasClient {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<User> {
        self.get_one("users/self", &[]).await
    }

    #[instrument(skip(self))]
    async fn courses(&self) -> Result<Vec<CourseRecord>> {
        self.get_list("courses", &[]).await
    }

    async fn student_enrollments(&self, course_id: u64) -> Result<Vec<Enrollment>> {
        self.get_list(
            &format!("courses/{}/enrollments", course_id),
            &[("type[]", "StudentEnrollment")],
        )
        .await
    }

    async fn assignments(&self, course_id: u64) -> Result<Vec<AssignmentRecord>> {
        self.get_list(&format!("courses/{}/assignments", course_id), &[]).await
    }

    async fn submission(
        &self,
        course_id: u64,
        assignment_id: u64,
        user_id: u64,
    ) -> Result<Submission> {
        self.get_one(
            &format!(
                "courses/{}/assignments/{}/submissions/{}",
                course_id, assignment_id, user_id
            ),
            &[("include[]", "submission_comments")],
        )
        .await
    }

    async fn quizzes(&self, course_id: u64) -> Result<Vec<QuizRecord>> {
        self.get_list(&format!("courses/{}/quizzes", course_id), &[]).await
    }

    async fn quiz_submissions(
        &self,
        course_id: u64,
        quiz_id: u64,
    ) -> Result<Vec<QuizSubmissionRecord>> {
        let pages = self
            .get_pages::<QuizSubmissionList>(
                &format!("courses/{}/quizzes/{}/submissions", course_id, quiz_id),
                &[],
            )
            .await?;
        Ok(pages.into_iter().flat_map(|p| p.quiz_submissions).collect())
    }

    async fn discussion_topics(&self, course_id: u64) -> Result<Vec<DiscussionRecord>> {
        self.get_list(&format!("courses/{}/discussion_topics", course_id), &[]).await
    }

    async fn modules(&self, course_id: u64) -> Result<Vec<ModuleRecord>> {
        self.get_list(&format!("courses/{}/modules", course_id), &[]).await
    }

    async fn module_items(&self, course_id: u64, module_id: u64) -> Result<Vec<ModuleItem>> {
        self.get_list(
            &format!("courses/{}/modules/{}/items", course_id, module_id),
            &[],
        )
        .await
    }

    async fn pages(&self, course_id: u64) -> Result<Vec<Page>> {
        self.get_list(&format!("courses/{}/pages", course_id), &[]).await
    }

    async fn gradebook_history(&self, course_id: u64) -> Result<Vec<serde_json::Value>> {
        self.get_list(&format!("courses/{}/gradebook_history/feed", course_id), &[]).await
    }
}
