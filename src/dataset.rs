//! The persisted course dataset.
//!
//! Produced by the fetcher, consumed by the flattener and the summary
//! endpoint. Every per-course section is a [`Section`]: either the collected
//! data or the reason it could not be collected.

use crate::error::{EduError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Outcome of collecting one resource.
///
/// Serialized untagged, so a failure appears in the dataset file as a plain
/// error string in place of the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Section<T> {
    Data(T),
    Failed(String),
}

impl<T> Section<T> {
    /// Borrow the data if collection succeeded.
    pub fn data(&self) -> Option<&T> {
        match self {
            Section::Data(d) => Some(d),
            Section::Failed(_) => None,
        }
    }

    /// The failure reason, if collection failed.
    pub fn failure(&self) -> Option<&str> {
        match self {
            Section::Data(_) => None,
            Section::Failed(reason) => Some(reason),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Section::Failed(_))
    }
}

impl<T> Section<Vec<T>> {
    /// Items of a list section; a failed section has none.
    pub fn items(&self) -> &[T] {
        match self {
            Section::Data(items) => items,
            Section::Failed(_) => &[],
        }
    }
}

impl<T: Default> Default for Section<T> {
    fn default() -> Self {
        Section::Data(T::default())
    }
}

/// Root of the dataset file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub user: User,
    #[serde(default)]
    pub courses: Vec<Course>,
}

/// The authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub sortable_name: Option<String>,
    #[serde(default)]
    pub login_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_at: Option<String>,
    #[serde(default)]
    pub end_at: Option<String>,
    /// `Data(None)` when the user has no student enrollment in the course.
    #[serde(default)]
    pub enrollment: Section<Option<Enrollment>>,
    #[serde(default)]
    pub assignments: Section<Vec<Assignment>>,
    #[serde(default)]
    pub quizzes: Section<Vec<Quiz>>,
    #[serde(default)]
    pub discussions: Section<Vec<Discussion>>,
    #[serde(default)]
    pub modules: Section<Vec<Module>>,
    #[serde(default)]
    pub pages: Section<Vec<Page>>,
    #[serde(default)]
    pub gradebook_history: Section<Vec<serde_json::Value>>,
}

impl Course {
    /// A course with the given identity and every section empty.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            course_code: None,
            description: None,
            start_at: None,
            end_at: None,
            enrollment: Section::Data(None),
            assignments: Section::default(),
            quizzes: Section::default(),
            discussions: Section::default(),
            modules: Section::default(),
            pages: Section::default(),
            gradebook_history: Section::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub user_id: u64,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub grades: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub points_possible: Option<f64>,
    #[serde(default)]
    pub submission: Section<Submission>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub workflow_state: Option<String>,
    #[serde(default)]
    pub submission_comments: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub points_possible: Option<f64>,
    /// `Data(None)` when the user has not taken the quiz.
    #[serde(default)]
    pub submission: Section<Option<QuizSubmission>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizSubmission {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub graded_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub posted_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: u64,
    pub name: String,
    pub items: Section<Vec<ModuleItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleItem {
    pub id: u64,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub content_id: Option<u64>,
    #[serde(default)]
    pub published: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

impl Dataset {
    /// Load a dataset file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EduError::Dataset(format!(
                "Dataset file not found: {}. Run 'eduai fetch' first.",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let dataset: Dataset = serde_json::from_str(&content)?;
        debug!("Loaded dataset with {} courses from {:?}", dataset.courses.len(), path);
        Ok(dataset)
    }

    /// Write the dataset as one JSON document.
    ///
    /// The file is written to a temporary sibling and renamed into place, so
    /// readers never observe a partial dataset.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let content = serde_json::to_string_pretty(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        std::io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.persist(path).map_err(|e| EduError::Io(e.error))?;

        info!("Wrote dataset with {} courses to {:?}", self.courses.len(), path);
        Ok(())
    }
}
