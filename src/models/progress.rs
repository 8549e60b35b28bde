use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::course_tree::LessonLocator;

/// Completed lessons of one user in one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub completed_lessons: BTreeSet<String>,
    pub last_updated: DateTime<Utc>,
}

impl ProgressRecord {
    pub fn is_empty(&self) -> bool {
        self.completed_lessons.is_empty()
    }
}

/// Payload of the two completion functions. Fields are optional so that a
/// missing id surfaces as `invalid-argument` rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub lesson_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionResponse {
    pub success: bool,
    pub message: String,
}

/// What the lesson viewer needs for one course.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressView {
    pub course_id: String,
    pub completed_lessons: BTreeSet<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub progress_percent: u32,
    pub next_lesson: Option<LessonLocator>,
}
