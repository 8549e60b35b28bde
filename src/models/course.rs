use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::error::AppError;
use crate::services::course_tree::derive_course_stats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub modules_count: usize,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub video_url: String,
    /// Seconds, as measured by the client's media element. May be stale or zero.
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub duration: f64,
    #[serde(default)]
    pub timestamps: Vec<Timestamp>,
}

/// A labeled chapter offset inside a lesson video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub time: u32,
    pub label: String,
}

impl Course {
    /// Parse and validate a course document coming from a client or the store.
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        let course: Course = serde_json::from_value(value)
            .map_err(|e| AppError::InvalidArgument(format!("malformed course document: {}", e)))?;
        course.validate()?;
        Ok(course)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.id.trim().is_empty() {
            return Err(AppError::InvalidArgument("course id must not be empty".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(AppError::InvalidArgument(format!("course {} has no title", self.id)));
        }
        let mut module_ids = HashSet::new();
        for module in &self.modules {
            if module.id.trim().is_empty() {
                return Err(AppError::InvalidArgument(format!(
                    "course {} has a module without id",
                    self.id
                )));
            }
            if !module_ids.insert(module.id.as_str()) {
                return Err(AppError::InvalidArgument(format!(
                    "course {} has more than one module {}",
                    self.id, module.id
                )));
            }
            let mut lesson_ids = HashSet::new();
            for lesson in &module.lessons {
                if lesson.id.trim().is_empty() {
                    return Err(AppError::InvalidArgument(format!(
                        "module {} has a lesson without id",
                        module.id
                    )));
                }
                if !lesson_ids.insert(lesson.id.as_str()) {
                    return Err(AppError::InvalidArgument(format!(
                        "module {} has more than one lesson {}",
                        module.id, lesson.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Recompute `modules_count` and `duration` and restore timestamp ordering.
    /// Called before every save.
    pub fn refresh_derived(&mut self) {
        for lesson in self.modules.iter_mut().flat_map(|m| m.lessons.iter_mut()) {
            lesson.timestamps.sort_by_key(|t| t.time);
        }
        let stats = derive_course_stats(self);
        self.modules_count = stats.modules_count;
        self.duration = stats.total_duration_seconds;
    }

    pub fn module(&self, module_id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    pub fn module_mut(&mut self, module_id: &str) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| m.id == module_id)
    }

    /// Every lesson id, in module order then lesson order.
    pub fn lesson_ids(&self) -> impl Iterator<Item = &str> {
        self.modules
            .iter()
            .flat_map(|m| m.lessons.iter())
            .map(|l| l.id.as_str())
    }
}

impl Module {
    pub fn lesson_mut(&mut self, lesson_id: &str) -> Option<&mut Lesson> {
        self.lessons.iter_mut().find(|l| l.id == lesson_id)
    }
}

impl Lesson {
    /// Insert keeping `timestamps` sorted by offset; equal offsets keep insertion order.
    pub fn insert_timestamp(&mut self, timestamp: Timestamp) -> usize {
        let index = self.timestamps.partition_point(|t| t.time <= timestamp.time);
        self.timestamps.insert(index, timestamp);
        index
    }
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(seconds_from_value).unwrap_or(0.0))
}

fn seconds_from_value(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}

/// Catalog card view of a course.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub modules_count: usize,
    pub duration: f64,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id.clone(),
            title: course.title.clone(),
            description: course.description.clone(),
            thumbnail: course.thumbnail.clone(),
            modules_count: course.modules_count,
            duration: course.duration,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CourseRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub modules: String,
    pub modules_count: i64,
    pub duration: f64,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CourseRow> for Course {
    type Error = AppError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        let modules: Vec<Module> = serde_json::from_str(&row.modules).map_err(|e| {
            AppError::InvalidArgument(format!("stored course {} has malformed modules: {}", row.id, e))
        })?;
        let course = Course {
            id: row.id,
            title: row.title,
            description: row.description,
            thumbnail: row.thumbnail,
            modules,
            modules_count: usize::try_from(row.modules_count).unwrap_or(0),
            duration: row.duration,
            updated_at: Some(row.updated_at),
        };
        course.validate()?;
        Ok(course)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCourseRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewModuleRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub video_url: String,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub duration: f64,
    #[serde(default)]
    pub timestamps: Vec<Timestamp>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTimestampRequest {
    pub time: Option<i64>,
    #[serde(default)]
    pub label: String,
}
