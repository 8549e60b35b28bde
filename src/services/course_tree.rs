//! Read-only views derived from a course document.
//!
//! Nothing here fails: missing durations count as zero and an empty course
//! simply has no next lesson.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::Course;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStats {
    pub modules_count: usize,
    pub total_duration_seconds: f64,
}

/// Position of a lesson inside its course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonLocator {
    pub module_id: String,
    pub module_title: String,
    pub lesson_id: String,
    pub lesson_title: String,
}

pub fn derive_course_stats(course: &Course) -> CourseStats {
    let total_duration_seconds = course
        .modules
        .iter()
        .flat_map(|m| m.lessons.iter())
        .map(|l| sanitize_seconds(l.duration))
        .sum();

    CourseStats {
        modules_count: course.modules.len(),
        total_duration_seconds,
    }
}

/// First lesson, in module order then lesson order, not in `completed`.
pub fn find_next_incomplete(course: &Course, completed: &BTreeSet<String>) -> Option<LessonLocator> {
    course.modules.iter().find_map(|module| {
        module
            .lessons
            .iter()
            .find(|lesson| !completed.contains(&lesson.id))
            .map(|lesson| LessonLocator {
                module_id: module.id.clone(),
                module_title: module.title.clone(),
                lesson_id: lesson.id.clone(),
                lesson_title: lesson.title.clone(),
            })
    })
}

/// `round(100 * |completed ∩ lessons| / |lessons|)`, halves rounding up.
/// Ids in `completed` that no longer exist in the course are ignored.
pub fn compute_progress_percent(course: &Course, completed: &BTreeSet<String>) -> u32 {
    let (total, done) = course.lesson_ids().fold((0u64, 0u64), |(total, done), id| {
        (total + 1, done + u64::from(completed.contains(id)))
    });
    if total == 0 {
        return 0;
    }
    // Integer half-up rounding of 100 * done / total.
    ((200 * done + total) / (2 * total)) as u32
}

pub(crate) fn sanitize_seconds(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 { seconds } else { 0.0 }
}
