use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Course, ProgressRecord};
use crate::services::course_tree::{
    LessonLocator, compute_progress_percent, find_next_incomplete, sanitize_seconds,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub courses_in_progress: usize,
    pub completed_lessons_total: usize,
    pub hours_watched: f64,
    pub continue_watching: Option<ContinueWatching>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueWatching {
    pub course_id: String,
    pub course_title: String,
    pub next_lesson: LessonLocator,
    pub progress_percent: u32,
}

/// Cross-course statistics for one user.
///
/// `courses` order matters: `continue_watching` is the first course, in that
/// order, with some progress and at least one lesson left. Records whose
/// course is not in `courses` are ignored.
pub fn build_dashboard(
    courses: &[Course],
    progress_by_course_id: &HashMap<String, ProgressRecord>,
) -> Dashboard {
    let mut courses_in_progress = 0;
    let mut completed_lessons_total = 0;
    let mut seconds_watched = 0.0;
    let mut continue_watching = None;

    for course in courses {
        let Some(record) = progress_by_course_id.get(&course.id) else {
            continue;
        };
        if record.is_empty() {
            continue;
        }

        courses_in_progress += 1;
        completed_lessons_total += record.completed_lessons.len();
        seconds_watched += course
            .modules
            .iter()
            .flat_map(|m| m.lessons.iter())
            .filter(|l| record.completed_lessons.contains(&l.id))
            .map(|l| sanitize_seconds(l.duration))
            .sum::<f64>();

        if continue_watching.is_none() {
            continue_watching =
                find_next_incomplete(course, &record.completed_lessons).map(|next_lesson| {
                    ContinueWatching {
                        course_id: course.id.clone(),
                        course_title: course.title.clone(),
                        next_lesson,
                        progress_percent: compute_progress_percent(
                            course,
                            &record.completed_lessons,
                        ),
                    }
                });
        }
    }

    Dashboard {
        courses_in_progress,
        completed_lessons_total,
        hours_watched: (seconds_watched / 3600.0 * 10.0).round() / 10.0,
        continue_watching,
    }
}
