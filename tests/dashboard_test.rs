mod common;

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use lessonhub::models::ProgressRecord;
use lessonhub::services::build_dashboard;

use common::{course, intro_course};

fn record(ids: &[&str]) -> ProgressRecord {
    ProgressRecord {
        completed_lessons: ids.iter().map(|s| s.to_string()).collect(),
        last_updated: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
    }
}

#[test]
fn two_courses_one_started() {
    let courses = vec![intro_course(), course("other", &[("m1", &[("x", 900.0)])])];
    let progress = HashMap::from([
        ("intro".to_string(), record(&["l1"])),
        ("other".to_string(), record(&[])),
    ]);

    let dashboard = build_dashboard(&courses, &progress);

    assert_eq!(dashboard.courses_in_progress, 1);
    assert_eq!(dashboard.completed_lessons_total, 1);
    assert_eq!(dashboard.hours_watched, 0.2);

    let next = dashboard.continue_watching.expect("intro is in progress");
    assert_eq!(next.course_id, "intro");
    assert_eq!(next.next_lesson.lesson_id, "l2");
    assert_eq!(next.progress_percent, 50);
}

#[test]
fn empty_inputs_give_zeroes() {
    let dashboard = build_dashboard(&[], &HashMap::new());
    assert_eq!(dashboard.courses_in_progress, 0);
    assert_eq!(dashboard.completed_lessons_total, 0);
    assert_eq!(dashboard.hours_watched, 0.0);
    assert!(dashboard.continue_watching.is_none());

    let courses = vec![intro_course()];
    let dashboard = build_dashboard(&courses, &HashMap::new());
    assert_eq!(dashboard.courses_in_progress, 0);
    assert!(dashboard.continue_watching.is_none());
}

#[test]
fn finished_courses_are_skipped_for_continue_watching() {
    let courses = vec![
        course("done", &[("m1", &[("a", 1800.0), ("b", 1800.0)])]),
        course("half", &[("m1", &[("c", 360.0), ("d", 360.0)])]),
        course("later", &[("m1", &[("e", 60.0), ("f", 60.0)])]),
    ];
    let progress = HashMap::from([
        ("done".to_string(), record(&["a", "b"])),
        ("half".to_string(), record(&["c"])),
        ("later".to_string(), record(&["e"])),
    ]);

    let dashboard = build_dashboard(&courses, &progress);

    assert_eq!(dashboard.courses_in_progress, 3);
    assert_eq!(dashboard.completed_lessons_total, 4);
    // 3600 + 360 + 60 seconds
    assert_eq!(dashboard.hours_watched, 1.1);

    let next = dashboard.continue_watching.expect("half is the first unfinished course");
    assert_eq!(next.course_id, "half");
    assert_eq!(next.next_lesson.lesson_id, "d");
}

#[test]
fn stale_ids_count_as_completed_but_not_as_watched_time() {
    let courses = vec![intro_course()];
    let progress = HashMap::from([
        ("intro".to_string(), record(&["l1", "deleted-lesson"])),
        ("not-in-catalog".to_string(), record(&["zzz"])),
    ]);

    let dashboard = build_dashboard(&courses, &progress);

    assert_eq!(dashboard.courses_in_progress, 1);
    assert_eq!(dashboard.completed_lessons_total, 2);
    assert_eq!(dashboard.hours_watched, 0.2);
    assert_eq!(dashboard.continue_watching.map(|c| c.progress_percent), Some(50));
}

#[test]
fn output_is_deterministic() {
    let courses = vec![
        intro_course(),
        course("b", &[("m1", &[("x", 10.0), ("y", 20.0)]), ("m2", &[("z", 30.0)])]),
    ];
    let progress = HashMap::from([
        ("b".to_string(), record(&["y", "z"])),
        ("intro".to_string(), record(&["l2"])),
    ]);

    let first = serde_json::to_vec(&build_dashboard(&courses, &progress)).unwrap();
    let second = serde_json::to_vec(&build_dashboard(&courses, &progress)).unwrap();
    assert_eq!(first, second);

    let value: serde_json::Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(value["continueWatching"]["courseId"], "intro");
    assert_eq!(value["continueWatching"]["nextLesson"]["lessonId"], "l1");
}
