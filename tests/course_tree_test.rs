mod common;

use std::collections::BTreeSet;

use lessonhub::error::AppError;
use lessonhub::models::{Course, Lesson, Timestamp};
use lessonhub::services::{compute_progress_percent, derive_course_stats, find_next_incomplete};
use serde_json::json;

use common::{course, intro_course};

fn completed(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[test]
fn stats_sum_all_lesson_durations() {
    let course = course(
        "c",
        &[("m1", &[("a", 600.0), ("b", 330.5)]), ("m2", &[]), ("m3", &[("c", 69.5)])],
    );

    let stats = derive_course_stats(&course);
    assert_eq!(stats.modules_count, 3);
    assert_eq!(stats.total_duration_seconds, 1000.0);
    assert_eq!(course.modules_count, 3);
    assert_eq!(course.duration, 1000.0);
}

#[test]
fn unreadable_durations_count_as_zero() {
    let course = Course::from_value(json!({
        "id": "c",
        "title": "Messy",
        "modules": [{
            "id": "m1",
            "title": "M1",
            "lessons": [
                { "id": "a", "title": "A", "duration": "120.5" },
                { "id": "b", "title": "B", "duration": "10:00" },
                { "id": "c", "title": "C", "duration": null },
                { "id": "d", "title": "D" },
                { "id": "e", "title": "E", "duration": -30 },
                { "id": "f", "title": "F", "duration": 60 }
            ]
        }]
    }))
    .expect("lenient durations still parse");

    assert_eq!(derive_course_stats(&course).total_duration_seconds, 180.5);
}

#[test]
fn documents_without_ids_are_rejected() {
    let missing_lesson_id = Course::from_value(json!({
        "id": "c",
        "title": "T",
        "modules": [{ "id": "m1", "title": "M1", "lessons": [{ "id": "", "title": "L" }] }]
    }));
    assert!(matches!(missing_lesson_id, Err(AppError::InvalidArgument(_))));

    let missing_title = Course::from_value(json!({ "id": "c" }));
    assert!(matches!(missing_title, Err(AppError::InvalidArgument(_))));
}

#[test]
fn next_incomplete_walks_modules_then_lessons() {
    let course = course(
        "c",
        &[("m1", &[("a", 1.0), ("b", 1.0)]), ("m2", &[("c", 1.0), ("d", 1.0)])],
    );

    let next = find_next_incomplete(&course, &completed(&[])).expect("a lesson is left");
    assert_eq!(next.lesson_id, "a");
    assert_eq!(next.module_id, "m1");

    let next = find_next_incomplete(&course, &completed(&["a", "b", "d"])).expect("c is left");
    assert_eq!(next.lesson_id, "c");
    assert_eq!(next.module_id, "m2");
    assert_eq!(next.module_title, "Module m2");

    // Out-of-order completion still picks the earliest gap.
    let next = find_next_incomplete(&course, &completed(&["b", "c"])).expect("a is left");
    assert_eq!(next.lesson_id, "a");
}

#[test]
fn next_incomplete_is_none_when_done_or_empty() {
    let course = course("c", &[("m1", &[("a", 1.0), ("b", 1.0)])]);
    assert_eq!(find_next_incomplete(&course, &completed(&["a", "b", "stale"])), None);

    let empty = common::course("empty", &[("m1", &[])]);
    assert_eq!(find_next_incomplete(&empty, &completed(&[])), None);
}

#[test]
fn percent_bounds_and_monotonicity() {
    let empty = course("empty", &[]);
    assert_eq!(compute_progress_percent(&empty, &completed(&["x"])), 0);

    let course = course("c", &[("m1", &[("a", 1.0), ("b", 1.0), ("c", 1.0)])]);
    let mut done = BTreeSet::new();
    let mut last = compute_progress_percent(&course, &done);
    assert_eq!(last, 0);

    for id in ["stale", "a", "b", "c"] {
        done.insert(id.to_string());
        let now = compute_progress_percent(&course, &done);
        assert!(now >= last, "{} dropped below {}", now, last);
        last = now;
    }
    assert_eq!(last, 100);
    assert_eq!(compute_progress_percent(&course, &completed(&["a"])), 33);
    assert_eq!(compute_progress_percent(&course, &completed(&["a", "b"])), 67);
}

#[test]
fn worked_example_first_lesson_then_second() {
    let course = intro_course();

    let next = find_next_incomplete(&course, &completed(&[])).expect("l1 is next");
    assert_eq!(next.lesson_id, "l1");

    let done = completed(&["l1"]);
    let next = find_next_incomplete(&course, &done).expect("l2 is next");
    assert_eq!(next.lesson_id, "l2");
    assert_eq!(compute_progress_percent(&course, &done), 50);
}

#[test]
fn timestamps_stay_sorted_on_insert() {
    let mut lesson = Lesson {
        id: "l1".to_string(),
        title: "L1".to_string(),
        description: None,
        video_url: String::new(),
        duration: 300.0,
        timestamps: Vec::new(),
    };

    for (time, label) in [(120, "middle"), (10, "intro"), (240, "outro"), (120, "middle again")] {
        lesson.insert_timestamp(Timestamp {
            time,
            label: label.to_string(),
        });
    }

    let labels: Vec<_> = lesson.timestamps.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, ["intro", "middle", "middle again", "outro"]);
}
