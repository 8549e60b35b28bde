pub mod completion;
pub mod course_editor;
pub mod course_tree;
pub mod dashboard;

pub use completion::CompletionService;
pub use course_tree::{
    CourseStats, LessonLocator, compute_progress_percent, derive_course_stats,
    find_next_incomplete,
};
pub use dashboard::{ContinueWatching, Dashboard, build_dashboard};
