pub mod course;
pub mod progress;
pub mod user;

pub use course::{
    Course, CourseRow, CourseSummary, Lesson, LessonDraft, Module, NewCourseRequest,
    NewModuleRequest, NewTimestampRequest, Timestamp,
};
pub use progress::{CompletionRequest, CompletionResponse, CourseProgressView, ProgressRecord};
pub use user::{Role, UserProfile};
