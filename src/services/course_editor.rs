//! Admin authoring operations. Every edit rewrites the whole course document
//! so derived fields are recomputed on each save.

use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{
    Course, Lesson, LessonDraft, Module, NewCourseRequest, NewModuleRequest, NewTimestampRequest,
    Timestamp,
};

/// Course id derived from its title: lowercase, whitespace runs become `-`.
pub fn course_slug(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn new_token() -> String {
    Uuid::now_v7().simple().to_string()
}

async fn load_course(db: &SqlitePool, course_id: &str) -> Result<Course, AppError> {
    repository::find_course_by_id(db, course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {} does not exist", course_id)))
}

pub async fn create_course(db: &SqlitePool, req: NewCourseRequest) -> Result<Course, AppError> {
    let id = course_slug(&req.title);
    if id.is_empty() {
        return Err(AppError::InvalidArgument("course title must not be empty".to_string()));
    }

    let mut course = Course {
        id,
        title: req.title.trim().to_string(),
        description: req.description,
        thumbnail: req.thumbnail.filter(|t| !t.trim().is_empty()),
        modules: Vec::new(),
        modules_count: 0,
        duration: 0.0,
        updated_at: None,
    };
    repository::insert_course(db, &mut course).await?;
    info!(course_id = %course.id, "course created");
    Ok(course)
}

/// Replace a whole course document. The id in the path wins over the body.
pub async fn save_course_document(
    db: &SqlitePool,
    course_id: &str,
    mut document: serde_json::Value,
) -> Result<Course, AppError> {
    if let Some(fields) = document.as_object_mut() {
        fields.insert("id".to_string(), serde_json::Value::from(course_id));
    }
    let mut course = Course::from_value(document)?;
    if !repository::course_exists(db, course_id).await? {
        return Err(AppError::NotFound(format!("course {} does not exist", course_id)));
    }
    repository::upsert_course(db, &mut course).await?;
    info!(course_id, modules = course.modules_count, "course saved");
    Ok(course)
}

pub async fn delete_course(db: &SqlitePool, course_id: &str) -> Result<(), AppError> {
    if !repository::delete_course(db, course_id).await? {
        return Err(AppError::NotFound(format!("course {} does not exist", course_id)));
    }
    info!(course_id, "course deleted");
    Ok(())
}

pub async fn add_module(
    db: &SqlitePool,
    course_id: &str,
    req: NewModuleRequest,
) -> Result<Module, AppError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidArgument("module title must not be empty".to_string()));
    }

    let mut course = load_course(db, course_id).await?;
    let module = Module {
        id: new_token(),
        title: title.to_string(),
        lessons: Vec::new(),
    };
    course.modules.push(module.clone());
    repository::upsert_course(db, &mut course).await?;
    info!(course_id, module_id = %module.id, "module added");
    Ok(module)
}

/// Append a new lesson (`lesson_id == None`) or replace an existing one,
/// keeping its id.
pub async fn save_lesson(
    db: &SqlitePool,
    course_id: &str,
    module_id: &str,
    lesson_id: Option<&str>,
    draft: LessonDraft,
) -> Result<Lesson, AppError> {
    if draft.title.trim().is_empty() {
        return Err(AppError::InvalidArgument("lesson title must not be empty".to_string()));
    }

    let mut course = load_course(db, course_id).await?;
    let module = course
        .module_mut(module_id)
        .ok_or_else(|| AppError::NotFound(format!("module {} does not exist", module_id)))?;

    let lesson = Lesson {
        id: lesson_id.map(str::to_string).unwrap_or_else(new_token),
        title: draft.title.trim().to_string(),
        description: draft.description.filter(|d| !d.is_empty()),
        video_url: draft.video_url,
        duration: draft.duration,
        timestamps: draft.timestamps,
    };

    match lesson_id {
        Some(id) => {
            let slot = module
                .lesson_mut(id)
                .ok_or_else(|| AppError::NotFound(format!("lesson {} does not exist", id)))?;
            *slot = lesson;
        }
        None => module.lessons.push(lesson),
    }

    let lesson_id = lesson_id.map(str::to_string);
    repository::upsert_course(db, &mut course).await?;

    let saved = match lesson_id {
        Some(id) => find_lesson(&course, module_id, &id),
        None => course.module(module_id).and_then(|m| m.lessons.last()).cloned(),
    }
    .ok_or_else(|| AppError::Internal("saved lesson vanished".to_string()))?;

    info!(course_id, module_id, lesson_id = %saved.id, duration = saved.duration, "lesson saved");
    Ok(saved)
}

pub async fn add_timestamp(
    db: &SqlitePool,
    course_id: &str,
    module_id: &str,
    lesson_id: &str,
    req: NewTimestampRequest,
) -> Result<Lesson, AppError> {
    let time = req
        .time
        .and_then(|t| u32::try_from(t).ok())
        .ok_or_else(|| {
            AppError::InvalidArgument("timestamp time must be a non-negative number of seconds".to_string())
        })?;
    let label = req.label.trim();
    if label.is_empty() {
        return Err(AppError::InvalidArgument("timestamp label must not be empty".to_string()));
    }

    let timestamp = Timestamp {
        time,
        label: label.to_string(),
    };
    edit_lesson(db, course_id, module_id, lesson_id, |lesson| {
        lesson.insert_timestamp(timestamp);
        Ok(())
    })
    .await
}

pub async fn remove_timestamp(
    db: &SqlitePool,
    course_id: &str,
    module_id: &str,
    lesson_id: &str,
    index: usize,
) -> Result<Lesson, AppError> {
    edit_lesson(db, course_id, module_id, lesson_id, |lesson| {
        if index >= lesson.timestamps.len() {
            return Err(AppError::NotFound(format!("timestamp {} does not exist", index)));
        }
        lesson.timestamps.remove(index);
        Ok(())
    })
    .await
}

async fn edit_lesson<F>(
    db: &SqlitePool,
    course_id: &str,
    module_id: &str,
    lesson_id: &str,
    edit: F,
) -> Result<Lesson, AppError>
where
    F: FnOnce(&mut Lesson) -> Result<(), AppError>,
{
    let mut course = load_course(db, course_id).await?;
    let lesson = course
        .module_mut(module_id)
        .ok_or_else(|| AppError::NotFound(format!("module {} does not exist", module_id)))?
        .lesson_mut(lesson_id)
        .ok_or_else(|| AppError::NotFound(format!("lesson {} does not exist", lesson_id)))?;
    edit(lesson)?;

    repository::upsert_course(db, &mut course).await?;
    find_lesson(&course, module_id, lesson_id)
        .ok_or_else(|| AppError::Internal("edited lesson vanished".to_string()))
}

fn find_lesson(course: &Course, module_id: &str, lesson_id: &str) -> Option<Lesson> {
    course
        .module(module_id)?
        .lessons
        .iter()
        .find(|l| l.id == lesson_id)
        .cloned()
}
