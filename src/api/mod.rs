use axum::Json;
use axum::extract::Path;
use axum::extract::rejection::JsonRejection;
use axum::routing::{delete, post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tracing::info;

use crate::auth::{AdminUser, AuthUser, CallContext};
use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::services::{
    CompletionService, Dashboard, build_dashboard, compute_progress_percent,
    course_editor, find_next_incomplete,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/functions/addCourseCompleted", post(add_course_completed))
        .route("/functions/removeCourseCompleted", post(remove_course_completed))
        .route("/courses", get(list_courses))
        .route("/courses/{course_id}", get(get_course))
        .route("/courses/{course_id}/progress", get(course_progress))
        .route("/dashboard", get(dashboard))
        .route("/users/me", get(current_user))
        .route("/users/me/admin", post(setup_admin))
        .route("/admin/courses", post(create_course))
        .route(
            "/admin/courses/{course_id}",
            put(save_course).delete(delete_course),
        )
        .route("/admin/courses/{course_id}/modules", post(add_module))
        .route(
            "/admin/courses/{course_id}/modules/{module_id}/lessons",
            post(create_lesson),
        )
        .route(
            "/admin/courses/{course_id}/modules/{module_id}/lessons/{lesson_id}",
            put(update_lesson),
        )
        .route(
            "/admin/courses/{course_id}/modules/{module_id}/lessons/{lesson_id}/timestamps",
            post(add_timestamp),
        )
        .route(
            "/admin/courses/{course_id}/modules/{module_id}/lessons/{lesson_id}/timestamps/{index}",
            delete(remove_timestamp),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn add_course_completed(
    State(state): State<AppState>,
    ctx: CallContext,
    body: Result<Json<CompletionRequest>, JsonRejection>,
) -> Result<Json<CompletionResponse>, AppError> {
    let req = completion_body(&ctx, body)?;
    let service = CompletionService::new(state.db.clone(), state.progress.clone());
    Ok(Json(service.mark_complete(&ctx, &req).await?))
}

async fn remove_course_completed(
    State(state): State<AppState>,
    ctx: CallContext,
    body: Result<Json<CompletionRequest>, JsonRejection>,
) -> Result<Json<CompletionResponse>, AppError> {
    let req = completion_body(&ctx, body)?;
    let service = CompletionService::new(state.db.clone(), state.progress.clone());
    Ok(Json(service.mark_incomplete(&ctx, &req).await?))
}

/// Unreadable payloads from anonymous callers fall through to the service so
/// the caller is told to authenticate first.
fn completion_body(
    ctx: &CallContext,
    body: Result<Json<CompletionRequest>, JsonRejection>,
) -> Result<CompletionRequest, AppError> {
    match body {
        Ok(Json(req)) => Ok(req),
        Err(_) if ctx.auth.is_none() => Ok(CompletionRequest::default()),
        Err(rejection) => Err(AppError::InvalidArgument(rejection.body_text())),
    }
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<CourseSummary>>, AppError> {
    let courses = repository::fetch_courses(&state.db).await?;
    Ok(Json(courses.iter().map(CourseSummary::from).collect()))
}

async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let course = repository::find_course_by_id(&state.db, &course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {} does not exist", course_id)))?;
    Ok(Json(course))
}

async fn course_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<String>,
) -> Result<Json<CourseProgressView>, AppError> {
    let course = repository::find_course_by_id(&state.db, &course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {} does not exist", course_id)))?;
    let record = state
        .progress
        .fetch_progress(&user.user_id, &course_id)
        .await
        .map_err(|e| AppError::Internal(format!("failed to read progress: {}", e)))?;

    let (completed_lessons, last_updated) = match record {
        Some(r) => (r.completed_lessons, Some(r.last_updated)),
        None => Default::default(),
    };

    Ok(Json(CourseProgressView {
        progress_percent: compute_progress_percent(&course, &completed_lessons),
        next_lesson: find_next_incomplete(&course, &completed_lessons),
        course_id,
        completed_lessons,
        last_updated,
    }))
}

async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Dashboard>, AppError> {
    let courses = repository::fetch_courses(&state.db).await?;
    let progress = state
        .progress
        .fetch_user_progress(&user.user_id)
        .await
        .map_err(|e| AppError::Internal(format!("failed to read progress: {}", e)))?;
    Ok(Json(build_dashboard(&courses, &progress)))
}

async fn current_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let profile = repository::find_user(&state.db, &user.user_id)
        .await?
        .unwrap_or(UserProfile {
            user_id: user.user_id,
            email: user.email,
            role: Role::Student,
        });
    Ok(Json(profile))
}

async fn setup_admin(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    if !state.allow_admin_setup {
        return Err(AppError::PermissionDenied("admin setup is disabled".to_string()));
    }
    repository::upsert_user_role(&state.db, &user.user_id, user.email.as_deref(), Role::Admin)
        .await?;
    info!(user_id = %user.user_id, "user elevated to admin");

    let profile = repository::find_user(&state.db, &user.user_id)
        .await?
        .ok_or_else(|| AppError::Internal("role record missing after upsert".to_string()))?;
    Ok(Json(profile))
}

async fn create_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<NewCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = course_editor::create_course(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn save_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(course_id): Path<String>,
    Json(document): Json<serde_json::Value>,
) -> Result<Json<Course>, AppError> {
    let course = course_editor::save_course_document(&state.db, &course_id, document).await?;
    Ok(Json(course))
}

async fn delete_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(course_id): Path<String>,
) -> Result<StatusCode, AppError> {
    course_editor::delete_course(&state.db, &course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_module(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(course_id): Path<String>,
    Json(req): Json<NewModuleRequest>,
) -> Result<(StatusCode, Json<Module>), AppError> {
    let module = course_editor::add_module(&state.db, &course_id, req).await?;
    Ok((StatusCode::CREATED, Json(module)))
}

async fn create_lesson(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((course_id, module_id)): Path<(String, String)>,
    Json(draft): Json<LessonDraft>,
) -> Result<(StatusCode, Json<Lesson>), AppError> {
    let lesson = course_editor::save_lesson(&state.db, &course_id, &module_id, None, draft).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

async fn update_lesson(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((course_id, module_id, lesson_id)): Path<(String, String, String)>,
    Json(draft): Json<LessonDraft>,
) -> Result<Json<Lesson>, AppError> {
    let lesson =
        course_editor::save_lesson(&state.db, &course_id, &module_id, Some(&lesson_id), draft)
            .await?;
    Ok(Json(lesson))
}

async fn add_timestamp(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((course_id, module_id, lesson_id)): Path<(String, String, String)>,
    Json(req): Json<NewTimestampRequest>,
) -> Result<Json<Lesson>, AppError> {
    let lesson =
        course_editor::add_timestamp(&state.db, &course_id, &module_id, &lesson_id, req).await?;
    Ok(Json(lesson))
}

async fn remove_timestamp(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((course_id, module_id, lesson_id, index)): Path<(String, String, String, usize)>,
) -> Result<Json<Lesson>, AppError> {
    let lesson =
        course_editor::remove_timestamp(&state.db, &course_id, &module_id, &lesson_id, index)
            .await?;
    Ok(Json(lesson))
}
