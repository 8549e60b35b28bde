use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;

use crate::error::AppError;
use crate::models::{Course, CourseRow, Role, UserProfile};

const COURSE_COLUMNS: &str =
    "id, title, description, thumbnail, modules, modules_count, duration, updated_at";

/// All readable courses in catalog order (by id). Rows holding a malformed
/// document are logged and left out so one bad course cannot take down the
/// catalog or the dashboard.
pub async fn fetch_courses(db: &SqlitePool) -> Result<Vec<Course>, AppError> {
    let rows = sqlx::query_as::<_, CourseRow>(&format!(
        "SELECT {} FROM courses ORDER BY id",
        COURSE_COLUMNS
    ))
    .fetch_all(db)
    .await?;

    let courses = rows
        .into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            match Course::try_from(row) {
                Ok(course) => Some(course),
                Err(e) => {
                    warn!(course_id = %id, "skipping unreadable course: {}", e);
                    None
                }
            }
        })
        .collect();
    Ok(courses)
}

pub async fn find_course_by_id(db: &SqlitePool, id: &str) -> Result<Option<Course>, AppError> {
    let row = sqlx::query_as::<_, CourseRow>(&format!(
        "SELECT {} FROM courses WHERE id = ?1",
        COURSE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(Course::try_from).transpose()
}

pub async fn course_exists(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM courses WHERE id = ?1")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(found.is_some())
}

/// Write the whole course document, recomputing derived fields first.
pub async fn upsert_course(db: &SqlitePool, course: &mut Course) -> Result<(), AppError> {
    course.refresh_derived();
    let now = Utc::now();
    let modules = serde_json::to_string(&course.modules)
        .map_err(|e| AppError::Internal(format!("failed to encode modules: {}", e)))?;
    let modules_count = i64::try_from(course.modules_count)
        .map_err(|_| AppError::InvalidArgument("too many modules".to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO courses
            (id, title, description, thumbnail, modules, modules_count, duration, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            thumbnail = excluded.thumbnail,
            modules = excluded.modules,
            modules_count = excluded.modules_count,
            duration = excluded.duration,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&course.id)
    .bind(&course.title)
    .bind(&course.description)
    .bind(&course.thumbnail)
    .bind(modules)
    .bind(modules_count)
    .bind(course.duration)
    .bind(now)
    .execute(db)
    .await?;

    course.updated_at = Some(now);
    Ok(())
}

/// Insert a course that must not exist yet.
pub async fn insert_course(db: &SqlitePool, course: &mut Course) -> Result<(), AppError> {
    if course_exists(db, &course.id).await? {
        return Err(AppError::Conflict(format!("course {} already exists", course.id)));
    }
    upsert_course(db, course).await
}

pub async fn delete_course(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn find_user(db: &SqlitePool, id: &str) -> Result<Option<UserProfile>, AppError> {
    let row = sqlx::query_as::<_, (String, Option<String>, String)>(
        "SELECT id, email, role FROM users WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(|(user_id, email, role)| {
        let role = role
            .parse::<Role>()
            .map_err(|e| AppError::Internal(format!("user {}: {}", user_id, e)))?;
        Ok(UserProfile { user_id, email, role })
    })
    .transpose()
}

/// Create or update a role record. A `None` email keeps the stored one.
pub async fn upsert_user_role(
    db: &SqlitePool,
    id: &str,
    email: Option<&str>,
    role: Role,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, email, role, created_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(id) DO UPDATE SET
            email = COALESCE(excluded.email, users.email),
            role = excluded.role
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(role.as_str())
    .bind(Utc::now())
    .execute(db)
    .await?;

    Ok(())
}
