#![allow(dead_code)]

use std::sync::Arc;

use lessonhub::auth::{AuthConfig, AuthUser, CallContext};
use lessonhub::db::{self, repository};
use lessonhub::models::{CompletionRequest, Course};
use lessonhub::state::AppState;
use lessonhub::store::SqliteProgressStore;
use serde_json::json;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

pub const JWT_SECRET: &str = "test-secret";

/// In-memory database; a single connection keeps every query on the same database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    db::migrate(&pool).await.expect("Failed to run migrations");
    pool
}

pub fn app_state(pool: SqlitePool, allow_admin_setup: bool) -> AppState {
    AppState {
        db: pool.clone(),
        progress: Arc::new(SqliteProgressStore::new(pool)),
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
        },
        allow_admin_setup,
    }
}

/// `modules` is a list of (module id, [(lesson id, duration seconds)]).
pub fn course(id: &str, modules: &[(&str, &[(&str, f64)])]) -> Course {
    let modules: Vec<_> = modules
        .iter()
        .map(|(module_id, lessons)| {
            let lessons: Vec<_> = lessons
                .iter()
                .map(|(lesson_id, duration)| {
                    json!({
                        "id": lesson_id,
                        "title": format!("Lesson {}", lesson_id),
                        "videoUrl": format!("https://videos.example.com/{}.mp4", lesson_id),
                        "duration": duration,
                    })
                })
                .collect();
            json!({ "id": module_id, "title": format!("Module {}", module_id), "lessons": lessons })
        })
        .collect();

    let mut course = Course::from_value(json!({
        "id": id,
        "title": format!("Course {}", id),
        "description": "",
        "modules": modules,
    }))
    .expect("valid course document");
    course.refresh_derived();
    course
}

/// The worked example: one module, l1 = 600s, l2 = 330s.
pub fn intro_course() -> Course {
    course("intro", &[("m1", &[("l1", 600.0), ("l2", 330.0)])])
}

pub async fn store_course(pool: &SqlitePool, mut course: Course) -> Course {
    repository::upsert_course(pool, &mut course)
        .await
        .expect("Failed to store course");
    course
}

pub fn caller(user_id: &str) -> CallContext {
    CallContext {
        auth: Some(AuthUser {
            user_id: user_id.to_string(),
            email: Some(format!("{}@example.com", user_id)),
        }),
    }
}

pub fn completion(course_id: &str, lesson_id: &str) -> CompletionRequest {
    CompletionRequest {
        course_id: Some(course_id.to_string()),
        lesson_id: Some(lesson_id.to_string()),
    }
}

pub fn token_for(user_id: &str) -> String {
    let claims = lessonhub::auth::Claims {
        sub: user_id.to_string(),
        email: Some(format!("{}@example.com", user_id)),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign token")
}
