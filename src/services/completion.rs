use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::auth::CallContext;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{CompletionRequest, CompletionResponse};
use crate::store::ProgressStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Complete,
    Incomplete,
}

/// The two completion functions: add or remove one lesson id in the caller's
/// progress record for a course.
pub struct CompletionService {
    db: SqlitePool,
    progress: Arc<dyn ProgressStore>,
}

impl CompletionService {
    pub fn new(db: SqlitePool, progress: Arc<dyn ProgressStore>) -> Self {
        Self { db, progress }
    }

    pub async fn mark_complete(
        &self,
        ctx: &CallContext,
        req: &CompletionRequest,
    ) -> Result<CompletionResponse, AppError> {
        self.apply(ctx, req, Change::Complete).await
    }

    pub async fn mark_incomplete(
        &self,
        ctx: &CallContext,
        req: &CompletionRequest,
    ) -> Result<CompletionResponse, AppError> {
        self.apply(ctx, req, Change::Incomplete).await
    }

    async fn apply(
        &self,
        ctx: &CallContext,
        req: &CompletionRequest,
        change: Change,
    ) -> Result<CompletionResponse, AppError> {
        let user = ctx.auth.as_ref().ok_or_else(|| {
            AppError::Unauthenticated(
                "The function must be called while authenticated.".to_string(),
            )
        })?;

        let (course_id, lesson_id) = match (non_empty(&req.course_id), non_empty(&req.lesson_id)) {
            (Some(course_id), Some(lesson_id)) => (course_id, lesson_id),
            _ => {
                return Err(AppError::InvalidArgument(
                    "The function must be called with arguments 'courseId' and 'lessonId'."
                        .to_string(),
                ));
            }
        };

        if !repository::course_exists(&self.db, course_id).await? {
            return Err(AppError::NotFound(format!("course {} does not exist", course_id)));
        }

        let now = Utc::now();
        let result = match change {
            Change::Complete => {
                self.progress
                    .add_completed_lesson(&user.user_id, course_id, lesson_id, now)
                    .await
            }
            Change::Incomplete => {
                self.progress
                    .remove_completed_lesson(&user.user_id, course_id, lesson_id, now)
                    .await
            }
        };

        if let Err(e) = result {
            error!(
                user_id = %user.user_id,
                course_id,
                lesson_id,
                "error updating progress: {}",
                e
            );
            return Err(AppError::Internal("Unable to update course progress.".to_string()));
        }

        info!(user_id = %user.user_id, course_id, lesson_id, ?change, "progress updated");

        let message = match change {
            Change::Complete => "Lesson marked as completed.",
            Change::Incomplete => "Lesson marked as incomplete.",
        };
        Ok(CompletionResponse {
            success: true,
            message: message.to_string(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
