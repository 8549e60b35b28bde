use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::models::ProgressRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Durable per-(user, course) completed-lesson sets.
///
/// Implementations must apply `add_completed_lesson` and
/// `remove_completed_lesson` as one atomic merge against the stored set, so
/// concurrent calls for different lessons of the same course never drop one
/// another's update.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn add_completed_lesson(
        &self,
        user_id: &str,
        course_id: &str,
        lesson_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn remove_completed_lesson(
        &self,
        user_id: &str,
        course_id: &str,
        lesson_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn fetch_progress(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<ProgressRecord>, StoreError>;

    /// Every progress record of a user, keyed by course id.
    async fn fetch_user_progress(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, ProgressRecord>, StoreError>;
}

pub struct SqliteProgressStore {
    db: SqlitePool,
}

impl SqliteProgressStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn touch(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        user_id: &str,
        course_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO progress (user_id, course_id, last_updated)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, course_id) DO UPDATE SET last_updated = excluded.last_updated
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(now)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for SqliteProgressStore {
    async fn add_completed_lesson(
        &self,
        user_id: &str,
        course_id: &str,
        lesson_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        Self::touch(&mut tx, user_id, course_id, now).await?;
        sqlx::query(
            r#"
            INSERT INTO progress_lessons (user_id, course_id, lesson_id, completed_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, course_id, lesson_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(lesson_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn remove_completed_lesson(
        &self,
        user_id: &str,
        course_id: &str,
        lesson_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        Self::touch(&mut tx, user_id, course_id, now).await?;
        sqlx::query(
            "DELETE FROM progress_lessons WHERE user_id = ?1 AND course_id = ?2 AND lesson_id = ?3",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(lesson_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn fetch_progress(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<ProgressRecord>, StoreError> {
        // Both reads share one snapshot so the set always matches `last_updated`.
        let mut tx = self.db.begin().await?;
        let last_updated = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT last_updated FROM progress WHERE user_id = ?1 AND course_id = ?2",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(last_updated) = last_updated else {
            tx.commit().await?;
            return Ok(None);
        };

        let completed_lessons = sqlx::query_scalar::<_, String>(
            "SELECT lesson_id FROM progress_lessons WHERE user_id = ?1 AND course_id = ?2",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect::<BTreeSet<_>>();
        tx.commit().await?;

        Ok(Some(ProgressRecord {
            completed_lessons,
            last_updated,
        }))
    }

    async fn fetch_user_progress(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, ProgressRecord>, StoreError> {
        let mut tx = self.db.begin().await?;
        let mut records: HashMap<String, ProgressRecord> =
            sqlx::query_as::<_, (String, DateTime<Utc>)>(
                "SELECT course_id, last_updated FROM progress WHERE user_id = ?1",
            )
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|(course_id, last_updated)| {
                (
                    course_id,
                    ProgressRecord {
                        completed_lessons: BTreeSet::new(),
                        last_updated,
                    },
                )
            })
            .collect();

        let lessons = sqlx::query_as::<_, (String, String)>(
            "SELECT course_id, lesson_id FROM progress_lessons WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        for (course_id, lesson_id) in lessons {
            if let Some(record) = records.get_mut(&course_id) {
                record.completed_lessons.insert(lesson_id);
            }
        }

        Ok(records)
    }
}
