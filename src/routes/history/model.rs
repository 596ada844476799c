use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::api::Pagination;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PlayHistoryEntry {
    pub sermon_id: String,
    pub title: String,
    pub audio_url: String,
    pub image_url: Option<String>,
    pub duration: Option<i32>,
    pub speaker_name: Option<String>,
    pub position_secs: i32,
    pub duration_secs: Option<i32>,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PlayProgress {
    pub sermon_id: String,
    pub position_secs: i32,
    pub duration_secs: Option<i32>,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RecordProgressRequest {
    pub sermon_id: String,
    pub position_secs: i32,
    pub duration_secs: Option<i32>,
    #[serde(default)]
    pub completed: bool,
}

pub struct PlayHistory;

impl PlayHistory {
    pub async fn list(
        pool: &PgPool,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<PlayHistoryEntry>, Pagination), sqlx::Error> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM play_history WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let entries = sqlx::query_as(
            r#"
            SELECT h.sermon_id, s.title, s.audio_url, s.image_url, s.duration,
                   sp.name AS speaker_name,
                   h.position_secs, h.duration_secs, h.completed, h.updated_at
            FROM play_history h
            JOIN sermons s ON s.id = h.sermon_id
            LEFT JOIN speakers sp ON s.speaker_id = sp.id
            WHERE h.user_id = $1
            ORDER BY h.updated_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .bind(Pagination::offset(page, limit))
        .fetch_all(pool)
        .await?;

        Ok((entries, Pagination::new(page, limit, total)))
    }

    /// Upsert: one row per (user, sermon), latest position wins.
    pub async fn record(
        pool: &PgPool,
        user_id: &str,
        req: &RecordProgressRequest,
    ) -> Result<PlayProgress, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO play_history (user_id, sermon_id, position_secs, duration_secs, completed, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id, sermon_id) DO UPDATE
            SET position_secs = EXCLUDED.position_secs,
                duration_secs = EXCLUDED.duration_secs,
                completed = EXCLUDED.completed,
                updated_at = NOW()
            RETURNING sermon_id, position_secs, duration_secs, completed, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&req.sermon_id)
        .bind(req.position_secs)
        .bind(req.duration_secs)
        .bind(req.completed)
        .fetch_one(pool)
        .await
    }

    pub async fn progress(
        pool: &PgPool,
        user_id: &str,
        sermon_id: &str,
    ) -> Result<Option<PlayProgress>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT sermon_id, position_secs, duration_secs, completed, updated_at
            FROM play_history
            WHERE user_id = $1 AND sermon_id = $2
            "#,
        )
        .bind(user_id)
        .bind(sermon_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(
        pool: &PgPool,
        user_id: &str,
        sermon_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM play_history WHERE user_id = $1 AND sermon_id = $2")
                .bind(user_id)
                .bind(sermon_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn clear(pool: &PgPool, user_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM play_history WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
