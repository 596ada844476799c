use serde::Deserialize;
use sqlx::PgPool;

use crate::api::Pagination;
use crate::routes::sermon::{Sermon, SELECT_SERMON};

#[derive(Debug, Deserialize)]
pub struct SubmitSermonRequest {
    pub title: String,
    pub audio_url: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub duration: Option<i32>,
    pub speaker_id: Option<String>,
    pub tags: Option<serde_json::Value>,
}

pub struct Submissions;

impl Submissions {
    pub async fn list(
        pool: &PgPool,
        submitter_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Sermon>, Pagination), sqlx::Error> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sermons WHERE submitter_id = $1")
                .bind(submitter_id)
                .fetch_one(pool)
                .await?;

        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let sql = format!(
            "{} AND s.submitter_id = $1 ORDER BY s.created_at DESC LIMIT $2 OFFSET $3",
            SELECT_SERMON
        );
        let sermons = sqlx::query_as(&sql)
            .bind(submitter_id)
            .bind(limit as i64)
            .bind(Pagination::offset(page, limit))
            .fetch_all(pool)
            .await?;

        Ok((sermons, Pagination::new(page, limit, total)))
    }

    pub async fn find(
        pool: &PgPool,
        submitter_id: &str,
        sermon_id: &str,
    ) -> Result<Option<Sermon>, sqlx::Error> {
        let sql = format!("{} AND s.id = $1 AND s.submitter_id = $2", SELECT_SERMON);
        sqlx::query_as(&sql)
            .bind(sermon_id)
            .bind(submitter_id)
            .fetch_optional(pool)
            .await
    }

    /// Withdraw: only while the submission is still pending review.
    pub async fn delete_pending(
        pool: &PgPool,
        submitter_id: &str,
        sermon_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM sermons WHERE id = $1 AND submitter_id = $2 AND status = 'pending'",
        )
        .bind(sermon_id)
        .bind(submitter_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
