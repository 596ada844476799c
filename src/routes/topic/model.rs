use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::api::Pagination;
use crate::routes::sermon::Sermon;
use crate::utils::generate_id;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub sort_order: i32,
    pub sermon_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTopicRequest {
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTopicRequest {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceTopicSermonsRequest {
    pub sermon_ids: Vec<String>,
}

const SELECT_TOPIC: &str = r#"
    SELECT t.id, t.name, t.icon, t.description, t.status, t.sort_order,
           (SELECT COUNT(*) FROM topic_sermons ts WHERE ts.topic_id = t.id) AS sermon_count,
           t.created_at, t.updated_at
    FROM topics t
"#;

impl Topic {
    pub async fn list(pool: &PgPool) -> Result<Vec<Topic>, sqlx::Error> {
        sqlx::query_as(&format!("{} ORDER BY t.sort_order ASC, t.name ASC", SELECT_TOPIC))
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Topic>, sqlx::Error> {
        sqlx::query_as(&format!("{} WHERE t.id = $1", SELECT_TOPIC))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn sermons(
        pool: &PgPool,
        id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Sermon>, Pagination), sqlx::Error> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM topic_sermons WHERE topic_id = $1")
                .bind(id)
                .fetch_one(pool)
                .await?;

        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let sermons = sqlx::query_as(
            r#"
            SELECT s.id, s.title, s.description, s.audio_url, s.image_url, s.duration,
                   s.speaker_id, sp.name AS speaker_name, sp.avatar_url AS speaker_avatar,
                   s.submitter_id, s.status, s.publish_date, s.play_count, s.tags,
                   s.created_at, s.updated_at
            FROM topic_sermons ts
            JOIN sermons s ON s.id = ts.sermon_id
            LEFT JOIN speakers sp ON s.speaker_id = sp.id
            WHERE ts.topic_id = $1
            ORDER BY ts.position ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(id)
        .bind(limit as i64)
        .bind(Pagination::offset(page, limit))
        .fetch_all(pool)
        .await?;

        Ok((sermons, Pagination::new(page, limit, total)))
    }

    pub async fn create(pool: &PgPool, req: CreateTopicRequest) -> Result<Topic, sqlx::Error> {
        let id = generate_id("topic");
        sqlx::query(
            r#"
            INSERT INTO topics (id, name, icon, description, status, sort_order, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'active', $5, NOW(), NOW())
            "#,
        )
        .bind(&id)
        .bind(&req.name)
        .bind(&req.icon)
        .bind(&req.description)
        .bind(req.sort_order.unwrap_or(0))
        .execute(pool)
        .await?;

        Self::find_by_id(pool, &id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &PgPool,
        id: &str,
        req: UpdateTopicRequest,
    ) -> Result<Option<Topic>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE topics SET
                name = COALESCE($2, name),
                icon = COALESCE($3, icon),
                description = COALESCE($4, description),
                sort_order = COALESCE($5, sort_order),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.icon)
        .bind(&req.description)
        .bind(req.sort_order)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    /// Replace the topic's sermon membership wholesale, keeping the given
    /// order. Runs in one transaction so a half-applied list is impossible.
    pub async fn replace_sermons(
        pool: &PgPool,
        id: &str,
        sermon_ids: &[String],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM topic_sermons WHERE topic_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for (position, sermon_id) in sermon_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO topic_sermons (topic_id, sermon_id, position) VALUES ($1, $2, $3)",
            )
            .bind(id)
            .bind(sermon_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: &str,
        status: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE topics SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM topics WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
