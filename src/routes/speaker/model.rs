use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::api::Pagination;
use crate::utils::generate_id;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Speaker {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
    pub church: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub status: String,
    pub sermon_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct SpeakerListQuery {
    #[serde(rename = "_page", default = "default_page")]
    pub page: u32,
    #[serde(rename = "_limit", default = "default_limit")]
    pub limit: u32,
    pub status: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSpeakerRequest {
    pub name: String,
    pub title: Option<String>,
    pub church: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSpeakerRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub church: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

const SELECT_SPEAKER: &str = r#"
    SELECT sp.id, sp.name, sp.title, sp.church, sp.bio, sp.avatar_url, sp.status,
           (SELECT COUNT(*) FROM sermons s WHERE s.speaker_id = sp.id) AS sermon_count,
           sp.created_at, sp.updated_at
    FROM speakers sp
    WHERE 1=1
"#;

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a SpeakerListQuery) {
    if let Some(status) = &query.status {
        builder.push(" AND sp.status = ").push_bind(status);
    }
    if let Some(q) = &query.q {
        let pattern = format!("%{}%", q);
        builder
            .push(" AND (sp.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR sp.church ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

impl Speaker {
    pub async fn list(
        pool: &PgPool,
        query: &SpeakerListQuery,
    ) -> Result<(Vec<Speaker>, Pagination), sqlx::Error> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM speakers sp WHERE 1=1");
        push_filters(&mut count_builder, query);
        let total: i64 = count_builder.build_query_scalar().fetch_one(pool).await?;

        let page = query.page.max(1);
        let limit = query.limit.clamp(1, 100);

        let mut builder = QueryBuilder::new(SELECT_SPEAKER);
        push_filters(&mut builder, query);
        builder
            .push(" ORDER BY sp.name ASC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(Pagination::offset(page, limit));

        let speakers = builder.build_query_as::<Speaker>().fetch_all(pool).await?;
        Ok((speakers, Pagination::new(page, limit, total)))
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Speaker>, sqlx::Error> {
        let mut builder = QueryBuilder::new(SELECT_SPEAKER);
        builder.push(" AND sp.id = ").push_bind(id);
        builder.build_query_as::<Speaker>().fetch_optional(pool).await
    }

    pub async fn create(pool: &PgPool, req: CreateSpeakerRequest) -> Result<Speaker, sqlx::Error> {
        let id = generate_id("speaker");
        sqlx::query(
            r#"
            INSERT INTO speakers (id, name, title, church, bio, avatar_url, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            "#,
        )
        .bind(&id)
        .bind(&req.name)
        .bind(&req.title)
        .bind(&req.church)
        .bind(&req.bio)
        .bind(&req.avatar_url)
        .bind(req.status.as_deref().unwrap_or("active"))
        .execute(pool)
        .await?;

        Self::find_by_id(pool, &id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &PgPool,
        id: &str,
        req: UpdateSpeakerRequest,
    ) -> Result<Option<Speaker>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE speakers SET
                name = COALESCE($2, name),
                title = COALESCE($3, title),
                church = COALESCE($4, church),
                bio = COALESCE($5, bio),
                avatar_url = COALESCE($6, avatar_url),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.title)
        .bind(&req.church)
        .bind(&req.bio)
        .bind(&req.avatar_url)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: &str,
        status: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE speakers SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn sermon_count(pool: &PgPool, id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM sermons WHERE speaker_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM speakers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
