use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::api::Pagination;
use crate::utils::generate_id;

pub const SELECT_SERMON: &str = r#"
    SELECT s.id, s.title, s.description, s.audio_url, s.image_url, s.duration,
           s.speaker_id, sp.name AS speaker_name, sp.avatar_url AS speaker_avatar,
           s.submitter_id, s.status, s.publish_date, s.play_count, s.tags,
           s.created_at, s.updated_at
    FROM sermons s
    LEFT JOIN speakers sp ON s.speaker_id = sp.id
    WHERE 1=1
"#;

/// Columns a list request may sort by. Anything else silently falls back
/// to publish_date.
const SORTABLE_COLUMNS: &[&str] = &["publish_date", "created_at", "title", "play_count", "duration"];

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Sermon {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub audio_url: String,
    pub image_url: Option<String>,
    pub duration: Option<i32>,
    pub speaker_id: Option<String>,
    pub speaker_name: Option<String>,
    pub speaker_avatar: Option<String>,
    pub submitter_id: Option<String>,
    pub status: String,
    pub publish_date: Option<NaiveDate>,
    pub play_count: i64,
    pub tags: Option<serde_json::Value>,
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
pub struct SermonListQuery {
    #[serde(rename = "_page", default = "default_page")]
    pub page: u32,
    #[serde(rename = "_limit", default = "default_limit")]
    pub limit: u32,
    pub status: Option<String>,
    pub speaker_id: Option<String>,
    pub q: Option<String>,
    #[serde(rename = "_sort")]
    pub sort: Option<String>,
    #[serde(rename = "_order")]
    pub order: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSermonRequest {
    pub title: String,
    pub description: Option<String>,
    pub audio_url: String,
    pub image_url: Option<String>,
    pub duration: Option<i32>,
    pub speaker_id: Option<String>,
    pub submitter_id: Option<String>,
    pub status: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub tags: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSermonRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
    pub duration: Option<i32>,
    pub speaker_id: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub tags: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a SermonListQuery) {
    if let Some(status) = &query.status {
        builder.push(" AND s.status = ").push_bind(status);
    }
    if let Some(speaker_id) = &query.speaker_id {
        builder.push(" AND s.speaker_id = ").push_bind(speaker_id);
    }
    if let Some(q) = &query.q {
        let pattern = format!("%{}%", q);
        builder
            .push(" AND (s.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR s.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub fn sort_clause(sort: Option<&str>, order: Option<&str>) -> String {
    let column = sort
        .filter(|s| SORTABLE_COLUMNS.contains(s))
        .unwrap_or("publish_date");
    let direction = match order {
        Some("asc") | Some("ASC") => "ASC",
        _ => "DESC",
    };
    format!(" ORDER BY s.{} {} NULLS LAST", column, direction)
}

impl Sermon {
    pub async fn list(
        pool: &PgPool,
        query: &SermonListQuery,
    ) -> Result<(Vec<Sermon>, Pagination), sqlx::Error> {
        let mut count_builder = QueryBuilder::new(
            "SELECT COUNT(*) FROM sermons s LEFT JOIN speakers sp ON s.speaker_id = sp.id WHERE 1=1",
        );
        push_filters(&mut count_builder, query);
        let total: i64 = count_builder.build_query_scalar().fetch_one(pool).await?;

        let page = query.page.max(1);
        let limit = query.limit.clamp(1, 100);
        let offset = Pagination::offset(page, limit);

        let mut builder = QueryBuilder::new(SELECT_SERMON);
        push_filters(&mut builder, query);
        builder.push(sort_clause(query.sort.as_deref(), query.order.as_deref()));
        builder
            .push(" LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset);

        let sermons = builder.build_query_as::<Sermon>().fetch_all(pool).await?;

        Ok((sermons, Pagination::new(page, limit, total)))
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Sermon>, sqlx::Error> {
        let mut builder = QueryBuilder::new(SELECT_SERMON);
        builder.push(" AND s.id = ").push_bind(id);
        builder.build_query_as::<Sermon>().fetch_optional(pool).await
    }

    pub async fn create(pool: &PgPool, req: CreateSermonRequest) -> Result<Sermon, sqlx::Error> {
        let id = generate_id("sermon");
        sqlx::query(
            r#"
            INSERT INTO sermons
                (id, title, description, audio_url, image_url, duration, speaker_id,
                 submitter_id, status, publish_date, tags, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW())
            "#,
        )
        .bind(&id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.audio_url)
        .bind(&req.image_url)
        .bind(req.duration)
        .bind(&req.speaker_id)
        .bind(&req.submitter_id)
        .bind(req.status.as_deref().unwrap_or("draft"))
        .bind(req.publish_date)
        .bind(&req.tags)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, &id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &PgPool,
        id: &str,
        req: UpdateSermonRequest,
    ) -> Result<Option<Sermon>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE sermons SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                audio_url = COALESCE($4, audio_url),
                image_url = COALESCE($5, image_url),
                duration = COALESCE($6, duration),
                speaker_id = COALESCE($7, speaker_id),
                publish_date = COALESCE($8, publish_date),
                tags = COALESCE($9, tags),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.audio_url)
        .bind(&req.image_url)
        .bind(req.duration)
        .bind(&req.speaker_id)
        .bind(req.publish_date)
        .bind(&req.tags)
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
            sqlx::query("UPDATE sermons SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sermons WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_clause_whitelists_columns() {
        assert_eq!(
            sort_clause(Some("publish_date"), Some("desc")),
            " ORDER BY s.publish_date DESC NULLS LAST"
        );
        assert_eq!(
            sort_clause(Some("title"), Some("asc")),
            " ORDER BY s.title ASC NULLS LAST"
        );
        // unknown columns (or injection attempts) fall back to the default
        assert_eq!(
            sort_clause(Some("title; DROP TABLE sermons"), None),
            " ORDER BY s.publish_date DESC NULLS LAST"
        );
        assert_eq!(sort_clause(None, None), " ORDER BY s.publish_date DESC NULLS LAST");
    }
}
