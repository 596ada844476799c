use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::api::Pagination;

/// The three favoritable resource kinds, each with its own join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteKind {
    Sermon,
    Speaker,
    Topic,
}

impl FavoriteKind {
    pub fn table(&self) -> &'static str {
        match self {
            FavoriteKind::Sermon => "sermon_favorites",
            FavoriteKind::Speaker => "speaker_favorites",
            FavoriteKind::Topic => "topic_favorites",
        }
    }

    pub fn item_column(&self) -> &'static str {
        match self {
            FavoriteKind::Sermon => "sermon_id",
            FavoriteKind::Speaker => "speaker_id",
            FavoriteKind::Topic => "topic_id",
        }
    }

    /// Table holding the favorited entity, for existence checks.
    pub fn item_table(&self) -> &'static str {
        match self {
            FavoriteKind::Sermon => "sermons",
            FavoriteKind::Speaker => "speakers",
            FavoriteKind::Topic => "topics",
        }
    }
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FavoriteSermonRow {
    pub id: String,
    pub title: String,
    pub audio_url: String,
    pub image_url: Option<String>,
    pub duration: Option<i32>,
    pub speaker_id: Option<String>,
    pub speaker_name: Option<String>,
    pub favorited_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FavoriteSpeakerRow {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
    pub avatar_url: Option<String>,
    pub favorited_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FavoriteTopicRow {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub favorited_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AddSermonFavoriteRequest {
    pub sermon_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddSpeakerFavoriteRequest {
    pub speaker_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddTopicFavoriteRequest {
    pub topic_id: String,
}

pub struct Favorites;

impl Favorites {
    pub async fn item_exists(
        pool: &PgPool,
        kind: FavoriteKind,
        item_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
            kind.item_table()
        ))
        .bind(item_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// Idempotent: favoriting twice is not an error, returns whether a row
    /// was actually inserted.
    pub async fn add(
        pool: &PgPool,
        kind: FavoriteKind,
        user_id: &str,
        item_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (user_id, {}, created_at) VALUES ($1, $2, NOW()) ON CONFLICT DO NOTHING",
            kind.table(),
            kind.item_column()
        ))
        .bind(user_id)
        .bind(item_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove(
        pool: &PgPool,
        kind: FavoriteKind,
        user_id: &str,
        item_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
            kind.table(),
            kind.item_column()
        ))
        .bind(user_id)
        .bind(item_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn exists(
        pool: &PgPool,
        kind: FavoriteKind,
        user_id: &str,
        item_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = $1 AND {} = $2)",
            kind.table(),
            kind.item_column()
        ))
        .bind(user_id)
        .bind(item_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    async fn count(
        pool: &PgPool,
        kind: FavoriteKind,
        user_id: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE user_id = $1",
            kind.table()
        ))
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn list_sermons(
        pool: &PgPool,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<FavoriteSermonRow>, Pagination), sqlx::Error> {
        let total = Self::count(pool, FavoriteKind::Sermon, user_id).await?;
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let rows = sqlx::query_as(
            r#"
            SELECT s.id, s.title, s.audio_url, s.image_url, s.duration,
                   s.speaker_id, sp.name AS speaker_name, f.created_at AS favorited_at
            FROM sermon_favorites f
            JOIN sermons s ON s.id = f.sermon_id
            LEFT JOIN speakers sp ON s.speaker_id = sp.id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .bind(Pagination::offset(page, limit))
        .fetch_all(pool)
        .await?;

        Ok((rows, Pagination::new(page, limit, total)))
    }

    pub async fn list_speakers(
        pool: &PgPool,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<FavoriteSpeakerRow>, Pagination), sqlx::Error> {
        let total = Self::count(pool, FavoriteKind::Speaker, user_id).await?;
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let rows = sqlx::query_as(
            r#"
            SELECT sp.id, sp.name, sp.title, sp.avatar_url, f.created_at AS favorited_at
            FROM speaker_favorites f
            JOIN speakers sp ON sp.id = f.speaker_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .bind(Pagination::offset(page, limit))
        .fetch_all(pool)
        .await?;

        Ok((rows, Pagination::new(page, limit, total)))
    }

    pub async fn list_topics(
        pool: &PgPool,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<FavoriteTopicRow>, Pagination), sqlx::Error> {
        let total = Self::count(pool, FavoriteKind::Topic, user_id).await?;
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let rows = sqlx::query_as(
            r#"
            SELECT t.id, t.name, t.icon, f.created_at AS favorited_at
            FROM topic_favorites f
            JOIN topics t ON t.id = f.topic_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .bind(Pagination::offset(page, limit))
        .fetch_all(pool)
        .await?;

        Ok((rows, Pagination::new(page, limit, total)))
    }
}
