use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OverviewCounts {
    pub sermons: i64,
    pub published_sermons: i64,
    pub speakers: i64,
    pub topics: i64,
    pub users: i64,
    pub favorites: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TopFavoritedSermon {
    pub id: String,
    pub title: String,
    pub speaker_name: Option<String>,
    pub favorite_count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TopFavoritedSpeaker {
    pub id: String,
    pub name: String,
    pub favorite_count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FavoritesTrendPoint {
    pub day: NaiveDate,
    pub count: i64,
}

pub struct Stats;

impl Stats {
    pub async fn overview(pool: &PgPool) -> Result<OverviewCounts, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM sermons) AS sermons,
                (SELECT COUNT(*) FROM sermons WHERE status = 'published') AS published_sermons,
                (SELECT COUNT(*) FROM speakers) AS speakers,
                (SELECT COUNT(*) FROM topics) AS topics,
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT (SELECT COUNT(*) FROM sermon_favorites)
                      + (SELECT COUNT(*) FROM speaker_favorites)
                      + (SELECT COUNT(*) FROM topic_favorites)) AS favorites
            "#,
        )
        .fetch_one(pool)
        .await
    }

    pub async fn top_sermons(
        pool: &PgPool,
        limit: u32,
    ) -> Result<Vec<TopFavoritedSermon>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT s.id, s.title, sp.name AS speaker_name, COUNT(f.user_id) AS favorite_count
            FROM sermons s
            JOIN sermon_favorites f ON f.sermon_id = s.id
            LEFT JOIN speakers sp ON s.speaker_id = sp.id
            GROUP BY s.id, s.title, sp.name
            ORDER BY favorite_count DESC, s.id
            LIMIT $1
            "#,
        )
        .bind(limit.clamp(1, 100) as i64)
        .fetch_all(pool)
        .await
    }

    pub async fn top_speakers(
        pool: &PgPool,
        limit: u32,
    ) -> Result<Vec<TopFavoritedSpeaker>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT sp.id, sp.name, COUNT(f.user_id) AS favorite_count
            FROM speakers sp
            JOIN speaker_favorites f ON f.speaker_id = sp.id
            GROUP BY sp.id, sp.name
            ORDER BY favorite_count DESC, sp.id
            LIMIT $1
            "#,
        )
        .bind(limit.clamp(1, 100) as i64)
        .fetch_all(pool)
        .await
    }

    pub async fn sermon_favorite_count(
        pool: &PgPool,
        sermon_id: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM sermon_favorites WHERE sermon_id = $1")
            .bind(sermon_id)
            .fetch_one(pool)
            .await
    }

    pub async fn speaker_favorite_count(
        pool: &PgPool,
        speaker_id: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM speaker_favorites WHERE speaker_id = $1")
            .bind(speaker_id)
            .fetch_one(pool)
            .await
    }

    /// Daily new-favorite counts across all three kinds for the last
    /// `days` days, oldest first. Days with no activity are absent.
    pub async fn favorites_trend(
        pool: &PgPool,
        days: u32,
    ) -> Result<Vec<FavoritesTrendPoint>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT day, COUNT(*) AS count
            FROM (
                SELECT created_at::date AS day FROM sermon_favorites
                UNION ALL
                SELECT created_at::date FROM speaker_favorites
                UNION ALL
                SELECT created_at::date FROM topic_favorites
            ) f
            WHERE day >= CURRENT_DATE - ($1 * INTERVAL '1 day')
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(days.clamp(1, 365) as i32)
        .fetch_all(pool)
        .await
    }
}
