use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::api::Pagination;
use crate::utils::generate_id;

/// Public user shape. The password hash never leaves the data layer.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub email: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Internal shape used by the auth flows.
#[derive(Debug, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub status: String,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(rename = "_page", default = "default_page")]
    pub page: u32,
    #[serde(rename = "_limit", default = "default_limit")]
    pub limit: u32,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub name: Option<String>,
}

const SELECT_USER: &str =
    "SELECT id, username, name, email, status, created_at, updated_at FROM users";

impl User {
    pub async fn list(
        pool: &PgPool,
        query: &UserListQuery,
    ) -> Result<(Vec<User>, Pagination), sqlx::Error> {
        let total: i64 = match &query.status {
            Some(status) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE status = $1")
                    .bind(status)
                    .fetch_one(pool)
                    .await?
            }
            None => sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(pool).await?,
        };

        let page = query.page.max(1);
        let limit = query.limit.clamp(1, 100);
        let offset = Pagination::offset(page, limit);

        let users = match &query.status {
            Some(status) => {
                sqlx::query_as(&format!(
                    "{} WHERE status = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                    SELECT_USER
                ))
                .bind(status)
                .bind(limit as i64)
                .bind(offset)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "{} ORDER BY created_at DESC LIMIT $1 OFFSET $2",
                    SELECT_USER
                ))
                .bind(limit as i64)
                .bind(offset)
                .fetch_all(pool)
                .await?
            }
        };

        Ok((users, Pagination::new(page, limit, total)))
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(&format!("{} WHERE id = $1", SELECT_USER))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_credentials_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<UserCredentials>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, username, email, password_hash, status FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let id = generate_id("user");
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'active', NOW(), NOW())
            "#,
        )
        .bind(&id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, &id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &PgPool,
        id: &str,
        req: &UpdateUserRequest,
    ) -> Result<Option<User>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                name = COALESCE($3, name),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&req.username)
        .bind(&req.name)
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
            sqlx::query("UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_password_hash(
        pool: &PgPool,
        id: &str,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
