use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;

/// Editorial configuration blobs keyed by name (home layout, discover
/// sections, launch screen). Stored as JSONB so the admin panel owns
/// the shape.
pub const KEY_HOME_CONFIG: &str = "home-config";
pub const KEY_DISCOVER_CONFIG: &str = "discover-config";
pub const KEY_LAUNCH_SCREEN: &str = "launch-screen-config";

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AppConfigEntry {
    pub key: String,
    pub value: Value,
    pub updated_at: DateTime<Utc>,
}

/// Shallow merge: top-level fields in `patch` overwrite `current`,
/// everything else is kept. Non-object inputs fall back to replacement.
pub fn shallow_merge(current: Value, patch: &Value) -> Value {
    match (current, patch) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (k, v) in overlay {
                base.insert(k.clone(), v.clone());
            }
            Value::Object(base)
        }
        (_, patch) => patch.clone(),
    }
}

pub struct AppConfig;

impl AppConfig {
    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<AppConfigEntry>, sqlx::Error> {
        sqlx::query_as("SELECT key, value, updated_at FROM app_config WHERE key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    pub async fn set(pool: &PgPool, key: &str, value: &Value) -> Result<AppConfigEntry, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO app_config (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING key, value, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .fetch_one(pool)
        .await
    }

    pub async fn merge(
        pool: &PgPool,
        key: &str,
        patch: &Value,
    ) -> Result<AppConfigEntry, sqlx::Error> {
        let current = Self::get(pool, key)
            .await?
            .map(|e| e.value)
            .unwrap_or_else(|| Value::Object(Default::default()));

        let merged = shallow_merge(current, patch);
        Self::set(pool, key, &merged).await
    }
}

#[cfg(test)]
mod tests {
    use super::shallow_merge;
    use serde_json::json;

    #[test]
    fn merge_overwrites_top_level_only() {
        let base = json!({ "banner": { "title": "old" }, "sections": [1, 2] });
        let patch = json!({ "banner": { "title": "new" } });

        let merged = shallow_merge(base, &patch);
        assert_eq!(merged["banner"]["title"], "new");
        assert_eq!(merged["sections"], json!([1, 2]));
    }

    #[test]
    fn merge_replaces_non_object_base() {
        let merged = shallow_merge(json!(null), &json!({ "a": 1 }));
        assert_eq!(merged, json!({ "a": 1 }));
    }
}
