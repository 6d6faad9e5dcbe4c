use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// API Key Repository
// ============================================================================

pub struct ApiKeyRepository;

impl ApiKeyRepository {
    pub async fn create(pool: &PgPool, name: &str, key_hash: &str) -> AppResult<ApiKey> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, ApiKey>(
            r#"
            INSERT INTO api_keys (id, name, key_hash, active, created_at)
            VALUES ($1, $2, $3, TRUE, now())
            RETURNING id, name, key_hash, active, created_at, last_used_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(key_hash)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_active_by_hash(pool: &PgPool, key_hash: &str) -> AppResult<Option<ApiKey>> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            SELECT id, name, key_hash, active, created_at, last_used_at
            FROM api_keys
            WHERE key_hash = $1 AND active = TRUE
            "#,
        )
        .bind(key_hash)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list(pool: &PgPool) -> AppResult<Vec<ApiKey>> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            SELECT id, name, key_hash, active, created_at, last_used_at
            FROM api_keys
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn deactivate(pool: &PgPool, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("UPDATE api_keys SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn touch_last_used(pool: &PgPool, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE api_keys SET last_used_at = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}
