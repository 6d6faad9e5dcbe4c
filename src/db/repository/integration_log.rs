use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Integration Log Repository
// ============================================================================

pub struct IntegrationLogRepository;

impl IntegrationLogRepository {
    pub async fn create(pool: &PgPool, log: CreateIntegrationLog) -> AppResult<IntegrationLog> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, IntegrationLog>(
            r#"
            INSERT INTO integration_logs (
                id, integration_type, lead_id, request_payload,
                response_payload, error_message, dedupe_key, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, now())
            RETURNING id, integration_type, lead_id, request_payload,
                      response_payload, error_message, dedupe_key, created_at
            "#,
        )
        .bind(id)
        .bind(log.integration_type)
        .bind(log.lead_id)
        .bind(log.request_payload)
        .bind(log.response_payload)
        .bind(log.error_message)
        .bind(log.dedupe_key)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Whether a dispatch with this dedupe key was already recorded.
    pub async fn dedupe_key_exists(pool: &PgPool, dedupe_key: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM integration_logs WHERE dedupe_key = $1",
        )
        .bind(dedupe_key)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(count > 0)
    }

    /// List log rows newest first, optionally filtered by lead.
    pub async fn find_with_filters(
        pool: &PgPool,
        lead_id: Option<&str>,
        integration_type: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<IntegrationLog>> {
        sqlx::query_as::<_, IntegrationLog>(
            r#"
            SELECT id, integration_type, lead_id, request_payload,
                   response_payload, error_message, dedupe_key, created_at
            FROM integration_logs
            WHERE ($1::text IS NULL OR lead_id = $1)
              AND ($2::text IS NULL OR integration_type = $2)
            ORDER BY created_at DESC
            LIMIT $3
            OFFSET $4
            "#,
        )
        .bind(lead_id)
        .bind(integration_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn count_with_filters(
        pool: &PgPool,
        lead_id: Option<&str>,
        integration_type: Option<&str>,
    ) -> AppResult<i64> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM integration_logs
            WHERE ($1::text IS NULL OR lead_id = $1)
              AND ($2::text IS NULL OR integration_type = $2)
            "#,
        )
        .bind(lead_id)
        .bind(integration_type)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }
}
