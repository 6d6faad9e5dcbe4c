use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Notification Settings Repository
// ============================================================================

pub struct SettingsRepository;

impl SettingsRepository {
    pub async fn find_by_key(pool: &PgPool, key: &str) -> AppResult<Option<NotificationSetting>> {
        sqlx::query_as::<_, NotificationSetting>(
            r#"
            SELECT id, setting_key, setting_value, created_at, updated_at
            FROM notification_settings
            WHERE setting_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list(pool: &PgPool) -> AppResult<Vec<NotificationSetting>> {
        sqlx::query_as::<_, NotificationSetting>(
            r#"
            SELECT id, setting_key, setting_value, created_at, updated_at
            FROM notification_settings
            ORDER BY setting_key
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn upsert(pool: &PgPool, key: &str, value: Value) -> AppResult<NotificationSetting> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, NotificationSetting>(
            r#"
            INSERT INTO notification_settings (id, setting_key, setting_value, created_at, updated_at)
            VALUES ($1, $2, $3, now(), now())
            ON CONFLICT (setting_key)
            DO UPDATE SET setting_value = EXCLUDED.setting_value, updated_at = now()
            RETURNING id, setting_key, setting_value, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(key)
        .bind(value)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Typed reads. A missing or malformed row never fails a dispatch; it
    /// means defaults.
    pub async fn email_settings(pool: &PgPool) -> AppResult<EmailSettings> {
        let row = Self::find_by_key(pool, SETTING_EMAIL).await?;
        Ok(EmailSettings::from_value(row.map(|s| s.setting_value)))
    }

    pub async fn recipient_settings(pool: &PgPool) -> AppResult<RecipientSettings> {
        let row = Self::find_by_key(pool, SETTING_RECIPIENTS).await?;
        Ok(RecipientSettings::from_value(row.map(|s| s.setting_value)))
    }

    pub async fn whatsapp_settings(pool: &PgPool) -> AppResult<WhatsAppSettings> {
        let row = Self::find_by_key(pool, SETTING_WHATSAPP).await?;
        Ok(WhatsAppSettings::from_value(row.map(|s| s.setting_value)))
    }
}
