use sqlx::PgPool;

use crate::db::models::Profile;
use crate::error::{AppError, AppResult};

// ============================================================================
// Profile Repository
// ============================================================================

pub struct ProfileRepository;

impl ProfileRepository {
    /// Profiles holding the `manager` role.
    pub async fn find_managers(pool: &PgPool) -> AppResult<Vec<Profile>> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT p.id, p.full_name, p.email, p.phone, p.created_at
            FROM profiles p
            JOIN user_roles r ON r.user_id = p.id
            WHERE r.role = 'manager'
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Manager emails for meeting notifications; profiles without an email
    /// are skipped.
    pub async fn manager_emails(pool: &PgPool) -> AppResult<Vec<String>> {
        let managers = Self::find_managers(pool).await?;
        Ok(managers.into_iter().filter_map(|p| p.email).collect())
    }
}
