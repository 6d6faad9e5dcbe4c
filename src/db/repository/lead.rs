use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Lead Repository
// ============================================================================

pub struct LeadRepository;

impl LeadRepository {
    pub async fn create(pool: &PgPool, lead: CreateLead) -> AppResult<Lead> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (id, name, email, phone, source, interest, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'new', now(), now())
            RETURNING id, name, email, phone, source, interest, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(lead.name)
        .bind(lead.email)
        .bind(lead.phone)
        .bind(lead.source)
        .bind(lead.interest)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }
}
