use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Audit row recording an attempted external dispatch and its outcome.
///
/// `lead_id` is kept as text: portal payloads are not guaranteed to carry a
/// UUID and the column exists for correlation, not referential integrity.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct IntegrationLog {
    pub id: Uuid,
    pub integration_type: String,
    pub lead_id: Option<String>,
    pub request_payload: Value,
    pub response_payload: Option<Value>,
    pub error_message: Option<String>,
    pub dedupe_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIntegrationLog {
    pub integration_type: String,
    pub lead_id: Option<String>,
    pub request_payload: Value,
    pub response_payload: Option<Value>,
    pub error_message: Option<String>,
    pub dedupe_key: Option<String>,
}
