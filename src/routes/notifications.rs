use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::IntegrationLogRepository;
use crate::error::{AppError, AppResult};
use crate::services::dispatch::DispatchService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/send", post(send_notification))
        .route("/", get(list_integration_logs))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SendQuery {
    pub debug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListLogsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub lead_id: Option<String>,
    pub integration_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogsListResponse {
    pub items: Vec<IntegrationLogResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct IntegrationLogResponse {
    pub id: uuid::Uuid,
    pub integration_type: String,
    pub lead_id: Option<String>,
    pub request_payload: Value,
    pub response_payload: Option<Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Dispatch a lead-lifecycle notification.
///
/// Any failure (malformed body included) is caught here and answered with
/// the dispatcher's `{"success": false, "error": ...}` contract and HTTP 500.
async fn send_notification(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SendQuery>,
    body: Bytes,
) -> Response {
    let debug = query.debug.as_deref() == Some("1");

    let result = async {
        let payload: Value = serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))?;
        DispatchService::dispatch(&state, payload, debug).await
    }
    .await;

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            tracing::error!("Notification dispatch failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// List integration-log rows, newest first.
async fn list_integration_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLogsQuery>,
) -> AppResult<Json<LogsListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let logs = IntegrationLogRepository::find_with_filters(
        &state.db,
        query.lead_id.as_deref(),
        query.integration_type.as_deref(),
        per_page,
        offset,
    )
    .await?;

    let total = IntegrationLogRepository::count_with_filters(
        &state.db,
        query.lead_id.as_deref(),
        query.integration_type.as_deref(),
    )
    .await?;

    let total_pages = (total as f64 / per_page as f64).ceil() as i64;

    let items = logs
        .into_iter()
        .map(|log| IntegrationLogResponse {
            id: log.id,
            integration_type: log.integration_type,
            lead_id: log.lead_id,
            request_payload: log.request_payload,
            response_payload: log.response_payload,
            error_message: log.error_message,
            created_at: log.created_at,
        })
        .collect();

    Ok(Json(LogsListResponse {
        items,
        total,
        page,
        per_page,
        total_pages,
    }))
}
