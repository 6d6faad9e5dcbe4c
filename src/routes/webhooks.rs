use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use crate::db::models::CreateLead;
use crate::db::{ApiKeyRepository, LeadRepository};
use crate::error::{AppError, AppResult};
use crate::routes::integrations::hash_api_key;
use crate::services::dispatch::DispatchService;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

const API_KEY_HEADER: &str = "x-api-key";
const SIGNATURE_HEADER: &str = "x-webhook-signature";

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/leads", post(handle_lead_webhook))
}

/// Inbound lead from a portal or social platform. Both naming conventions
/// are accepted.
#[derive(Debug, Deserialize)]
pub struct LeadWebhookPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub interest: Option<String>,
    #[serde(rename = "leadName")]
    pub name_camel: Option<String>,
    #[serde(rename = "leadEmail")]
    pub email_camel: Option<String>,
    #[serde(rename = "leadPhone")]
    pub phone_camel: Option<String>,
    #[serde(rename = "leadSource")]
    pub source_camel: Option<String>,
    #[serde(rename = "leadInterest")]
    pub interest_camel: Option<String>,
}

fn get_header(headers: &HeaderMap, name: &str) -> AppResult<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .ok_or_else(|| AppError::BadRequest(format!("Missing {} header", name)))
}

/// Verify an optional `sha256=<hex>` HMAC signature of the raw body, keyed
/// by the caller's API key.
fn verify_signature(secret: &str, body: &[u8], signature: &str) -> AppResult<()> {
    let expected_sig = if let Some(hex_sig) = signature.strip_prefix("sha256=") {
        hex::decode(hex_sig)
            .map_err(|_| AppError::BadRequest("Invalid signature format".to_string()))?
    } else {
        return Err(AppError::BadRequest("Invalid signature format".to_string()));
    };

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to create HMAC")))?;
    mac.update(body);

    mac.verify_slice(&expected_sig)
        .map_err(|_| AppError::Unauthorized)?;

    Ok(())
}

async fn handle_lead_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let api_key =
        get_header(&headers, API_KEY_HEADER).map_err(|_| AppError::Unauthorized)?;

    let key = ApiKeyRepository::find_active_by_hash(&state.db, &hash_api_key(&api_key))
        .await?
        .ok_or(AppError::Unauthorized)?;

    if let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
        verify_signature(&api_key, &body, signature)?;
    }

    let payload: LeadWebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid payload: {}", e)))?;

    let name = payload
        .name
        .or(payload.name_camel)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::Validation("Lead name is required".to_string()))?;
    let email = payload.email.or(payload.email_camel);
    let phone = payload.phone.or(payload.phone_camel);
    let source = payload
        .source
        .or(payload.source_camel)
        .or_else(|| Some(key.name.clone()));
    let interest = payload.interest.or(payload.interest_camel);

    let lead = LeadRepository::create(
        &state.db,
        CreateLead {
            name,
            email,
            phone,
            source,
            interest,
        },
    )
    .await?;

    if let Err(e) = ApiKeyRepository::touch_last_used(&state.db, key.id).await {
        tracing::warn!("Failed to update last_used_at for key {}: {:?}", key.id, e);
    }

    tracing::info!(
        "Lead {} ingested via integration '{}' (source {:?})",
        lead.id,
        key.name,
        lead.source
    );

    // The lead is already stored; a notification failure must not fail the
    // intake.
    let event = json!({
        "type": "lead_created",
        "lead_id": lead.id,
        "lead_name": lead.name,
        "lead_email": lead.email,
        "lead_phone": lead.phone,
        "lead_source": lead.source,
        "lead_interest": lead.interest,
    });
    if let Err(e) = DispatchService::dispatch(&state, event, false).await {
        tracing::warn!("lead_created dispatch failed for {}: {}", lead.id, e);
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({ "lead_id": lead.id })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signature_verifies() {
        let body = br#"{"name":"Jane"}"#;
        let signature = sign("hz_secret", body);
        assert!(verify_signature("hz_secret", body, &signature).is_ok());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let signature = sign("hz_secret", br#"{"name":"Jane"}"#);
        assert!(verify_signature("hz_secret", br#"{"name":"Mallory"}"#, &signature).is_err());
    }

    #[test]
    fn unprefixed_signature_is_rejected() {
        assert!(verify_signature("hz_secret", b"{}", "deadbeef").is_err());
    }
}
