use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::db::{
    CreateIntegrationLog, IntegrationLogRepository, ProfileRepository, SettingsRepository,
};
use crate::error::{AppError, AppResult};
use crate::services::events::{self, LeadEventType, RawLeadEvent};
use crate::services::whatsapp::WhatsAppDelivery;
use crate::services::{recipients, templates};
use crate::AppState;

/// Integration-type label stamped on every audit row.
pub const INTEGRATION_TYPE_LABEL: &str = "resend_email";

/// Per-channel delivery outcome recorded for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    SkippedNoApi,
    InvalidNumber,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelOutcome {
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CustomerNotified {
    pub email: bool,
    pub whatsapp: bool,
}

#[derive(Debug, Serialize)]
pub struct DebugInfo {
    pub provider_responses: Value,
    pub whatsapp_message: String,
    pub whatsapp_results: Vec<WhatsAppDelivery>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub success: bool,
    pub message: String,
    pub recipients: Vec<String>,
    pub whatsapp_sent: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_notified: Option<CustomerNotified>,
    #[serde(skip_serializing_if = "is_false")]
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

impl DispatchResponse {
    fn noop(message: String, duplicate: bool) -> Self {
        Self {
            success: true,
            message,
            recipients: Vec::new(),
            whatsapp_sent: 0,
            customer_notified: None,
            duplicate,
            debug: None,
        }
    }
}

/// Dedupe key for an event: SHA-256 over the canonical normalized record.
/// Field order is fixed by the struct, so the same event always hashes the
/// same regardless of which naming convention the caller used.
pub fn dedupe_key(event: &events::LeadEvent) -> String {
    let canonical = serde_json::to_string(event).unwrap_or_default();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

pub struct DispatchService;

impl DispatchService {
    /// Run one dispatch: normalize, check enablement, resolve recipients,
    /// render, send (email, then customer channels, then team WhatsApp),
    /// log, respond.
    pub async fn dispatch(
        state: &Arc<AppState>,
        payload: Value,
        debug: bool,
    ) -> AppResult<DispatchResponse> {
        let raw: RawLeadEvent = serde_json::from_value(payload.clone())
            .map_err(|e| AppError::BadRequest(format!("Invalid payload: {}", e)))?;
        let event = events::normalize(raw)?;

        let recipient_cfg = SettingsRepository::recipient_settings(&state.db).await?;
        if !recipients::notifications_enabled(event.event_type, &recipient_cfg) {
            tracing::info!(
                "Notifications disabled for {} events, skipping dispatch",
                event.event_type.as_str()
            );
            return Ok(DispatchResponse::noop(
                format!(
                    "Notifications are disabled for {} events",
                    event.event_type.as_str()
                ),
                false,
            ));
        }

        let key = dedupe_key(&event);
        if IntegrationLogRepository::dedupe_key_exists(&state.db, &key).await? {
            tracing::info!(
                "Duplicate {} event for lead {:?}, skipping dispatch",
                event.event_type.as_str(),
                event.lead_id
            );
            return Ok(DispatchResponse::noop(
                "Duplicate event ignored".to_string(),
                true,
            ));
        }

        let email_cfg = SettingsRepository::email_settings(&state.db).await?;
        let wa_cfg = SettingsRepository::whatsapp_settings(&state.db).await?;

        let manager_emails = if event.event_type == LeadEventType::MeetingScheduled {
            ProfileRepository::manager_emails(&state.db).await?
        } else {
            Vec::new()
        };

        let set = recipients::resolve(&event, &recipient_cfg, &wa_cfg, &manager_emails);

        tracing::info!(
            "Dispatching {} for lead {:?}: {} email recipient(s), {} phone target(s)",
            event.event_type.as_str(),
            event.lead_id,
            set.emails.len(),
            set.phones.len()
        );

        let template = templates::render_internal(&event, &state.config.server.crm_url);
        let wa_message = templates::render_whatsapp(&event);

        // Internal team email
        let email_outcome = if !email_cfg.enabled || set.emails.is_empty() {
            None
        } else {
            Some(
                match state
                    .email
                    .send(
                        &email_cfg.from_name,
                        &email_cfg.from_address,
                        &set.emails,
                        &template.subject,
                        &template.html,
                    )
                    .await
                {
                    Ok(resp) => ChannelOutcome {
                        status: DeliveryStatus::Sent,
                        id: resp.id,
                        error: None,
                    },
                    Err(e) => ChannelOutcome {
                        status: DeliveryStatus::Failed,
                        id: None,
                        error: Some(e.to_string()),
                    },
                },
            )
        };

        // Customer channels (meetings only, opt-in)
        let mut customer_notified = None;
        let mut customer_email_outcome = None;
        let mut customer_wa_delivery = None;
        if let Some(contact) = &set.customer {
            let mut notified = CustomerNotified::default();

            if email_cfg.enabled {
                if let Some(address) = contact.email.as_deref().filter(|a| !a.trim().is_empty()) {
                    let customer_template = templates::render_customer_meeting(&event);
                    let outcome = match state
                        .email
                        .send(
                            &email_cfg.from_name,
                            &email_cfg.from_address,
                            &[address.to_string()],
                            &customer_template.subject,
                            &customer_template.html,
                        )
                        .await
                    {
                        Ok(resp) => ChannelOutcome {
                            status: DeliveryStatus::Sent,
                            id: resp.id,
                            error: None,
                        },
                        Err(e) => ChannelOutcome {
                            status: DeliveryStatus::Failed,
                            id: None,
                            error: Some(e.to_string()),
                        },
                    };
                    notified.email = outcome.status == DeliveryStatus::Sent;
                    customer_email_outcome = Some(outcome);
                }
            }

            if wa_cfg.enabled {
                if let Some(phone) = contact.phone.as_deref() {
                    let message = templates::render_customer_whatsapp(&event);
                    let delivery = state.whatsapp.send(&wa_cfg, phone, &message).await;
                    notified.whatsapp = delivery.status == DeliveryStatus::Sent;
                    customer_wa_delivery = Some(delivery);
                }
            }

            customer_notified = Some(notified);
        }

        // Team WhatsApp fan-out
        let wa_results = if wa_cfg.enabled {
            state.whatsapp.send_all(&wa_cfg, &set.phones, &wa_message).await
        } else {
            Vec::new()
        };
        let whatsapp_sent = wa_results
            .iter()
            .filter(|d| d.status == DeliveryStatus::Sent)
            .count();

        // Audit log: best effort, never fails the request
        let response_payload = json!({
            "email": &email_outcome,
            "whatsapp": &wa_results,
            "customer": {
                "email": &customer_email_outcome,
                "whatsapp": &customer_wa_delivery,
            },
        });
        let error_message = email_outcome.as_ref().and_then(|o| o.error.clone());
        let log = CreateIntegrationLog {
            integration_type: INTEGRATION_TYPE_LABEL.to_string(),
            lead_id: event.lead_id.clone(),
            request_payload: payload,
            response_payload: Some(response_payload.clone()),
            error_message,
            dedupe_key: Some(key),
        };
        if let Err(e) = IntegrationLogRepository::create(&state.db, log).await {
            tracing::warn!("Failed to write integration log: {:?}", e);
        }

        Ok(DispatchResponse {
            success: true,
            message: format!(
                "Notification processed for {} recipient(s)",
                set.emails.len()
            ),
            recipients: set.emails,
            whatsapp_sent,
            customer_notified,
            duplicate: false,
            debug: debug.then(|| DebugInfo {
                provider_responses: response_payload,
                whatsapp_message: wa_message,
                whatsapp_results: wa_results,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::events::{LeadEvent, LeadEventType};

    fn event() -> LeadEvent {
        LeadEvent {
            event_type: LeadEventType::MeetingScheduled,
            lead_id: Some("42".to_string()),
            lead_name: Some("John".to_string()),
            lead_email: Some("john@x.com".to_string()),
            lead_phone: None,
            lead_source: None,
            lead_interest: None,
            assigned_to: None,
            assigned_to_email: None,
            old_status: None,
            new_status: None,
            note: None,
            followup_title: None,
            followup_date: None,
            meeting_title: Some("Site Visit".to_string()),
            meeting_date: Some("Jan 1, 2025 10:00 AM".to_string()),
            notify_customer: true,
        }
    }

    #[test]
    fn dedupe_key_is_deterministic() {
        assert_eq!(dedupe_key(&event()), dedupe_key(&event()));
    }

    #[test]
    fn dedupe_key_differs_per_event() {
        let mut other = event();
        other.meeting_date = Some("Jan 2, 2025 10:00 AM".to_string());
        assert_ne!(dedupe_key(&event()), dedupe_key(&other));

        let mut retyped = event();
        retyped.event_type = LeadEventType::FollowupScheduled;
        assert_ne!(dedupe_key(&event()), dedupe_key(&retyped));
    }

    #[test]
    fn noop_response_omits_optional_fields() {
        let response = DispatchResponse::noop("Duplicate event ignored".to_string(), true);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["duplicate"], true);
        assert!(value.get("customer_notified").is_none());
        assert!(value.get("debug").is_none());
    }

    #[test]
    fn delivery_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(DeliveryStatus::SkippedNoApi).unwrap(),
            "skipped_no_api"
        );
        assert_eq!(
            serde_json::to_value(DeliveryStatus::InvalidNumber).unwrap(),
            "invalid_number"
        );
    }
}
