use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

pub const SETTING_EMAIL: &str = "email_notifications";
pub const SETTING_RECIPIENTS: &str = "notification_recipients";
pub const SETTING_WHATSAPP: &str = "whatsapp_notifications";

/// The setting keys the admin UI is allowed to write.
pub const KNOWN_SETTING_KEYS: &[&str] = &[SETTING_EMAIL, SETTING_RECIPIENTS, SETTING_WHATSAPP];

/// One row of `notification_settings`: a loosely-typed JSON blob keyed by
/// setting name. Created/edited by admins through the settings UI, read on
/// every dispatch.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct NotificationSetting {
    pub id: Uuid,
    pub setting_key: String,
    pub setting_value: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Typed view of the `email_notifications` blob. Missing row, missing fields
/// or a malformed blob all fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub enabled: bool,
    pub from_name: String,
    pub from_address: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            from_name: "Horizon Estates CRM".to_string(),
            from_address: "notifications@horizonestates.in".to_string(),
        }
    }
}

/// Typed view of the `notification_recipients` blob: recipient lists plus the
/// per-event toggles. Every toggle defaults to enabled except `note_added`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipientSettings {
    pub admin_emails: Vec<String>,
    pub manager_emails: Vec<String>,
    pub notify_lead_created: bool,
    pub notify_lead_assigned: bool,
    pub notify_status_changed: bool,
    pub notify_note_added: bool,
    pub notify_followup_scheduled: bool,
    pub notify_followup_completed: bool,
    pub notify_meeting_scheduled: bool,
}

impl Default for RecipientSettings {
    fn default() -> Self {
        Self {
            admin_emails: Vec::new(),
            manager_emails: Vec::new(),
            notify_lead_created: true,
            notify_lead_assigned: true,
            notify_status_changed: true,
            notify_note_added: false,
            notify_followup_scheduled: true,
            notify_followup_completed: true,
            notify_meeting_scheduled: true,
        }
    }
}

/// Typed view of the `whatsapp_notifications` blob. When `api_url`/`api_key`
/// are absent the WhatsApp executor records `skipped_no_api` instead of
/// sending.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppSettings {
    pub enabled: bool,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub admin_phones: Vec<String>,
    pub team_phones: Vec<String>,
}

impl Default for WhatsAppSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: None,
            api_key: None,
            admin_phones: Vec::new(),
            team_phones: Vec::new(),
        }
    }
}

fn parse_or_default<T: serde::de::DeserializeOwned + Default>(value: Option<Value>) -> T {
    match value {
        Some(v) => serde_json::from_value(v).unwrap_or_else(|e| {
            tracing::warn!("Malformed setting blob, using defaults: {}", e);
            T::default()
        }),
        None => T::default(),
    }
}

impl EmailSettings {
    pub fn from_value(value: Option<Value>) -> Self {
        parse_or_default(value)
    }
}

impl RecipientSettings {
    pub fn from_value(value: Option<Value>) -> Self {
        parse_or_default(value)
    }
}

impl WhatsAppSettings {
    pub fn from_value(value: Option<Value>) -> Self {
        parse_or_default(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_row_yields_defaults() {
        let email = EmailSettings::from_value(None);
        assert!(email.enabled);
        assert_eq!(email.from_name, "Horizon Estates CRM");

        let recipients = RecipientSettings::from_value(None);
        assert!(recipients.notify_lead_created);
        assert!(!recipients.notify_note_added);
    }

    #[test]
    fn partial_blob_keeps_defaults_for_missing_fields() {
        let recipients = RecipientSettings::from_value(Some(json!({
            "admin_emails": ["ops@horizonestates.in"],
            "notify_status_changed": false
        })));
        assert_eq!(recipients.admin_emails, vec!["ops@horizonestates.in"]);
        assert!(!recipients.notify_status_changed);
        assert!(recipients.notify_lead_created);
        assert!(!recipients.notify_note_added);
    }

    #[test]
    fn malformed_blob_falls_back_to_defaults() {
        let wa = WhatsAppSettings::from_value(Some(json!("not an object")));
        assert!(wa.enabled);
        assert!(wa.api_url.is_none());
    }
}
