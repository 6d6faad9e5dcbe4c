use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Lead-lifecycle changes that can trigger a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadEventType {
    LeadCreated,
    LeadAssigned,
    StatusChanged,
    NoteAdded,
    FollowupScheduled,
    FollowupCompleted,
    MeetingScheduled,
}

impl LeadEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadEventType::LeadCreated => "lead_created",
            LeadEventType::LeadAssigned => "lead_assigned",
            LeadEventType::StatusChanged => "status_changed",
            LeadEventType::NoteAdded => "note_added",
            LeadEventType::FollowupScheduled => "followup_scheduled",
            LeadEventType::FollowupCompleted => "followup_completed",
            LeadEventType::MeetingScheduled => "meeting_scheduled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lead_created" => Some(LeadEventType::LeadCreated),
            "lead_assigned" => Some(LeadEventType::LeadAssigned),
            "status_changed" => Some(LeadEventType::StatusChanged),
            "note_added" => Some(LeadEventType::NoteAdded),
            "followup_scheduled" => Some(LeadEventType::FollowupScheduled),
            "followup_completed" => Some(LeadEventType::FollowupCompleted),
            "meeting_scheduled" => Some(LeadEventType::MeetingScheduled),
            _ => None,
        }
    }
}

/// Wire shape of an inbound event. The dashboard sends snake_case field
/// names, the edge triggers send camelCase; both arrive here and are merged
/// by [`normalize`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLeadEvent {
    #[serde(rename = "type")]
    pub event_type: Option<String>,

    pub lead_id: Option<String>,
    pub lead_name: Option<String>,
    pub lead_email: Option<String>,
    pub lead_phone: Option<String>,
    pub lead_source: Option<String>,
    pub lead_interest: Option<String>,
    pub assigned_to: Option<String>,
    pub assigned_to_email: Option<String>,
    pub old_status: Option<String>,
    pub new_status: Option<String>,
    pub note: Option<String>,
    pub followup_title: Option<String>,
    pub followup_date: Option<String>,
    pub meeting_title: Option<String>,
    pub meeting_date: Option<String>,
    pub notify_customer: Option<bool>,

    #[serde(rename = "leadId")]
    pub lead_id_camel: Option<String>,
    #[serde(rename = "leadName")]
    pub lead_name_camel: Option<String>,
    #[serde(rename = "leadEmail")]
    pub lead_email_camel: Option<String>,
    #[serde(rename = "leadPhone")]
    pub lead_phone_camel: Option<String>,
    #[serde(rename = "leadSource")]
    pub lead_source_camel: Option<String>,
    #[serde(rename = "leadInterest")]
    pub lead_interest_camel: Option<String>,
    #[serde(rename = "assignedTo")]
    pub assigned_to_camel: Option<String>,
    #[serde(rename = "assignedToEmail")]
    pub assigned_to_email_camel: Option<String>,
    #[serde(rename = "oldStatus")]
    pub old_status_camel: Option<String>,
    #[serde(rename = "newStatus")]
    pub new_status_camel: Option<String>,
    #[serde(rename = "followupTitle")]
    pub followup_title_camel: Option<String>,
    #[serde(rename = "followupDate")]
    pub followup_date_camel: Option<String>,
    #[serde(rename = "meetingTitle")]
    pub meeting_title_camel: Option<String>,
    #[serde(rename = "meetingDate")]
    pub meeting_date_camel: Option<String>,
    #[serde(rename = "notifyCustomer")]
    pub notify_customer_camel: Option<bool>,
}

/// Canonical, snake_case-only event record consumed by the resolver and the
/// renderers. Missing fields stay `None` and are handled permissively
/// downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadEvent {
    #[serde(rename = "type")]
    pub event_type: LeadEventType,
    pub lead_id: Option<String>,
    pub lead_name: Option<String>,
    pub lead_email: Option<String>,
    pub lead_phone: Option<String>,
    pub lead_source: Option<String>,
    pub lead_interest: Option<String>,
    pub assigned_to: Option<String>,
    pub assigned_to_email: Option<String>,
    pub old_status: Option<String>,
    pub new_status: Option<String>,
    pub note: Option<String>,
    pub followup_title: Option<String>,
    pub followup_date: Option<String>,
    pub meeting_title: Option<String>,
    pub meeting_date: Option<String>,
    pub notify_customer: bool,
}

fn pick<T>(snake: Option<T>, camel: Option<T>) -> Option<T> {
    // snake_case wins when both variants are present
    snake.or(camel)
}

/// Merge the two caller naming conventions into the canonical record.
pub fn normalize(raw: RawLeadEvent) -> AppResult<LeadEvent> {
    let type_str = raw
        .event_type
        .ok_or_else(|| AppError::BadRequest("Missing event type".to_string()))?;
    let event_type = LeadEventType::parse(&type_str)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown event type: {}", type_str)))?;

    Ok(LeadEvent {
        event_type,
        lead_id: pick(raw.lead_id, raw.lead_id_camel),
        lead_name: pick(raw.lead_name, raw.lead_name_camel),
        lead_email: pick(raw.lead_email, raw.lead_email_camel),
        lead_phone: pick(raw.lead_phone, raw.lead_phone_camel),
        lead_source: pick(raw.lead_source, raw.lead_source_camel),
        lead_interest: pick(raw.lead_interest, raw.lead_interest_camel),
        assigned_to: pick(raw.assigned_to, raw.assigned_to_camel),
        assigned_to_email: pick(raw.assigned_to_email, raw.assigned_to_email_camel),
        old_status: pick(raw.old_status, raw.old_status_camel),
        new_status: pick(raw.new_status, raw.new_status_camel),
        note: raw.note,
        followup_title: pick(raw.followup_title, raw.followup_title_camel),
        followup_date: pick(raw.followup_date, raw.followup_date_camel),
        meeting_title: pick(raw.meeting_title, raw.meeting_title_camel),
        meeting_date: pick(raw.meeting_date, raw.meeting_date_camel),
        notify_customer: pick(raw.notify_customer, raw.notify_customer_camel).unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> LeadEvent {
        let raw: RawLeadEvent = serde_json::from_value(value).unwrap();
        normalize(raw).unwrap()
    }

    #[test]
    fn camel_case_meeting_fields_populate_snake_case() {
        let event = parse(json!({
            "type": "meeting_scheduled",
            "leadId": "42",
            "leadName": "John",
            "leadEmail": "john@x.com",
            "meetingTitle": "Site Visit",
            "meetingDate": "Jan 1, 2025 10:00 AM",
            "notifyCustomer": true
        }));

        assert_eq!(event.lead_id.as_deref(), Some("42"));
        assert_eq!(event.lead_name.as_deref(), Some("John"));
        assert_eq!(event.lead_email.as_deref(), Some("john@x.com"));
        assert_eq!(event.meeting_title.as_deref(), Some("Site Visit"));
        assert!(event.notify_customer);
    }

    #[test]
    fn snake_case_wins_when_both_present() {
        let event = parse(json!({
            "type": "lead_created",
            "lead_name": "Jane Doe",
            "leadName": "Someone Else",
            "leadSource": "facebook"
        }));

        assert_eq!(event.lead_name.as_deref(), Some("Jane Doe"));
        assert_eq!(event.lead_source.as_deref(), Some("facebook"));
    }

    #[test]
    fn missing_fields_stay_none() {
        let event = parse(json!({"type": "note_added"}));
        assert_eq!(event.lead_name, None);
        assert_eq!(event.note, None);
        assert!(!event.notify_customer);
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let raw: RawLeadEvent =
            serde_json::from_value(json!({"type": "lead_exploded"})).unwrap();
        assert!(normalize(raw).is_err());
    }

    #[test]
    fn missing_event_type_is_rejected() {
        let raw: RawLeadEvent = serde_json::from_value(json!({"lead_name": "Jane"})).unwrap();
        assert!(normalize(raw).is_err());
    }
}
