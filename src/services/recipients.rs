use crate::db::models::{RecipientSettings, WhatsAppSettings};
use crate::services::events::{LeadEvent, LeadEventType};

/// Admin addresses that always receive internal notifications, on top of
/// whatever the settings row configures.
pub const FALLBACK_ADMIN_EMAILS: &[&str] =
    &["admin@horizonestates.in", "sales@horizonestates.in"];

/// Departed-staff addresses that must never receive mail, no matter which
/// configured or hardcoded list still carries them.
pub const RETIRED_ADMIN_EMAILS: &[&str] = &[
    "vikram.mehta@horizonestates.in",
    "leads-archive@horizonestates.in",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerContact {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// The structured recipient set one resolution pass produces. Both delivery
/// executors consume this; the email and phone lists cannot drift apart.
#[derive(Debug, Clone, Default)]
pub struct RecipientSet {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub customer: Option<CustomerContact>,
}

/// Per-event enablement. Meetings always dispatch; the toggle cannot opt
/// them out.
pub fn notifications_enabled(event_type: LeadEventType, cfg: &RecipientSettings) -> bool {
    match event_type {
        LeadEventType::MeetingScheduled => true,
        LeadEventType::LeadCreated => cfg.notify_lead_created,
        LeadEventType::LeadAssigned => cfg.notify_lead_assigned,
        LeadEventType::StatusChanged => cfg.notify_status_changed,
        LeadEventType::NoteAdded => cfg.notify_note_added,
        LeadEventType::FollowupScheduled => cfg.notify_followup_scheduled,
        LeadEventType::FollowupCompleted => cfg.notify_followup_completed,
    }
}

/// Compose the recipient set for one event.
///
/// Every event notifies the fallback admins, the configured admins and the
/// assignee. Meetings additionally notify managers (configured list plus the
/// live `manager`-role profiles) and carry the lead's own contact as a
/// separate customer channel.
pub fn resolve(
    event: &LeadEvent,
    cfg: &RecipientSettings,
    wa: &WhatsAppSettings,
    live_manager_emails: &[String],
) -> RecipientSet {
    let is_meeting = event.event_type == LeadEventType::MeetingScheduled;

    let mut emails: Vec<String> = FALLBACK_ADMIN_EMAILS
        .iter()
        .map(|s| s.to_string())
        .collect();
    emails.extend(cfg.admin_emails.iter().cloned());
    if let Some(assignee) = &event.assigned_to_email {
        emails.push(assignee.clone());
    }
    if is_meeting {
        emails.extend(cfg.manager_emails.iter().cloned());
        emails.extend(live_manager_emails.iter().cloned());
    }

    let mut phones: Vec<String> = wa.admin_phones.clone();
    if is_meeting {
        phones.extend(wa.team_phones.iter().cloned());
    }

    let customer = (is_meeting && event.notify_customer).then(|| CustomerContact {
        email: event.lead_email.clone(),
        phone: event.lead_phone.clone(),
    });

    RecipientSet {
        emails: sanitize_emails(emails),
        phones: dedup_nonblank(phones),
        customer,
    }
}

/// Trim, drop blanks and retired addresses, dedup case-insensitively while
/// keeping first-seen casing and order.
fn sanitize_emails(list: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for raw in list {
        let addr = raw.trim();
        if addr.is_empty() {
            continue;
        }
        let lower = addr.to_lowercase();
        if RETIRED_ADMIN_EMAILS.contains(&lower.as_str()) {
            continue;
        }
        if seen.insert(lower) {
            out.push(addr.to_string());
        }
    }
    out
}

fn dedup_nonblank(list: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for raw in list {
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }
        if seen.insert(value.to_string()) {
            out.push(value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_type: LeadEventType) -> LeadEvent {
        LeadEvent {
            event_type,
            lead_id: Some("42".to_string()),
            lead_name: Some("Jane Doe".to_string()),
            lead_email: Some("jane@x.com".to_string()),
            lead_phone: Some("+91 98765 43210".to_string()),
            lead_source: Some("facebook".to_string()),
            lead_interest: None,
            assigned_to: Some("Priya".to_string()),
            assigned_to_email: Some("priya@horizonestates.in".to_string()),
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
    fn note_added_is_disabled_by_default() {
        let cfg = RecipientSettings::default();
        assert!(!notifications_enabled(LeadEventType::NoteAdded, &cfg));
        assert!(notifications_enabled(LeadEventType::LeadCreated, &cfg));
    }

    #[test]
    fn meetings_bypass_the_toggle() {
        let cfg = RecipientSettings {
            notify_meeting_scheduled: false,
            ..Default::default()
        };
        assert!(notifications_enabled(LeadEventType::MeetingScheduled, &cfg));
    }

    #[test]
    fn retired_addresses_never_appear() {
        let cfg = RecipientSettings {
            admin_emails: vec![
                "vikram.mehta@horizonestates.in".to_string(),
                "ops@horizonestates.in".to_string(),
            ],
            manager_emails: vec!["leads-archive@horizonestates.in".to_string()],
            ..Default::default()
        };
        let set = resolve(
            &event(LeadEventType::MeetingScheduled),
            &cfg,
            &WhatsAppSettings::default(),
            &["Vikram.Mehta@horizonestates.in".to_string()],
        );

        for retired in RETIRED_ADMIN_EMAILS {
            assert!(
                !set.emails.iter().any(|e| e.eq_ignore_ascii_case(retired)),
                "{} leaked into {:?}",
                retired,
                set.emails
            );
        }
        assert!(set.emails.iter().any(|e| e == "ops@horizonestates.in"));
    }

    #[test]
    fn duplicate_of_fallback_admin_yields_one_entry() {
        let cfg = RecipientSettings {
            admin_emails: vec!["admin@horizonestates.in".to_string()],
            ..Default::default()
        };
        let set = resolve(
            &event(LeadEventType::LeadCreated),
            &cfg,
            &WhatsAppSettings::default(),
            &[],
        );

        let count = set
            .emails
            .iter()
            .filter(|e| e.as_str() == "admin@horizonestates.in")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn blank_entries_are_dropped() {
        let cfg = RecipientSettings {
            admin_emails: vec!["".to_string(), "   ".to_string()],
            ..Default::default()
        };
        let set = resolve(
            &event(LeadEventType::LeadCreated),
            &cfg,
            &WhatsAppSettings::default(),
            &[],
        );
        assert!(set.emails.iter().all(|e| !e.trim().is_empty()));
    }

    #[test]
    fn managers_only_for_meetings() {
        let cfg = RecipientSettings {
            manager_emails: vec!["manager@horizonestates.in".to_string()],
            ..Default::default()
        };
        let live = vec!["branch.head@horizonestates.in".to_string()];

        let status = resolve(&event(LeadEventType::StatusChanged), &cfg, &WhatsAppSettings::default(), &live);
        assert!(!status.emails.iter().any(|e| e == "manager@horizonestates.in"));
        assert!(!status.emails.iter().any(|e| e == "branch.head@horizonestates.in"));

        let meeting = resolve(&event(LeadEventType::MeetingScheduled), &cfg, &WhatsAppSettings::default(), &live);
        assert!(meeting.emails.iter().any(|e| e == "manager@horizonestates.in"));
        assert!(meeting.emails.iter().any(|e| e == "branch.head@horizonestates.in"));
    }

    #[test]
    fn team_phones_only_for_meetings() {
        let wa = WhatsAppSettings {
            admin_phones: vec!["+919800000001".to_string()],
            team_phones: vec!["+919800000002".to_string()],
            ..Default::default()
        };
        let cfg = RecipientSettings::default();

        let created = resolve(&event(LeadEventType::LeadCreated), &cfg, &wa, &[]);
        assert_eq!(created.phones, vec!["+919800000001"]);

        let meeting = resolve(&event(LeadEventType::MeetingScheduled), &cfg, &wa, &[]);
        assert_eq!(meeting.phones, vec!["+919800000001", "+919800000002"]);
    }

    #[test]
    fn customer_contact_requires_meeting_and_opt_in() {
        let cfg = RecipientSettings::default();
        let wa = WhatsAppSettings::default();

        let mut meeting = event(LeadEventType::MeetingScheduled);
        assert!(resolve(&meeting, &cfg, &wa, &[]).customer.is_some());

        meeting.notify_customer = false;
        assert!(resolve(&meeting, &cfg, &wa, &[]).customer.is_none());

        let created = event(LeadEventType::LeadCreated);
        assert!(resolve(&created, &cfg, &wa, &[]).customer.is_none());
    }

    #[test]
    fn assignee_is_included() {
        let set = resolve(
            &event(LeadEventType::LeadAssigned),
            &RecipientSettings::default(),
            &WhatsAppSettings::default(),
            &[],
        );
        assert!(set.emails.iter().any(|e| e == "priya@horizonestates.in"));
    }
}
