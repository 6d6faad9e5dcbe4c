use crate::services::events::{LeadEvent, LeadEventType};

#[derive(Debug, Clone, PartialEq)]
pub struct EmailTemplate {
    pub subject: String,
    pub html: String,
}

/// Shared header/footer style block used by every internal template.
const STYLE_BLOCK: &str = r#"<style>
  body { margin: 0; background: #f4f5f7; font-family: 'Segoe UI', Arial, sans-serif; color: #1f2933; }
  .wrap { max-width: 560px; margin: 24px auto; background: #ffffff; border-radius: 8px; overflow: hidden; }
  .header { background: #1d3557; color: #ffffff; padding: 20px 28px; }
  .header h2 { margin: 0; font-size: 20px; }
  .content { padding: 24px 28px; }
  .content table { width: 100%; border-collapse: collapse; }
  .content td { padding: 6px 0; vertical-align: top; }
  .content td.label { width: 130px; color: #6b7280; }
  .status { padding: 10px 14px; background: #f1f5f9; border-radius: 6px; font-size: 15px; }
  .footer { padding: 16px 28px; border-top: 1px solid #e5e7eb; font-size: 12px; color: #6b7280; }
  a.cta { color: #1d3557; font-weight: 600; }
</style>"#;

fn layout(title: &str, content: &str, footer: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">{STYLE_BLOCK}</head><body>\
         <div class=\"wrap\"><div class=\"header\"><h2>{title}</h2></div>\
         <div class=\"content\">{content}</div>\
         <div class=\"footer\">{footer}</div></div></body></html>"
    )
}

fn field_row(label: &str, value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => {
            format!("<tr><td class=\"label\">{label}</td><td>{v}</td></tr>")
        }
        _ => String::new(),
    }
}

fn lead_fields_table(event: &LeadEvent) -> String {
    let mut rows = String::from("<table>");
    rows.push_str(&field_row("Name", event.lead_name.as_deref()));
    rows.push_str(&field_row("Email", event.lead_email.as_deref()));
    rows.push_str(&field_row("Phone", event.lead_phone.as_deref()));
    rows.push_str(&field_row("Source", event.lead_source.as_deref()));
    rows.push_str(&field_row("Interest", event.lead_interest.as_deref()));
    rows.push_str("</table>");
    rows
}

fn lead_display(event: &LeadEvent) -> &str {
    event.lead_name.as_deref().unwrap_or("Unknown lead")
}

fn internal_footer(event: &LeadEvent, crm_url: &str) -> String {
    let link = match &event.lead_id {
        Some(id) => format!("{crm_url}/leads/{id}"),
        None => crm_url.to_string(),
    };
    format!("Horizon Estates CRM &middot; <a class=\"cta\" href=\"{link}\">Open in CRM</a>")
}

/// Internal team email for any event type.
pub fn render_internal(event: &LeadEvent, crm_url: &str) -> EmailTemplate {
    let name = lead_display(event);
    let footer = internal_footer(event, crm_url);

    match event.event_type {
        LeadEventType::LeadCreated => EmailTemplate {
            subject: format!("New Lead: {name}"),
            html: layout(
                "New lead captured",
                &format!(
                    "<p>A new lead just arrived.</p>{}",
                    lead_fields_table(event)
                ),
                &footer,
            ),
        },
        LeadEventType::LeadAssigned => {
            let assignee = event.assigned_to.as_deref().unwrap_or("the team");
            EmailTemplate {
                subject: format!("Lead Assigned: {name}"),
                html: layout(
                    "Lead assigned",
                    &format!(
                        "<p><strong>{name}</strong> has been assigned to <strong>{assignee}</strong>.</p>{}",
                        lead_fields_table(event)
                    ),
                    &footer,
                ),
            }
        }
        LeadEventType::StatusChanged => {
            let old = event.old_status.as_deref().unwrap_or("-");
            let new = event.new_status.as_deref().unwrap_or("-");
            EmailTemplate {
                subject: format!("Status Update: {name}"),
                html: layout(
                    "Lead status changed",
                    &format!(
                        "<p>Status update for <strong>{name}</strong>:</p>\
                         <div class=\"status\">{old} &rarr; {new}</div>{}",
                        lead_fields_table(event)
                    ),
                    &footer,
                ),
            }
        }
        LeadEventType::NoteAdded => {
            let note = event.note.as_deref().unwrap_or("");
            EmailTemplate {
                subject: format!("New Note on {name}"),
                html: layout(
                    "Note added",
                    &format!(
                        "<p>A note was added to <strong>{name}</strong>:</p>\
                         <div class=\"status\">{note}</div>"
                    ),
                    &footer,
                ),
            }
        }
        LeadEventType::FollowupScheduled => {
            let title = event.followup_title.as_deref().unwrap_or("Follow-up");
            let date = event.followup_date.as_deref().unwrap_or("-");
            EmailTemplate {
                subject: format!("Follow-up Scheduled: {name}"),
                html: layout(
                    "Follow-up scheduled",
                    &format!(
                        "<p>Follow-up for <strong>{name}</strong>:</p>\
                         <div class=\"status\"><strong>{title}</strong><br>{date}</div>"
                    ),
                    &footer,
                ),
            }
        }
        LeadEventType::FollowupCompleted => {
            let title = event.followup_title.as_deref().unwrap_or("Follow-up");
            EmailTemplate {
                subject: format!("Follow-up Completed: {name}"),
                html: layout(
                    "Follow-up completed",
                    &format!(
                        "<p><strong>{title}</strong> for <strong>{name}</strong> is done.</p>"
                    ),
                    &footer,
                ),
            }
        }
        LeadEventType::MeetingScheduled => {
            let title = event.meeting_title.as_deref().unwrap_or("Meeting");
            let date = event.meeting_date.as_deref().unwrap_or("-");
            EmailTemplate {
                subject: format!("Meeting Scheduled: {name}"),
                html: layout(
                    "Meeting scheduled",
                    &format!(
                        "<p>Meeting with <strong>{name}</strong>:</p>\
                         <div class=\"status\"><strong>{title}</strong><br>{date}</div>{}",
                        lead_fields_table(event)
                    ),
                    &footer,
                ),
            }
        }
    }
}

/// Customer-facing meeting confirmation. Different copy, no CRM link.
pub fn render_customer_meeting(event: &LeadEvent) -> EmailTemplate {
    let name = lead_display(event);
    let title = event.meeting_title.as_deref().unwrap_or("your visit");
    let date = event.meeting_date.as_deref().unwrap_or("the scheduled time");

    EmailTemplate {
        subject: "Your meeting with Horizon Estates is confirmed".to_string(),
        html: layout(
            "Meeting confirmed",
            &format!(
                "<p>Dear {name},</p>\
                 <p>Thank you for your interest in Horizon Estates. Your meeting is confirmed:</p>\
                 <div class=\"status\"><strong>{title}</strong><br>{date}</div>\
                 <p>Our team looks forward to welcoming you. If you need to reschedule, simply \
                 reply to this email or call your relationship manager.</p>"
            ),
            "Horizon Estates &middot; Building homes, building trust",
        ),
    }
}

/// Condensed plain-text-with-emoji message for WhatsApp. Generated
/// independently per event type, not derived from the HTML.
pub fn render_whatsapp(event: &LeadEvent) -> String {
    let name = lead_display(event);

    match event.event_type {
        LeadEventType::LeadCreated => {
            let mut lines = vec![format!("🏠 New lead: {name}")];
            if let Some(email) = event.lead_email.as_deref() {
                lines.push(format!("📧 {email}"));
            }
            if let Some(phone) = event.lead_phone.as_deref() {
                lines.push(format!("📱 {phone}"));
            }
            if let Some(source) = event.lead_source.as_deref() {
                lines.push(format!("🔗 Source: {source}"));
            }
            if let Some(interest) = event.lead_interest.as_deref() {
                lines.push(format!("🏢 Interest: {interest}"));
            }
            lines.join("\n")
        }
        LeadEventType::LeadAssigned => {
            let assignee = event.assigned_to.as_deref().unwrap_or("the team");
            format!("👤 Lead {name} assigned to {assignee}")
        }
        LeadEventType::StatusChanged => {
            let old = event.old_status.as_deref().unwrap_or("-");
            let new = event.new_status.as_deref().unwrap_or("-");
            format!("🔄 {name}: {old} ➜ {new}")
        }
        LeadEventType::NoteAdded => {
            let note = event.note.as_deref().unwrap_or("");
            format!("📝 Note on {name}: {note}")
        }
        LeadEventType::FollowupScheduled => {
            let title = event.followup_title.as_deref().unwrap_or("Follow-up");
            let date = event.followup_date.as_deref().unwrap_or("-");
            format!("⏰ Follow-up for {name}: {title} on {date}")
        }
        LeadEventType::FollowupCompleted => {
            let title = event.followup_title.as_deref().unwrap_or("Follow-up");
            format!("✅ Follow-up done for {name}: {title}")
        }
        LeadEventType::MeetingScheduled => {
            let title = event.meeting_title.as_deref().unwrap_or("Meeting");
            let date = event.meeting_date.as_deref().unwrap_or("-");
            format!("📅 Meeting with {name}: {title} on {date}")
        }
    }
}

/// Customer-facing WhatsApp confirmation for meetings.
pub fn render_customer_whatsapp(event: &LeadEvent) -> String {
    let name = lead_display(event);
    let title = event.meeting_title.as_deref().unwrap_or("your visit");
    let date = event.meeting_date.as_deref().unwrap_or("the scheduled time");
    format!(
        "📅 Dear {name}, your meeting \"{title}\" with Horizon Estates is confirmed for {date}. \
         We look forward to seeing you!"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CRM_URL: &str = "https://crm.horizonestates.in";

    fn meeting_event() -> LeadEvent {
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
    fn internal_template_links_into_the_crm() {
        let tpl = render_internal(&meeting_event(), CRM_URL);
        assert!(tpl.subject.contains("John"));
        assert!(tpl.html.contains("https://crm.horizonestates.in/leads/42"));
        assert!(tpl.html.contains("Site Visit"));
    }

    #[test]
    fn customer_template_has_no_crm_link() {
        let tpl = render_customer_meeting(&meeting_event());
        assert!(!tpl.html.contains(CRM_URL));
        assert!(tpl.html.contains("Site Visit"));
        assert!(tpl.html.contains("Dear John"));
    }

    #[test]
    fn status_template_shows_before_and_after() {
        let mut event = meeting_event();
        event.event_type = LeadEventType::StatusChanged;
        event.old_status = Some("new".to_string());
        event.new_status = Some("visit planned".to_string());

        let tpl = render_internal(&event, CRM_URL);
        assert!(tpl.html.contains("new &rarr; visit planned"));
    }

    #[test]
    fn whatsapp_message_is_condensed_per_type() {
        let mut event = meeting_event();
        event.event_type = LeadEventType::LeadCreated;

        let msg = render_whatsapp(&event);
        assert!(msg.starts_with("🏠 New lead: John"));
        assert!(msg.contains("📧 john@x.com"));
        assert!(!msg.contains("<"));
    }

    #[test]
    fn missing_optional_fields_render_without_rows() {
        let mut event = meeting_event();
        event.event_type = LeadEventType::LeadCreated;
        event.lead_email = None;

        let tpl = render_internal(&event, CRM_URL);
        assert!(!tpl.html.contains("<td class=\"label\">Email</td>"));

        let msg = render_whatsapp(&event);
        assert!(!msg.contains("📧"));
    }
}
