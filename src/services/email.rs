use serde::{Deserialize, Serialize};

use crate::config::EmailConfig;
use crate::error::{AppError, AppResult};

/// Transactional email executor backed by the Resend HTTP API.
#[derive(Clone)]
pub struct EmailService {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: String,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailSendResponse {
    pub id: Option<String>,
}

impl EmailService {
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Email(format!("Failed to create HTTP client: {}", e)))?;

        if config.api_key.is_none() {
            tracing::warn!("RESEND_API_KEY is not set; email sends will be recorded as failed");
        }

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Send one message to the full recipient list.
    pub async fn send(
        &self,
        from_name: &str,
        from_address: &str,
        to: &[String],
        subject: &str,
        html: &str,
    ) -> AppResult<EmailSendResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Email("RESEND_API_KEY is not configured".to_string()))?;

        let request = SendEmailRequest {
            from: format!("{} <{}>", from_name, from_address),
            to,
            subject,
            html,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Email(format!("Failed to send email: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Email(format!(
                "Resend API error ({}): {}",
                status, error_text
            )));
        }

        // Resend replies with {"id": "..."}; tolerate other shapes.
        let parsed = response
            .json::<EmailSendResponse>()
            .await
            .unwrap_or_default();

        tracing::debug!(
            "Email sent to {} recipient(s): id={:?}",
            to.len(),
            parsed.id
        );

        Ok(parsed)
    }
}
